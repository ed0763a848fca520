//! HTTP boundary for failures: every error kind is mapped to a status code and
//! a JSON body here, and nowhere else.

use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::{Request, Response};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::auth::gate::GateRejection;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<String>),
    Auth(AuthError),
    Store(StoreError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(vec![message.into()])
    }

    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::Auth(err) => err.status(),
            ApiError::Store(StoreError::NotFound) => Status::NotFound,
            ApiError::Store(_) => Status::InternalServerError,
        }
    }

    fn into_body(self) -> ErrorResponse {
        let status = self.status();
        match self {
            ApiError::Validation(details) => ErrorResponse {
                status: status.code,
                error: "ValidationError".into(),
                message: details.join("; "),
                details,
            },
            ApiError::Auth(err) if status.code < 500 => ErrorResponse {
                status: status.code,
                error: err.kind().into(),
                message: err.to_string(),
                details: Vec::new(),
            },
            ApiError::Store(StoreError::NotFound) => ErrorResponse {
                status: status.code,
                error: "NotFound".into(),
                message: "user not found".into(),
                details: Vec::new(),
            },
            other => {
                log::error!("request failed: {:?}", other);
                ErrorResponse::unrecoverable()
            }
        }
    }
}

impl ErrorResponse {
    fn unrecoverable() -> Self {
        ErrorResponse {
            status: 500,
            error: "Unrecoverable".into(),
            message: "internal server error".into(),
            details: Vec::new(),
        }
    }

    fn for_status(status: Status) -> Self {
        let (error, message) = match status.code {
            400 | 422 => ("ValidationError", "malformed request"),
            401 => ("Unauthenticated", "unauthorized"),
            403 => ("Forbidden", "forbidden"),
            404 => ("NotFound", "resource not found"),
            _ if status.code >= 500 => return ErrorResponse::unrecoverable(),
            _ => ("Error", status.reason().unwrap_or("request failed")),
        };
        ErrorResponse {
            status: status.code,
            error: error.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    fn into_response(self, status: Status) -> response::Result<'static> {
        let json = serde_json::to_string(&self).unwrap_or_else(|_| {
            r#"{"status":500,"error":"Unrecoverable","message":"internal server error"}"#
                .to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code < 500 {
            log::debug!("request rejected with {}: {:?}", status.code, self);
        }
        self.into_body().into_response(status)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Store(store) => ApiError::Store(store),
            other => ApiError::Auth(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

/// JSON body for errors raised outside handlers (guards, routing, body parsing).
pub struct CaughtError(Status, ErrorResponse);

impl<'r> Responder<'r, 'static> for CaughtError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        self.1.into_response(self.0)
    }
}

#[catch(default)]
pub fn default_catcher(status: Status, request: &Request<'_>) -> CaughtError {
    let body = match &request.local_cache(GateRejection::default).0 {
        Some((kind, message)) if status.code < 500 => ErrorResponse {
            status: status.code,
            error: (*kind).into(),
            message: message.clone(),
            details: Vec::new(),
        },
        _ => ErrorResponse::for_status(status),
    };
    CaughtError(status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_kind_to_its_status() {
        let cases: Vec<(ApiError, u16)> = vec![
            (ApiError::validation("email must be an email"), 400),
            (ApiError::from(AuthError::DuplicateEmail), 400),
            (ApiError::from(AuthError::Unauthenticated), 401),
            (ApiError::from(AuthError::IncorrectPassword), 401),
            (ApiError::from(AuthError::Forbidden), 403),
            (ApiError::from(AuthError::NotFound), 404),
            (ApiError::from(StoreError::NotFound), 404),
            (ApiError::from(AuthError::Signing("boom".into())), 500),
            (
                ApiError::from(AuthError::Store(StoreError::UniqueViolation("x".into()))),
                500,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status().code, expected, "{err:?}");
        }
    }

    #[test]
    fn unrecoverable_errors_hide_internal_text() {
        let body = ApiError::from(AuthError::PasswordHash("salt invalid".into())).into_body();
        assert_eq!(body.status, 500);
        assert_eq!(body.error, "Unrecoverable");
        assert!(!body.message.contains("salt"));
    }

    #[test]
    fn validation_body_lists_every_violation() {
        let body = ApiError::Validation(vec![
            "email must be an email".into(),
            "password is not strong enough".into(),
        ])
        .into_body();
        assert_eq!(body.error, "ValidationError");
        assert_eq!(body.details.len(), 2);
    }
}
