//! `/auth` endpoints. Both are public in the route table.

use rocket::response::status;
use rocket::serde::json::{self, Json};
use rocket::{State, post};

use crate::auth::gate::RequestContext;
use crate::auth::responses::{CredentialsRequest, LoginResponse};
use crate::auth::validation::credential_violations;
use crate::auth::{AuthService, AuthState};
use crate::error::ApiError;
use crate::models::UserSummary;
use crate::store::SharedUserStore;

type Credentials<'r> = Result<Json<CredentialsRequest>, json::Error<'r>>;

#[post("/auth/signup", data = "<payload>")]
pub async fn signup(
    _context: RequestContext,
    state: &State<AuthState>,
    users: &State<SharedUserStore>,
    payload: Credentials<'_>,
) -> Result<status::Created<Json<UserSummary>>, ApiError> {
    let credentials = validated(payload)?;

    let service = AuthService::new(state, users.inner().clone());
    let user = service
        .sign_up(&credentials.email, &credentials.password)
        .await?;

    let location = format!("/users/{}", user.id);
    Ok(status::Created::new(location).body(Json(UserSummary::from(user))))
}

#[post("/auth/login", data = "<payload>")]
pub async fn login(
    _context: RequestContext,
    state: &State<AuthState>,
    users: &State<SharedUserStore>,
    payload: Credentials<'_>,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = validated(payload)?;

    let service = AuthService::new(state, users.inner().clone());
    let token = service
        .log_in(&credentials.email, &credentials.password)
        .await?;

    Ok(Json(LoginResponse {
        token: token.token,
        expires_at: token.expires_at,
    }))
}

fn validated(payload: Credentials<'_>) -> Result<CredentialsRequest, ApiError> {
    let credentials = payload
        .map_err(|err| {
            log::debug!("unreadable credentials body: {}", err);
            ApiError::validation("request body must be a JSON object with email and password")
        })?
        .into_inner();

    let violations = credential_violations(&credentials.email, &credentials.password);
    if violations.is_empty() {
        Ok(credentials)
    } else {
        Err(ApiError::Validation(violations))
    }
}
