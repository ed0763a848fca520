use rocket::http::Status;
use thiserror::Error;

use crate::store::StoreError;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email already exists")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error("incorrect password")]
    IncorrectPassword,
    #[error("token invalid")]
    InvalidToken,
    #[error("unauthorized")]
    Unauthenticated,
    #[error("forbidden")]
    Forbidden,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("token signing error: {0}")]
    Signing(String),
    #[error("argon2 parameter error: {0}")]
    Argon2(String),
    #[error("password hashing error: {0}")]
    PasswordHash(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status(&self) -> Status {
        match self {
            AuthError::DuplicateEmail => Status::BadRequest,
            AuthError::NotFound => Status::NotFound,
            AuthError::IncorrectPassword
            | AuthError::InvalidToken
            | AuthError::Unauthenticated => Status::Unauthorized,
            AuthError::Forbidden => Status::Forbidden,
            AuthError::Store(StoreError::NotFound) => Status::NotFound,
            AuthError::Config(_)
            | AuthError::Signing(_)
            | AuthError::Argon2(_)
            | AuthError::PasswordHash(_)
            | AuthError::Store(_) => Status::InternalServerError,
        }
    }

    /// Name of the failure kind as reported in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::DuplicateEmail => "DuplicateEmail",
            AuthError::NotFound | AuthError::Store(StoreError::NotFound) => "NotFound",
            AuthError::IncorrectPassword => "IncorrectPassword",
            AuthError::InvalidToken | AuthError::Unauthenticated => "Unauthenticated",
            AuthError::Forbidden => "Forbidden",
            _ => "Unrecoverable",
        }
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        AuthError::Argon2(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}
