use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of both `POST /auth/signup` and `POST /auth/login`.
///
/// Missing fields deserialize as empty strings so they surface as rule
/// violations rather than as a parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}
