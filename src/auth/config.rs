use crate::auth::{AuthError, AuthResult};

/// Lifetime of every issued token. Fixed at one day, not configurable.
pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Authentication configuration loaded from environment variables.
///
/// The secret is read once at startup and never rotated while the process runs.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub issuer: String,
    pub audience: String,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let secret_key = std::env::var("MEDICINE_SECRET_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| AuthError::Config("MEDICINE_SECRET_KEY is required".into()))?;
        let issuer =
            std::env::var("MEDICINE_JWT_ISSUER").unwrap_or_else(|_| "medicine-api".into());
        let audience =
            std::env::var("MEDICINE_JWT_AUDIENCE").unwrap_or_else(|_| "medicine-api".into());

        Ok(Self {
            secret_key,
            issuer,
            audience,
        })
    }

    /// Config with the default issuer and audience, for a given secret.
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            issuer: "medicine-api".into(),
            audience: "medicine-api".into(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}
