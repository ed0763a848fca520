use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::roles::RoleSet;
use crate::auth::config::TOKEN_TTL_SECS;
use crate::auth::{AuthConfig, AuthError, AuthResult};

/// Caller identity carried inside a token and resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: i32,
    pub email: String,
    pub roles: RoleSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub email: String,
    pub roles: RoleSet,
}

#[derive(Debug, Clone)]
pub struct SignedAccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 identity tokens signed with the process-wide secret.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl JwtService {
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        if config.secret_key.is_empty() {
            return Err(AuthError::Config("token secret must not be empty".into()));
        }
        let secret = config.secret_key.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);
        // Expiry is exact.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        })
    }

    pub fn issue(&self, identity: &Identity) -> AuthResult<SignedAccessToken> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the clock read `issued_at`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<SignedAccessToken> {
        let expires_at = issued_at + self.ttl;
        let claims = AccessTokenClaims {
            sub: identity.subject_id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            email: identity.email.clone(),
            roles: identity.roles.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Signing(err.to_string()))?;

        Ok(SignedAccessToken { token, expires_at })
    }

    /// Check signature, issuer, audience and expiry, then rebuild the embedded identity.
    ///
    /// Every failure collapses into [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> AuthResult<Identity> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|err| {
                log::debug!("token rejected: {}", err);
                AuthError::InvalidToken
            })?;
        let claims = data.claims;

        let subject_id = claims.sub.parse::<i32>().map_err(|_| {
            log::debug!("token rejected: non-numeric subject '{}'", claims.sub);
            AuthError::InvalidToken
        })?;

        Ok(Identity {
            subject_id,
            email: claims.email,
            roles: claims.roles,
        })
    }

    pub fn token_ttl(&self) -> Duration {
        self.ttl
    }
}
