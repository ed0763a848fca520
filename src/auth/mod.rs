//! Authentication and authorization: credential hashing, token issuance and
//! verification, the request gate chain, and the `/auth` routes.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod passwords;
pub mod policy;
pub mod responses;
pub mod roles;
pub mod routes;
pub mod service;
pub mod validation;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use gate::RequestContext;
pub use jwt::{Identity, JwtService};
pub use passwords::CredentialHasher;
pub use policy::{RoutePolicy, RouteTable};
pub use roles::{Role, RoleSet};
pub use service::AuthService;

#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub hasher: Arc<CredentialHasher>,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(config: AuthConfig, hasher: CredentialHasher, jwt_service: JwtService) -> Self {
        Self {
            config,
            hasher: Arc::new(hasher),
            jwt_service: Arc::new(jwt_service),
        }
    }

    pub fn from_config(config: AuthConfig) -> AuthResult<Self> {
        let hasher = CredentialHasher::new()?;
        let jwt_service = JwtService::from_config(&config)?;
        Ok(Self::new(config, hasher, jwt_service))
    }
}
