use std::sync::Arc;

use crate::auth::jwt::{Identity, JwtService, SignedAccessToken};
use crate::auth::passwords::CredentialHasher;
use crate::auth::roles::RoleSet;
use crate::auth::{AuthError, AuthResult, AuthState};
use crate::models::{NewUser, User};
use crate::store::{SharedUserStore, StoreError, UserKey};

/// Signup and login on top of the hasher, the token service and the user store.
#[derive(Clone)]
pub struct AuthService {
    hasher: Arc<CredentialHasher>,
    tokens: Arc<JwtService>,
    users: SharedUserStore,
}

impl AuthService {
    pub fn new(state: &AuthState, users: SharedUserStore) -> Self {
        Self {
            hasher: state.hasher.clone(),
            tokens: state.jwt_service.clone(),
            users,
        }
    }

    /// Register a regular user.
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<User> {
        self.sign_up_with_roles(email, password, RoleSet::regular())
            .await
    }

    pub async fn sign_up_with_roles(
        &self,
        email: &str,
        password: &str,
        roles: RoleSet,
    ) -> AuthResult<User> {
        let password_hash = self.hasher.hash(password)?;
        let new_user = NewUser {
            email: email.to_string(),
            password_hash,
            roles,
        };

        match self.users.create(new_user).await {
            Ok(user) => {
                log::info!("registered user {}", user.id);
                Ok(user)
            }
            Err(StoreError::UniqueViolation(constraint)) => {
                log::debug!("signup rejected by constraint {}", constraint);
                Err(AuthError::DuplicateEmail)
            }
            Err(err) => Err(AuthError::Store(err)),
        }
    }

    pub async fn log_in(&self, email: &str, password: &str) -> AuthResult<SignedAccessToken> {
        let user = match self.users.find(&UserKey::Email(email.to_string())).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::NotFound),
            Err(err) => return Err(AuthError::Store(err)),
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            log::debug!("incorrect password for user {}", user.id);
            return Err(AuthError::IncorrectPassword);
        }

        let identity = Identity {
            subject_id: user.id,
            email: user.email,
            roles: user.roles,
        };
        self.tokens.issue(&identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::auth::roles::Role;
    use crate::store::MemoryUserStore;

    const EMAIL: &str = "test@gmail.com";
    const PASSWORD: &str = "TestPassword_1234!";

    fn service() -> (AuthService, SharedUserStore, AuthState) {
        let state = AuthState::from_config(AuthConfig::with_secret("service-test-secret"))
            .expect("auth state");
        let users: SharedUserStore = Arc::new(MemoryUserStore::new());
        (AuthService::new(&state, users.clone()), users, state)
    }

    #[tokio::test]
    async fn sign_up_stores_a_hash_and_regular_role() {
        let (service, users, _) = service();
        let user = service.sign_up(EMAIL, PASSWORD).await.expect("sign up");

        assert_eq!(user.email, EMAIL);
        assert_eq!(user.roles, RoleSet::regular());
        assert_ne!(user.password_hash, PASSWORD);
        assert_eq!(
            users.find(&UserKey::Id(user.id)).await.expect("stored"),
            user
        );
    }

    #[tokio::test]
    async fn second_sign_up_with_same_email_is_duplicate() {
        let (service, users, _) = service();
        let first = service.sign_up(EMAIL, PASSWORD).await.expect("sign up");

        let err = service
            .sign_up(EMAIL, "Other_pass9?")
            .await
            .expect_err("duplicate");
        assert!(matches!(err, AuthError::DuplicateEmail));
        assert_eq!(err.status().code, 400);

        let stored = users
            .find(&UserKey::Email(EMAIL.into()))
            .await
            .expect("first user intact");
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn log_in_issues_a_token_for_the_stored_identity() {
        let (service, _, state) = service();
        let user = service.sign_up(EMAIL, PASSWORD).await.expect("sign up");

        let token = service.log_in(EMAIL, PASSWORD).await.expect("log in");
        let identity = state.jwt_service.verify(&token.token).expect("verify");

        assert_eq!(identity.subject_id, user.id);
        assert_eq!(identity.email, EMAIL);
        assert_eq!(identity.roles, RoleSet::regular());
    }

    #[tokio::test]
    async fn admin_roles_are_embedded_at_login() {
        let (service, _, state) = service();
        service
            .sign_up_with_roles("admin@x.com", PASSWORD, RoleSet::from([Role::Admin]))
            .await
            .expect("sign up admin");

        let token = service.log_in("admin@x.com", PASSWORD).await.expect("log in");
        let identity = state.jwt_service.verify(&token.token).expect("verify");
        assert!(identity.roles.contains(Role::Admin));
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let (service, _, _) = service();
        let err = service.log_in(EMAIL, PASSWORD).await.expect_err("unknown");
        assert!(matches!(err, AuthError::NotFound));
        assert_eq!(err.status().code, 404);
    }

    #[tokio::test]
    async fn wrong_password_is_incorrect_password() {
        let (service, _, _) = service();
        service.sign_up(EMAIL, PASSWORD).await.expect("sign up");

        let err = service
            .log_in(EMAIL, &format!("{PASSWORD}fjdk"))
            .await
            .expect_err("wrong password");
        assert!(matches!(err, AuthError::IncorrectPassword));
        assert_eq!(err.status().code, 401);
    }
}
