//! Request admission: the auth gate followed by the role gate.
//!
//! ```text
//! request ──► route policy ──public──► RequestContext::anonymous
//!                  │
//!                  ▼
//!             AuthGate::resolve (bearer token → Identity)   401 on failure
//!                  │
//!                  ▼
//!             RoleGate::check(&Identity)                     403 on failure
//!                  │
//!                  ▼
//!             RequestContext::authenticated(identity) ──► handler
//! ```
//!
//! The role gate only accepts an already resolved [`Identity`], so it cannot
//! run ahead of the auth gate.

use rocket::Request;
use rocket::State;
use rocket::request::{FromRequest, Outcome};

use crate::auth::jwt::{Identity, JwtService};
use crate::auth::policy::{RoutePolicy, RouteTable};
use crate::auth::roles::RoleSet;
use crate::auth::{AuthError, AuthResult, AuthState};

/// Outcome of admission, handed to the handler as a request guard.
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Option<Identity>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Role check against whatever this context carries. No identity means forbidden.
    pub fn ensure_roles(&self, required: &RoleSet) -> AuthResult<()> {
        if required.is_empty() {
            return Ok(());
        }
        match &self.identity {
            Some(identity) => RoleGate::check(required, identity),
            None => {
                log::debug!("role check on a context without identity");
                Err(AuthError::Forbidden)
            }
        }
    }
}

/// Resolves the bearer token in an `Authorization` header value into an identity.
pub struct AuthGate<'a> {
    tokens: &'a JwtService,
}

impl<'a> AuthGate<'a> {
    pub fn new(tokens: &'a JwtService) -> Self {
        Self { tokens }
    }

    pub fn resolve(&self, authorization: Option<&str>) -> AuthResult<Identity> {
        let token = bearer_token(authorization)?;
        self.tokens
            .verify(token)
            .map_err(|_| AuthError::Unauthenticated)
    }
}

pub struct RoleGate;

impl RoleGate {
    pub fn check(required: &RoleSet, identity: &Identity) -> AuthResult<()> {
        if required.is_empty() || identity.roles.effective().intersects(required) {
            Ok(())
        } else {
            log::debug!(
                "subject {} lacks any of the required roles",
                identity.subject_id
            );
            Err(AuthError::Forbidden)
        }
    }
}

/// Run the gate chain for one request.
pub fn admit(
    tokens: &JwtService,
    policy: &RoutePolicy,
    authorization: Option<&str>,
) -> AuthResult<RequestContext> {
    if policy.public {
        return Ok(RequestContext::anonymous());
    }

    let identity = AuthGate::new(tokens).resolve(authorization)?;
    RoleGate::check(&policy.required_roles, &identity)?;
    Ok(RequestContext::authenticated(identity))
}

fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or_else(|| {
        log::debug!("missing Authorization header");
        AuthError::Unauthenticated
    })?;
    match header.split_once(' ') {
        Some(("Bearer", token)) if !token.trim().is_empty() => Ok(token.trim()),
        _ => {
            log::debug!("Authorization header is not a bearer credential");
            Err(AuthError::Unauthenticated)
        }
    }
}

/// Subject id of the identity attached to the current request, for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachedSubject(pub Option<i32>);

/// Why the gate chain turned a request away, for the error catchers.
#[derive(Debug, Clone, Default)]
pub struct GateRejection(pub Option<(&'static str, String)>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestContext {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match admit_request(request).await {
            Ok(context) => {
                let subject = context.identity().map(|identity| identity.subject_id);
                request.local_cache(|| AttachedSubject(subject));
                Outcome::Success(context)
            }
            Err(err) => {
                let status = err.status();
                request.local_cache(|| GateRejection(Some((err.kind(), err.to_string()))));
                Outcome::Error((status, err))
            }
        }
    }
}

async fn admit_request(request: &Request<'_>) -> AuthResult<RequestContext> {
    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let routes = request
        .guard::<&State<RouteTable>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("RouteTable missing from state".into()))?;

    let fallback = RoutePolicy::default();
    let policy = match request.route() {
        Some(route) => routes.policy_for(route.method, route.uri.as_str()),
        None => &fallback,
    };

    admit(
        &auth_state.jwt_service,
        policy,
        request.headers().get_one("Authorization"),
    )
}
