//! Per-route access metadata.
//!
//! Every mounted route is looked up here by method and route template (the
//! `uri` Rocket reports for the matched route, e.g. `/users/<id>`). Routes
//! without an entry get [`RoutePolicy::default`]: authentication required, no
//! role restriction. The table is built before launch and only read afterwards.

use std::collections::HashMap;

use rocket::http::Method;

use crate::auth::roles::{Role, RoleSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePolicy {
    pub public: bool,
    pub required_roles: RoleSet,
}

impl RoutePolicy {
    pub fn public() -> Self {
        Self {
            public: true,
            required_roles: RoleSet::new(),
        }
    }

    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn restricted<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self {
            public: false,
            required_roles: roles.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<(&'static str, String), RoutePolicy>,
    fallback: RoutePolicy,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: Method, uri: &str, policy: RoutePolicy) -> Self {
        self.entries
            .insert((method.as_str(), normalize(uri)), policy);
        self
    }

    pub fn public(self, method: Method, uri: &str) -> Self {
        self.with(method, uri, RoutePolicy::public())
    }

    pub fn restricted<I: IntoIterator<Item = Role>>(
        self,
        method: Method,
        uri: &str,
        roles: I,
    ) -> Self {
        self.with(method, uri, RoutePolicy::restricted(roles))
    }

    pub fn policy_for(&self, method: Method, uri: &str) -> &RoutePolicy {
        self.entries
            .get(&(method.as_str(), normalize(uri)))
            .unwrap_or(&self.fallback)
    }

    pub fn contains(&self, method: Method, uri: &str) -> bool {
        self.entries
            .contains_key(&(method.as_str(), normalize(uri)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::new()
            .public(Method::Post, "/auth/login")
            .restricted(Method::Delete, "/users/<id>", [Role::Admin])
    }

    #[test]
    fn looks_up_by_method_and_template() {
        let table = table();
        assert!(table.policy_for(Method::Post, "/auth/login").public);
        assert_eq!(
            table.policy_for(Method::Delete, "/users/<id>").required_roles,
            RoleSet::admin()
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unknown_routes_require_authentication_only() {
        let table = table();
        let policy = table.policy_for(Method::Get, "/auth/login");
        assert_eq!(policy, &RoutePolicy::authenticated());
        assert!(!table.contains(Method::Get, "/auth/login"));
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        let table = table();
        assert!(table.policy_for(Method::Post, "/auth/login/").public);
    }
}
