use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Admin,
}

impl Role {
    pub fn parse(role: &str) -> Option<Self> {
        match role.trim().to_lowercase().as_str() {
            "regular" | "user" => Some(Role::Regular),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Regular => "regular",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of roles held by a user or required by a route.
///
/// A user holding no roles is treated as [`Role::Regular`] when access is checked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular() -> Self {
        Self::from_iter([Role::Regular])
    }

    pub fn admin() -> Self {
        Self::from_iter([Role::Admin])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Roles used for access checks: an empty set counts as `{regular}`.
    pub fn effective(&self) -> RoleSet {
        if self.0.is_empty() {
            RoleSet::regular()
        } else {
            self.clone()
        }
    }

    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Database representation (`TEXT[]`).
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|role| role.as_str().to_string()).collect()
    }

    /// Parse stored role names, dropping values this build does not know about.
    pub fn from_strings<S: AsRef<str>>(values: &[S]) -> Self {
        values
            .iter()
            .filter_map(|value| {
                let parsed = Role::parse(value.as_ref());
                if parsed.is_none() {
                    log::warn!("ignoring unknown role '{}'", value.as_ref());
                }
                parsed
            })
            .collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        RoleSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}
