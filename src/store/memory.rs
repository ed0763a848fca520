//! In-process user store used by tests and the local test Rocket.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::models::{NewUser, User};
use crate::store::{StoreError, StoreResult, UserKey, UserStore, normalize_email};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i32,
    users: BTreeMap<i32, User>,
}

impl Inner {
    fn id_for(&self, key: &UserKey) -> Option<i32> {
        match key {
            UserKey::Id(id) => self.users.contains_key(id).then_some(*id),
            UserKey::Email(email) => {
                let email = normalize_email(email);
                self.users
                    .values()
                    .find(|user| user.email == email)
                    .map(|user| user.id)
            }
        }
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let email = normalize_email(&user.email);
        // Check and insert under one write lock.
        let mut inner = self.inner.write();
        if inner.id_for(&UserKey::Email(email.clone())).is_some() {
            return Err(StoreError::UniqueViolation("users.email".into()));
        }

        inner.next_id += 1;
        let created = User {
            id: inner.next_id,
            email,
            password_hash: user.password_hash,
            roles: user.roles,
            created_at: Utc::now(),
        };
        inner.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find(&self, key: &UserKey) -> StoreResult<User> {
        let inner = self.inner.read();
        inner
            .id_for(key)
            .and_then(|id| inner.users.get(&id).cloned())
            .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        Ok(self.inner.read().users.values().cloned().collect())
    }

    async fn delete(&self, key: &UserKey) -> StoreResult<User> {
        let mut inner = self.inner.write();
        let id = inner.id_for(key).ok_or(StoreError::NotFound)?;
        inner.users.remove(&id).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::roles::RoleSet;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            roles: RoleSet::regular(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = MemoryUserStore::new();
        let first = store.create(new_user("a@x.com")).await.expect("create");

        let err = store
            .create(new_user(" A@X.com "))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, StoreError::UniqueViolation(_)));

        let found = store
            .find(&UserKey::Email("a@x.com".into()))
            .await
            .expect("first user intact");
        assert_eq!(found, first);
        assert_eq!(store.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn find_and_delete_by_either_key() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.expect("create a");
        let b = store.create(new_user("b@x.com")).await.expect("create b");
        assert_ne!(a.id, b.id);

        assert_eq!(store.find(&UserKey::Id(b.id)).await.expect("find"), b);
        store.delete(&UserKey::Id(a.id)).await.expect("delete a");
        store
            .delete(&UserKey::Email("b@x.com".into()))
            .await
            .expect("delete b");

        assert!(matches!(
            store.find(&UserKey::Id(a.id)).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete(&UserKey::Id(999_999)).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("a@x.com")).await.expect("create");
        store.delete(&UserKey::Id(a.id)).await.expect("delete");
        let again = store.create(new_user("a@x.com")).await.expect("recreate");
        assert!(again.id > a.id);
    }
}
