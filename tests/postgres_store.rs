use std::sync::Arc;

use medicine_api::auth::responses::LoginResponse;
use medicine_api::auth::{Role, RoleSet};
use medicine_api::models::NewUser;
use medicine_api::store::{PgUserStore, StoreError, UserKey, UserStore};
use medicine_api::test_support::{TestDatabase, TestDatabaseError, TestRocketBuilder};
use rocket::http::{ContentType, Header, Status};
use rocket::serde::json::json;

async fn database() -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping postgres store test: no test database configured");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

fn new_user(email: &str, roles: RoleSet) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        roles,
    }
}

#[tokio::test]
async fn create_find_list_delete() {
    let Some(test_db) = database().await else {
        return;
    };
    let store = PgUserStore::new(test_db.pool_clone());

    let created = store
        .create(new_user(" Mixed@Case.com ", RoleSet::admin()))
        .await
        .expect("create");
    assert_eq!(created.email, "mixed@case.com");
    assert!(created.roles.contains(Role::Admin));

    let by_email = store
        .find(&UserKey::Email("MIXED@case.com".into()))
        .await
        .expect("find by email");
    assert_eq!(by_email, created);

    store
        .create(new_user("other@x.com", RoleSet::regular()))
        .await
        .expect("create second");
    let listed = store.list().await.expect("list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, created.id);

    let removed = store
        .delete(&UserKey::Id(created.id))
        .await
        .expect("delete");
    assert_eq!(removed.id, created.id);
    assert!(matches!(
        store.find(&UserKey::Id(created.id)).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        store.delete(&UserKey::Id(created.id)).await,
        Err(StoreError::NotFound)
    ));

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
    let Some(test_db) = database().await else {
        return;
    };
    let store = PgUserStore::new(test_db.pool_clone());

    store
        .create(new_user("dup@x.com", RoleSet::regular()))
        .await
        .expect("first insert");
    let err = store
        .create(new_user("DUP@x.com", RoleSet::regular()))
        .await
        .expect_err("duplicate insert");
    match err {
        StoreError::UniqueViolation(constraint) => assert_eq!(constraint, "users_email_key"),
        other => panic!("unexpected error: {other:?}"),
    }

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn api_over_postgres() {
    let Some(test_db) = database().await else {
        return;
    };
    let builder = TestRocketBuilder::new().with_store(Arc::new(PgUserStore::new(test_db.pool_clone())));
    builder
        .insert_user("test_admin@gmail.com", "Test_password2!", RoleSet::admin())
        .await
        .expect("insert admin");
    {
        let client = builder.async_client().await;

        let credentials = json!({ "email": "a@x.com", "password": "Str0ng!Pass" }).to_string();
        let response = client
            .post("/auth/signup")
            .header(ContentType::JSON)
            .body(credentials.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);

        let response = client
            .post("/auth/signup")
            .header(ContentType::JSON)
            .body(credentials)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client
            .post("/auth/login")
            .header(ContentType::JSON)
            .body(json!({ "email": "test_admin@gmail.com", "password": "Test_password2!" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let login: LoginResponse = response.into_json().await.expect("login body");

        let response = client
            .get("/users")
            .header(Header::new("Authorization", format!("Bearer {}", login.token)))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let users: serde_json::Value = response.into_json().await.expect("user list");
        assert_eq!(users.as_array().map(Vec::len), Some(2));
    }

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test(flavor = "multi_thread")]
async fn unclosed_test_database_is_removed_on_drop() {
    let Some(observer) = database().await else {
        return;
    };
    let abandoned = database().await.expect("second test database");
    let name = abandoned.database_name().to_string();
    drop(abandoned);

    let pool = observer.pool_clone();
    let mut remaining = 1_i64;
    for _ in 0..50 {
        remaining = sqlx::query_scalar("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
            .bind(&name)
            .fetch_one(&pool)
            .await
            .expect("pg_database lookup");
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert_eq!(remaining, 0, "{name} still exists");

    observer.close().await.expect("failed to drop test database");
}
