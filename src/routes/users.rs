//! User administration. Admin-only through the route table.

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get};

use crate::auth::gate::RequestContext;
use crate::error::ApiError;
use crate::models::UserSummary;
use crate::store::{SharedUserStore, StoreError, UserKey};

#[get("/users")]
pub async fn list_users(
    _context: RequestContext,
    users: &State<SharedUserStore>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let users = users.list().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

#[delete("/users/<id>")]
pub async fn delete_user(
    context: RequestContext,
    users: &State<SharedUserStore>,
    id: &str,
) -> Result<Status, ApiError> {
    // Numeric ids outside the i32 range cannot name any user.
    let id = parse_user_id(id)?.ok_or(ApiError::Store(StoreError::NotFound))?;

    let removed = users.delete(&UserKey::Id(id)).await?;
    log::info!(
        "user {} deleted by {}",
        removed.id,
        context
            .identity()
            .map(|identity| identity.subject_id.to_string())
            .unwrap_or_else(|| "unknown".into())
    );
    Ok(Status::NoContent)
}

/// `Ok(None)` for a well-formed number that does not fit a user id.
fn parse_user_id(raw: &str) -> Result<Option<i32>, ApiError> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(format!("id must be a number, got '{raw}'")));
    }
    Ok(raw.parse::<i32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_parse_within_range() {
        assert_eq!(parse_user_id("42").expect("numeric"), Some(42));
        assert_eq!(parse_user_id("-1").expect("numeric"), Some(-1));
    }

    #[test]
    fn oversized_numbers_are_numeric_but_unknown() {
        for raw in ["2147483648", "99999999999999999999", "-2147483649"] {
            assert_eq!(parse_user_id(raw).expect("numeric"), None, "{raw}");
        }
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        for raw in ["abc", "", "-", "12a", "1.5", "+3"] {
            let err = parse_user_id(raw).expect_err(raw);
            assert_eq!(err.status().code, 400, "{raw}");
        }
    }
}
