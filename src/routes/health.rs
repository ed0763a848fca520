//! Liveness endpoint, public in the route table.

use rocket::get;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[get("/health")]
pub fn health_check(_context: crate::auth::RequestContext) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
