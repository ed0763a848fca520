//! Route handlers and the access policy of every mounted route.

use rocket::Route;
use rocket::http::Method;

use crate::auth::policy::RouteTable;
use crate::auth::roles::Role;

pub mod health;
pub mod users;

/// Every API route, mounted at `/`.
pub fn api_routes() -> Vec<Route> {
    routes![
        health::health_check,
        crate::auth::routes::signup,
        crate::auth::routes::login,
        users::list_users,
        users::delete_user,
    ]
}

/// Access policy for the routes returned by [`api_routes`].
pub fn api_policies() -> RouteTable {
    RouteTable::new()
        .public(Method::Get, "/health")
        .public(Method::Post, "/auth/signup")
        .public(Method::Post, "/auth/login")
        .restricted(Method::Get, "/users", [Role::Admin])
        .restricted(Method::Delete, "/users/<id>", [Role::Admin])
}
