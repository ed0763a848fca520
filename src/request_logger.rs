use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

use crate::auth::gate::AttachedSubject;

/// One log line per request: method, URI, status, latency, and the caller's
/// subject id once the gate chain has resolved one.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(Instant::now);
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed = request.local_cache(Instant::now).elapsed();
        let subject = match request.local_cache(AttachedSubject::default).0 {
            Some(id) => format!("subject={id}"),
            None => "anonymous".to_string(),
        };

        log::info!(
            "{} {} -> {} [{}] ({:.2}ms)",
            request.method(),
            request.uri(),
            response.status().code,
            subject,
            elapsed.as_secs_f64() * 1000.0
        );
    }
}
