use std::time::Instant;

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use tracing::info;
use uuid::Uuid;

pub async fn request_mw(req: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    info!("[{}] --> {} {}", request_id, method, path);
    let response = next.run(req).await;
    info!(
        "[{}] <-- {} {} {} ({:?})",
        request_id,
        method,
        path,
        response.status(),
        started.elapsed()
    );

    response
}
