use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use super::request_id::RequestId;

/// Logs every 4xx response at `warn` and every 5xx at `error`.
pub async fn log_error_responses(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let uri = req.uri().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            status = status.as_u16(),
            method,
            uri,
            request_id,
            latency_ms,
            "Request failed"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            status = status.as_u16(),
            method,
            uri,
            request_id,
            latency_ms,
            "Request rejected"
        );
    }

    response
}
