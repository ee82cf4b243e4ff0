use axum::extract::{ConnectInfo, OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::AppError;
use crate::metrics::{RATE_LIMITED, REQUEST_LATENCY, REQUEST_TOTAL, TRACKED_CLIENTS};
use crate::state::AppState;

// Remote address as "host:port"; proxy headers are not consulted
pub fn client_id(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let client = client_id(&req);

    if !state.limiter.check(&client) {
        RATE_LIMITED.inc();
        tracing::warn!("Rate limit exceeded for {}", client);
        return AppError::RateLimited.into_response();
    }
    TRACKED_CLIENTS.set(state.limiter.len() as f64);

    next.run(req).await
}

pub async fn log_requests(req: Request, next: Next) -> Response {
    REQUEST_TOTAL.inc();
    let start = Instant::now();
    let method = req.method().clone();
    // nested routers see the path with the mount prefix stripped
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let client = client_id(&req);

    let res = next.run(req).await;

    let elapsed = start.elapsed();
    REQUEST_LATENCY.observe(elapsed.as_secs_f64());
    tracing::info!(
        "[{}] {} {} {} {:?}",
        method,
        path,
        client,
        res.status().as_u16(),
        elapsed
    );
    res
}
