use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, InvalidHeaderValue};
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use std::path::Path;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    create_employee, delete_employee, get_employee, health_handler, list_employees, metrics_handler,
    update_employee,
};
use crate::middleware;
use crate::state::AppState;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// requests running past REQUEST_TIMEOUT are answered with 408
pub fn timeout_layer() -> TimeoutLayer {
    TimeoutLayer::new(REQUEST_TIMEOUT)
}

// "*" allows any origin, anything else must match exactly
pub fn cors_layer(origin: &str) -> Result<CorsLayer, InvalidHeaderValue> {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::exact(HeaderValue::from_str(origin)?)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(3600)))
}

/// API routes under `/api`, wrapped (outermost first) in CORS, request
/// logging and the per-client rate limiter. Preflight requests are answered
/// by the CORS layer and never spend a token.
pub fn build_router(state: AppState, cors: CorsLayer, frontend_dir: &Path) -> Router {
    let api = Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn(middleware::log_requests))
        .layer(cors);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api);

    let router = if frontend_dir.is_dir() {
        tracing::info!("Serving frontend from {:?}", frontend_dir);
        router.fallback_service(ServeDir::new(frontend_dir))
    } else {
        router
    };

    router.layer(timeout_layer()).with_state(state)
}
