mod config;
mod error;
mod handlers;
mod metrics;
mod middleware;
mod models;
mod rate_limit;
mod repository;
mod server;
mod service;
mod state;
mod validation;

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;
use crate::rate_limit::RateLimiter;
use crate::repository::SqliteEmployeeRepository;
use crate::service::EmployeeService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "employee_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments / environment
    let args = Args::parse();

    // a bad limiter config stops startup here
    let limiter = Arc::new(RateLimiter::new(args.limiter_config())?);
    let sweeper = limiter.spawn_sweeper();

    let repo = Arc::new(SqliteEmployeeRepository::open(&args.database)?);
    let state = AppState {
        employees: EmployeeService::new(repo),
        limiter: limiter.clone(),
    };

    let cors = server::cors_layer(&args.cors_origin)?;
    let app = server::build_router(state, cors, &args.frontend_dir);

    let addr = args.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Employee API running on http://{}", addr);
    tracing::info!(
        "Rate limit: {} requests per {} seconds per client (refill {:.3}/s)",
        args.rate_limit,
        args.rate_window,
        limiter.refill_per_sec()
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    sweeper.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
