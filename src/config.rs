use clap::Parser;
use std::path::PathBuf;

use crate::rate_limit::{DEFAULT_IDLE_EVICTION_SECS, DEFAULT_SWEEP_INTERVAL_SECS, LimiterConfig};

// CLI argument structure - every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "employee-api")]
#[command(about = "CRUD REST API for employee records")]
pub struct Args {
    // Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8083)]
    pub port: u16,

    // SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "employees.db")]
    pub database: PathBuf,

    // Allowed CORS origin, "*" for any
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    // Static frontend served for non-API paths (skipped when missing)
    #[arg(long, env = "FRONTEND_DIR", default_value = "frontend")]
    pub frontend_dir: PathBuf,

    // Rate limit max requests per window
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW", default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub rate_window: u64,

    // Idle clients are forgotten after this many seconds
    #[arg(long, env = "RATE_LIMIT_IDLE_EVICTION", default_value_t = DEFAULT_IDLE_EVICTION_SECS,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub idle_eviction: u64,

    // How often idle clients are swept
    #[arg(long, env = "RATE_LIMIT_SWEEP_INTERVAL", default_value_t = DEFAULT_SWEEP_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval: u64,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn limiter_config(&self) -> LimiterConfig {
        LimiterConfig {
            idle_eviction_secs: self.idle_eviction,
            sweep_interval_secs: self.sweep_interval,
            ..LimiterConfig::new(self.rate_limit, self.rate_window)
        }
    }
}
