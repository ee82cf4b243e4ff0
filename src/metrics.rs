use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("employee_api_requests_total", "Total number of API requests").unwrap();
    pub static ref RATE_LIMITED: Counter =
        register_counter!("employee_api_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "employee_api_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref TRACKED_CLIENTS: Gauge =
        register_gauge!("employee_api_rate_limit_clients", "Clients currently tracked by the rate limiter").unwrap();
    pub static ref EVICTED_CLIENTS: Counter =
        register_counter!("employee_api_rate_limit_evicted_total", "Idle clients evicted by the sweeper").unwrap();
}
