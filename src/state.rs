use std::sync::Arc;
use crate::rate_limit::RateLimiter;
use crate::service::EmployeeService;

// app's shared state
#[derive(Clone)]
pub struct AppState {
    pub employees: EmployeeService,
    pub limiter: Arc<RateLimiter>, // per-client request budget
}
