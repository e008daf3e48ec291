mod error_handler;
mod rate_limit;
mod response_cache;

pub use error_handler::log_errors;
pub use rate_limit::{RequestRateLimit, client_ip, rate_limit};
pub use response_cache::{CachedResponse, response_cache};
