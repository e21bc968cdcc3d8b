pub mod errors;
pub mod ratelimit;
pub mod table;

pub use errors::{one_line, ChartError, ResolutionError};
pub use ratelimit::RateLimiter;
pub use table::Table;
