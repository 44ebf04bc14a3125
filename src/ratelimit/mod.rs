//! Rate limiting logic and state management.

mod clock;
mod limiter;
mod record;
mod status;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use limiter::{LimiterSettings, RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS};
pub use record::WindowRecord;
pub use status::RateLimitStatus;
pub use sweeper::spawn_sweeper;
