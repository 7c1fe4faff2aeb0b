// Time Provider Port (for testability)

use crate::domain::Timestamp;

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in microseconds since epoch
    fn now_micros(&self) -> Timestamp;
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_micros(&self) -> Timestamp {
        chrono::Utc::now().timestamp_micros()
    }
}
