//! Booking state transitions driven by the clock.

use chrono::{DateTime, Duration, Utc};
use gymbook_config::PolicyConfig;
use gymbook_database::BookingStatus;

/// How long before a session a member may still cancel without penalty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    pub window: Duration,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            window: Duration::hours(2),
        }
    }
}

impl From<&PolicyConfig> for CancellationPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            window: Duration::hours(config.cancellation_window_hours),
        }
    }
}

/// Terminal state a voluntary cancellation lands in.
///
/// A cancellation exactly `window` before the start is still timely.
pub fn classify_cancellation(
    starts_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> BookingStatus {
    if starts_at - now >= window {
        BookingStatus::Cancelled
    } else {
        BookingStatus::NoShow
    }
}

impl CancellationPolicy {
    pub fn classify(&self, starts_at: DateTime<Utc>, now: DateTime<Utc>) -> BookingStatus {
        classify_cancellation(starts_at, now, self.window)
    }
}
