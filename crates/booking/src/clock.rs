//! Time source consumed by every rule that depends on "now".

use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;

/// Supplies the current instant
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an instant until moved explicitly.
///
/// Used by the seed command and by tests that walk time across deadlines.
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Pin the clock to a new instant
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard = instant;
    }

    /// Move the clock forward (or backward for negative durations)
    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().unwrap_or_else(|e| e.into_inner())
    }
}
