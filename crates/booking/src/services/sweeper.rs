//! Lapse confirmed bookings whose class has already started.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::repositories::GymStore;
use crate::types::BookingResult;

/// Batch reconciliation of overdue confirmed bookings
pub struct NoShowSweeper<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> NoShowSweeper<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Move every confirmed booking of a class that started strictly before
    /// `now` to `NoShow`. Returns how many were moved.
    pub async fn sweep(&self, now: DateTime<Utc>) -> BookingResult<u64> {
        let swept = self.store.mark_overdue_no_shows(now).await?;

        if swept > 0 {
            info!(swept, %now, "marked overdue bookings as no-show");
        } else {
            debug!(%now, "no overdue bookings");
        }

        Ok(swept)
    }

    /// Sweep against the injected clock
    pub async fn sweep_now(&self) -> BookingResult<u64> {
        self.sweep(self.clock.now()).await
    }
}
