//! Read-only booking rollups for dashboards.

use std::sync::Arc;

use crate::repositories::GymStore;
use crate::rules::aggregate;
use crate::types::{BookingResult, StatsResult};

pub struct StatsService<S> {
    store: Arc<S>,
}

impl<S> StatsService<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rollup over one member's history; an unknown member has an empty history
    pub async fn user_stats(&self, user_id: i64) -> BookingResult<StatsResult> {
        let bookings = self.store.bookings_for_user(user_id).await?;
        Ok(aggregate(&bookings))
    }

    /// Rollup over every booking in the gym
    pub async fn dashboard_stats(&self) -> BookingResult<StatsResult> {
        let bookings = self.store.all_bookings().await?;
        Ok(aggregate(&bookings))
    }
}

#[cfg(test)]
mod tests {
    use crate::services::fixtures::Fixture;
    use chrono::Duration;

    #[tokio::test]
    async fn test_user_and_dashboard_stats() {
        let fx = Fixture::new();
        let ana = fx.member("ana@gym.fr").await;
        let leo = fx.member("leo@gym.fr").await;
        let first = fx.class_in(Duration::hours(1), 30, 10).await;
        let second = fx.class_in(Duration::hours(4), 30, 10).await;
        let third = fx.class_in(Duration::hours(8), 30, 10).await;
        let bookings = fx.bookings();

        bookings.create_booking(ana.id, first.id).await.unwrap();
        let timely = bookings.create_booking(ana.id, second.id).await.unwrap();
        bookings.create_booking(ana.id, third.id).await.unwrap();
        bookings.create_booking(leo.id, third.id).await.unwrap();

        bookings.cancel_booking(timely.id, ana.id).await.unwrap();
        fx.sweeper()
            .sweep(first.starts_at + Duration::minutes(1))
            .await
            .unwrap();

        let stats = fx.stats();
        let mine = stats.user_stats(ana.id).await.unwrap();
        assert_eq!(mine.total_bookings, 3);
        assert_eq!(mine.confirmed, 1);
        assert_eq!(mine.cancelled, 1);
        assert_eq!(mine.no_shows, 1);
        assert!((mine.no_show_rate - 100.0 / 3.0).abs() < 1e-9);

        let all = stats.dashboard_stats().await.unwrap();
        assert_eq!(all.total_bookings, 4);
        assert_eq!(all.confirmed, 2);
        assert!((all.no_show_rate - 25.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_history() {
        let fx = Fixture::new();
        let stats = fx.stats().user_stats(42).await.unwrap();
        assert_eq!(stats.total_bookings, 0);
        assert_eq!(stats.no_show_rate, 0.0);
    }
}
