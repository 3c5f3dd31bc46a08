//! Booking service: creation, member cancellation and admin class cancellation.

use std::sync::Arc;

use gymbook_database::{Booking, GuardedInsert};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::repositories::GymStore;
use crate::rules::{has_capacity, sessions_overlap, CancellationPolicy};
use crate::types::{BookingError, BookingResult, ClassCancellation, ConflictKind};
use crate::utils::PermissionChecker;

/// Service for managing the booking lifecycle
pub struct BookingService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: CancellationPolicy,
}

impl<S> BookingService<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, policy: CancellationPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Book a place in a class for a member.
    ///
    /// Checks run in a fixed order so the reported conflict is deterministic:
    /// cancelled, started, full, duplicate, then overlap. The final insert
    /// re-checks capacity and overlap atomically, so a lost race still
    /// reports `Full` or `TimeOverlap`.
    pub async fn create_booking(&self, user_id: i64, class_id: i64) -> BookingResult<Booking> {
        let now = self.clock.now();

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(user_id))?;

        let class = self
            .store
            .find_class(class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(class_id))?;

        if class.is_cancelled {
            return Err(ConflictKind::ClassCancelled.into());
        }

        if class.has_started(now) {
            return Err(ConflictKind::ClassStarted.into());
        }

        let confirmed = self.store.count_confirmed(class.id).await?;
        if !has_capacity(&class, confirmed) {
            debug!(class_id, confirmed, capacity = class.capacity, "class is full");
            return Err(ConflictKind::Full.into());
        }

        if self
            .store
            .find_confirmed_booking(user.id, class.id)
            .await?
            .is_some()
        {
            return Err(ConflictKind::DuplicateBooking.into());
        }

        let held = self.store.confirmed_sessions(user.id).await?;
        if let Some(clash) = held
            .iter()
            .find(|session| session.id != class.id && sessions_overlap(session, &class))
        {
            debug!(user_id, class_id, clashing_class_id = clash.id, "booking overlaps");
            return Err(ConflictKind::TimeOverlap.into());
        }

        match self
            .store
            .insert_booking_if_available(user.id, class.id, now)
            .await?
        {
            GuardedInsert::Inserted(booking) => {
                info!(booking_id = booking.id, user_id, class_id, "booking confirmed");
                Ok(booking)
            }
            GuardedInsert::Full => Err(ConflictKind::Full.into()),
            GuardedInsert::ClassClosed => Err(ConflictKind::ClassCancelled.into()),
            GuardedInsert::Duplicate => Err(ConflictKind::DuplicateBooking.into()),
            GuardedInsert::Overlap => {
                debug!(user_id, class_id, "overlapping booking landed first");
                Err(ConflictKind::TimeOverlap.into())
            }
        }
    }

    /// Cancel a member's own booking.
    ///
    /// Lands in `Cancelled` when done at least the policy window before the
    /// class starts, otherwise in `NoShow`. Terminal bookings report `NotFound`.
    pub async fn cancel_booking(
        &self,
        booking_id: i64,
        requesting_user_id: i64,
    ) -> BookingResult<Booking> {
        let booking = self
            .store
            .find_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(booking_id))?;

        if let Err(e) = PermissionChecker::require_booking_owner(&booking, requesting_user_id) {
            warn!(
                booking_id,
                owner_id = booking.user_id,
                requesting_user_id,
                "rejected cancellation of another member's booking"
            );
            return Err(e);
        }

        if booking.status.is_terminal() {
            return Err(BookingError::booking_not_found(booking_id));
        }

        let class = self
            .store
            .find_class(booking.class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(booking.class_id))?;

        let now = self.clock.now();
        let next = self.policy.classify(class.starts_at, now);

        let cancelled = self
            .store
            .transition_booking(booking_id, next)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(booking_id))?;

        info!(
            booking_id,
            class_id = class.id,
            status = %cancelled.status,
            minutes_before_start = (class.starts_at - now).num_minutes(),
            "booking cancelled"
        );

        Ok(cancelled)
    }

    /// Admin path: cancel a class and release every confirmed booking in it
    pub async fn cancel_class(
        &self,
        class_id: i64,
        requesting_user_id: i64,
    ) -> BookingResult<ClassCancellation> {
        let requester = self
            .store
            .find_user(requesting_user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(requesting_user_id))?;

        if let Err(e) = PermissionChecker::require_admin(&requester) {
            warn!(class_id, requesting_user_id, "non-admin attempted to cancel a class");
            return Err(e);
        }

        let class = self
            .store
            .find_class(class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(class_id))?;

        if class.is_cancelled {
            return Err(ConflictKind::AlreadyCancelled.into());
        }

        let cancelled_count = self
            .store
            .cancel_class_with_bookings(class_id)
            .await?
            .ok_or(BookingError::Conflict(ConflictKind::AlreadyCancelled))?;

        info!(
            class_id,
            cancelled_count,
            admin_id = requesting_user_id,
            "class cancelled"
        );

        Ok(ClassCancellation {
            class_id,
            cancelled_count,
        })
    }

    /// Booking history of a member, newest first
    pub async fn user_bookings(&self, user_id: i64) -> BookingResult<Vec<Booking>> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(user_id))?;

        Ok(self.store.bookings_for_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::repositories::{BookingRepo, ClassRepo};
    use crate::services::fixtures::Fixture;
    use chrono::Duration;
    use gymbook_database::BookingStatus;

    #[tokio::test]
    async fn test_create_booking_success() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;

        let booking = fx.bookings().create_booking(member.id, class.id).await.unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.user_id, member.id);
        assert_eq!(booking.class_id, class.id);
        assert_eq!(booking.created_at, fx.now());
    }

    #[tokio::test]
    async fn test_create_booking_unknown_user_or_class() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        let service = fx.bookings();

        let err = service.create_booking(999, class.id).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { entity: "user", id: 999 }));

        let err = service.create_booking(member.id, 999).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { entity: "class", id: 999 }));
    }

    #[tokio::test]
    async fn test_create_booking_on_cancelled_class() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        fx.store.cancel_class_with_bookings(class.id).await.unwrap();

        let err = fx.bookings().create_booking(member.id, class.id).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::ClassCancelled));
    }

    #[tokio::test]
    async fn test_create_booking_after_start() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::zero(), 60, 10).await;

        let err = fx.bookings().create_booking(member.id, class.id).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::ClassStarted));
    }

    #[tokio::test]
    async fn test_create_booking_when_full() {
        let fx = Fixture::new();
        let first = fx.member("first@gym.fr").await;
        let second = fx.member("second@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 1).await;
        let service = fx.bookings();

        service.create_booking(first.id, class.id).await.unwrap();
        let err = service.create_booking(second.id, class.id).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::Full));
    }

    #[tokio::test]
    async fn test_duplicate_then_rebook_after_cancel() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        let service = fx.bookings();

        let first = service.create_booking(member.id, class.id).await.unwrap();
        let err = service.create_booking(member.id, class.id).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::DuplicateBooking));

        service.cancel_booking(first.id, member.id).await.unwrap();
        let again = service.create_booking(member.id, class.id).await.unwrap();
        assert_ne!(again.id, first.id);
        assert_eq!(again.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_overlapping_bookings_rejected_touching_allowed() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let morning = fx.class_in(Duration::hours(3), 60, 10).await;
        let clash = fx.class_in(Duration::hours(3) + Duration::minutes(30), 60, 10).await;
        let back_to_back = fx.class_in(Duration::hours(4), 45, 10).await;
        let service = fx.bookings();

        service.create_booking(member.id, morning.id).await.unwrap();

        let err = service.create_booking(member.id, clash.id).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::TimeOverlap));

        service.create_booking(member.id, back_to_back.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_booking_no_longer_blocks_overlap() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let a = fx.class_in(Duration::hours(5), 60, 10).await;
        let b = fx.class_in(Duration::hours(5), 60, 10).await;
        let service = fx.bookings();

        let booking = service.create_booking(member.id, a.id).await.unwrap();
        service.cancel_booking(booking.id, member.id).await.unwrap();
        service.create_booking(member.id, b.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_exactly_at_window_is_timely() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(2), 60, 10).await;
        let service = fx.bookings();

        let booking = service.create_booking(member.id, class.id).await.unwrap();
        let cancelled = service.cancel_booking(booking.id, member.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_one_second_inside_window_is_no_show() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(2), 60, 10).await;
        let service = fx.bookings();

        let booking = service.create_booking(member.id, class.id).await.unwrap();
        fx.clock.advance(Duration::seconds(1));

        let cancelled = service.cancel_booking(booking.id, member.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::NoShow);
    }

    #[tokio::test]
    async fn test_cancel_with_mocked_clock() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(6), 60, 10).await;
        let booking = fx.bookings().create_booking(member.id, class.id).await.unwrap();

        let mut clock = MockClock::new();
        clock
            .expect_now()
            .times(1)
            .return_const(class.starts_at - Duration::minutes(119));

        let service = BookingService::new(
            fx.store.clone(),
            Arc::new(clock),
            CancellationPolicy::default(),
        );
        let cancelled = service.cancel_booking(booking.id, member.id).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::NoShow);
    }

    #[tokio::test]
    async fn test_cancel_someone_elses_booking_is_forbidden() {
        let fx = Fixture::new();
        let owner = fx.member("owner@gym.fr").await;
        let intruder = fx.member("intruder@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        let service = fx.bookings();

        let booking = service.create_booking(owner.id, class.id).await.unwrap();
        let err = service.cancel_booking(booking.id, intruder.id).await.unwrap_err();
        assert!(err.is_forbidden());

        let unchanged = fx.store.find_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_recancel_is_not_found() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        let service = fx.bookings();

        let booking = service.create_booking(member.id, class.id).await.unwrap();
        service.cancel_booking(booking.id, member.id).await.unwrap();

        let err = service.cancel_booking(booking.id, member.id).await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.cancel_booking(12345, member.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cancel_class_releases_all_confirmed() {
        let fx = Fixture::new();
        let admin = fx.admin("admin@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        let service = fx.bookings();

        let mut members = Vec::new();
        for i in 0..4 {
            let member = fx.member(&format!("m{i}@gym.fr")).await;
            service.create_booking(member.id, class.id).await.unwrap();
            members.push(member);
        }
        // One booking already terminal stays as it is
        let early = service.user_bookings(members[0].id).await.unwrap();
        service.cancel_booking(early[0].id, members[0].id).await.unwrap();

        let outcome = service.cancel_class(class.id, admin.id).await.unwrap();
        assert_eq!(outcome.cancelled_count, 3);
        assert_eq!(fx.store.count_confirmed(class.id).await.unwrap(), 0);

        let statuses: Vec<BookingStatus> = fx
            .store
            .all_bookings()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.status)
            .collect();
        assert_eq!(
            statuses.iter().filter(|s| **s == BookingStatus::CancelledByClass).count(),
            3
        );
        assert_eq!(
            statuses.iter().filter(|s| **s == BookingStatus::Cancelled).count(),
            1
        );

        let err = service.cancel_class(class.id, admin.id).await.unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::AlreadyCancelled));
    }

    #[tokio::test]
    async fn test_cancel_class_requires_admin() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let admin = fx.admin("admin@gym.fr").await;
        let class = fx.class_in(Duration::hours(4), 60, 10).await;
        let service = fx.bookings();

        let err = service.cancel_class(class.id, member.id).await.unwrap_err();
        assert!(err.is_forbidden());

        let err = service.cancel_class(class.id, 999).await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.cancel_class(999, admin.id).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound { entity: "class", .. }));
    }

    #[tokio::test]
    async fn test_concurrent_requests_for_last_slot() {
        let fx = Fixture::new();
        let class = fx.class_in(Duration::hours(4), 60, 2).await;
        let service = fx.bookings();

        let mut members = Vec::new();
        for i in 0..8 {
            members.push(fx.member(&format!("racer{i}@gym.fr")).await);
        }

        let attempts = members
            .iter()
            .map(|m| service.create_booking(m.id, class.id));
        let results = futures::future::join_all(attempts).await;

        let confirmed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(confirmed, 2);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.conflict_kind() == Some(ConflictKind::Full)));
        assert_eq!(fx.store.count_confirmed(class.id).await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_overlapping_requests_keep_one_booking() {
        let fx = Fixture::new();
        let member = fx.member("racer@gym.fr").await;

        let mut class_ids = Vec::new();
        for i in 0..6 {
            let class = fx
                .class_in(Duration::hours(3) + Duration::minutes(10 * i), 60, 10)
                .await;
            class_ids.push(class.id);
        }

        let service = Arc::new(fx.bookings());
        let handles: Vec<_> = class_ids
            .into_iter()
            .map(|class_id| {
                let service = service.clone();
                let user_id = member.id;
                tokio::spawn(async move { service.create_booking(user_id, class_id).await })
            })
            .collect();

        let mut confirmed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => confirmed += 1,
                Err(e) => assert_eq!(e.conflict_kind(), Some(ConflictKind::TimeOverlap)),
            }
        }

        assert_eq!(confirmed, 1);
        assert_eq!(fx.store.confirmed_sessions(member.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_holds_across_create_cancel_sequences() {
        let fx = Fixture::new();
        let class = fx.class_in(Duration::hours(6), 60, 3).await;
        let service = fx.bookings();

        let mut members = Vec::new();
        for i in 0..6 {
            members.push(fx.member(&format!("cycle{i}@gym.fr")).await);
        }

        for round in 0..5 {
            for member in &members {
                let _ = service.create_booking(member.id, class.id).await;
                let confirmed = fx.store.count_confirmed(class.id).await.unwrap();
                assert!(confirmed <= class.capacity);
            }

            // Release every other member's booking each round
            for member in members.iter().skip(round % 2).step_by(2) {
                if let Some(booking) = fx
                    .store
                    .find_confirmed_booking(member.id, class.id)
                    .await
                    .unwrap()
                {
                    service.cancel_booking(booking.id, member.id).await.unwrap();
                }
            }
            assert!(fx.store.count_confirmed(class.id).await.unwrap() <= class.capacity);
        }
    }

    #[tokio::test]
    async fn test_user_bookings_newest_first() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let a = fx.class_in(Duration::hours(4), 60, 10).await;
        let b = fx.class_in(Duration::hours(8), 60, 10).await;
        let service = fx.bookings();

        service.create_booking(member.id, a.id).await.unwrap();
        fx.clock.advance(Duration::minutes(1));
        service.create_booking(member.id, b.id).await.unwrap();

        let history = service.user_bookings(member.id).await.unwrap();
        let classes: Vec<i64> = history.iter().map(|b| b.class_id).collect();
        assert_eq!(classes, vec![b.id, a.id]);

        assert!(service.user_bookings(999).await.unwrap_err().is_not_found());
    }
}
