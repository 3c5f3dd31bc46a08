//! Persistence seams used by the services.
//!
//! Services are generic over [`GymStore`]. Production wires in [`SqliteStore`];
//! tests use [`MemoryStore`].

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use gymbook_database::{
    Booking, BookingStatus, ClassOccupancy, ClassSession, CreateClassRequest,
    CreateSubscriptionRequest, CreateUserRequest, DatabaseResult, GuardedInsert, Subscription,
    User,
};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[allow(async_fn_in_trait)]
pub trait UserRepo {
    async fn find_user(&self, id: i64) -> DatabaseResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;
    async fn insert_user(
        &self,
        request: &CreateUserRequest,
        joined_at: DateTime<Utc>,
    ) -> DatabaseResult<User>;
    async fn list_users(&self) -> DatabaseResult<Vec<User>>;
}

#[allow(async_fn_in_trait)]
pub trait ClassRepo {
    async fn find_class(&self, id: i64) -> DatabaseResult<Option<ClassSession>>;
    async fn insert_class(&self, request: &CreateClassRequest) -> DatabaseResult<ClassSession>;
    /// Insert unless the coach already leads an overlapping, non-cancelled
    /// session; the check and the insert are one atomic unit
    async fn insert_class_if_coach_free(
        &self,
        request: &CreateClassRequest,
    ) -> DatabaseResult<Option<ClassSession>>;
    async fn active_classes_for_coach(&self, coach: &str) -> DatabaseResult<Vec<ClassSession>>;
    async fn upcoming_classes(&self, from: DateTime<Utc>) -> DatabaseResult<Vec<ClassOccupancy>>;
    /// Flag the class cancelled and release its confirmed bookings atomically.
    /// `None` when the class is missing or already cancelled.
    async fn cancel_class_with_bookings(&self, class_id: i64) -> DatabaseResult<Option<u64>>;
}

#[allow(async_fn_in_trait)]
pub trait BookingRepo {
    async fn find_booking(&self, id: i64) -> DatabaseResult<Option<Booking>>;
    async fn count_confirmed(&self, class_id: i64) -> DatabaseResult<i64>;
    async fn find_confirmed_booking(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> DatabaseResult<Option<Booking>>;
    async fn confirmed_sessions(&self, user_id: i64) -> DatabaseResult<Vec<ClassSession>>;
    /// Capacity, duplicate and overlap checks plus the insert as one atomic unit
    async fn insert_booking_if_available(
        &self,
        user_id: i64,
        class_id: i64,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<GuardedInsert>;
    /// `None` when the booking is missing or no longer confirmed
    async fn transition_booking(
        &self,
        booking_id: i64,
        next: BookingStatus,
    ) -> DatabaseResult<Option<Booking>>;
    async fn mark_overdue_no_shows(&self, now: DateTime<Utc>) -> DatabaseResult<u64>;
    async fn bookings_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Booking>>;
    async fn all_bookings(&self) -> DatabaseResult<Vec<Booking>>;
    async fn count_no_shows_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<i64>;
}

#[allow(async_fn_in_trait)]
pub trait SubscriptionRepo {
    async fn find_subscription(&self, user_id: i64) -> DatabaseResult<Option<Subscription>>;
    async fn find_active_subscription(&self, user_id: i64)
        -> DatabaseResult<Option<Subscription>>;
    async fn insert_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> DatabaseResult<Subscription>;
}

/// Everything the services need from storage
pub trait GymStore: UserRepo + ClassRepo + BookingRepo + SubscriptionRepo {}

impl<T> GymStore for T where T: UserRepo + ClassRepo + BookingRepo + SubscriptionRepo {}
