use chrono::{DateTime, Utc};
use gymbook_database::{
    Booking, BookingRepository, BookingStatus, ClassOccupancy, ClassRepository, ClassSession,
    CreateClassRequest, CreateSubscriptionRequest, CreateUserRequest, DatabaseResult,
    GuardedInsert, Subscription, SubscriptionRepository, User, UserRepository,
};
use sqlx::SqlitePool;

use super::{BookingRepo, ClassRepo, SubscriptionRepo, UserRepo};

/// [`GymStore`](super::GymStore) backed by the sqlx repositories
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    users: UserRepository,
    classes: ClassRepository,
    bookings: BookingRepository,
    subscriptions: SubscriptionRepository,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            classes: ClassRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            subscriptions: SubscriptionRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl UserRepo for SqliteStore {
    async fn find_user(&self, id: i64) -> DatabaseResult<Option<User>> {
        self.users.find_by_id(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        self.users.find_by_email(email).await
    }

    async fn insert_user(
        &self,
        request: &CreateUserRequest,
        joined_at: DateTime<Utc>,
    ) -> DatabaseResult<User> {
        self.users.create(request, joined_at).await
    }

    async fn list_users(&self) -> DatabaseResult<Vec<User>> {
        self.users.list().await
    }
}

impl ClassRepo for SqliteStore {
    async fn find_class(&self, id: i64) -> DatabaseResult<Option<ClassSession>> {
        self.classes.find_by_id(id).await
    }

    async fn insert_class(&self, request: &CreateClassRequest) -> DatabaseResult<ClassSession> {
        self.classes.create(request).await
    }

    async fn insert_class_if_coach_free(
        &self,
        request: &CreateClassRequest,
    ) -> DatabaseResult<Option<ClassSession>> {
        self.classes.create_if_coach_free(request).await
    }

    async fn active_classes_for_coach(&self, coach: &str) -> DatabaseResult<Vec<ClassSession>> {
        self.classes.find_active_by_coach(coach).await
    }

    async fn upcoming_classes(&self, from: DateTime<Utc>) -> DatabaseResult<Vec<ClassOccupancy>> {
        self.classes.list_upcoming(from).await
    }

    async fn cancel_class_with_bookings(&self, class_id: i64) -> DatabaseResult<Option<u64>> {
        self.classes.cancel_with_bookings(class_id).await
    }
}

impl BookingRepo for SqliteStore {
    async fn find_booking(&self, id: i64) -> DatabaseResult<Option<Booking>> {
        self.bookings.find_by_id(id).await
    }

    async fn count_confirmed(&self, class_id: i64) -> DatabaseResult<i64> {
        self.bookings.count_confirmed(class_id).await
    }

    async fn find_confirmed_booking(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> DatabaseResult<Option<Booking>> {
        self.bookings.find_confirmed(user_id, class_id).await
    }

    async fn confirmed_sessions(&self, user_id: i64) -> DatabaseResult<Vec<ClassSession>> {
        self.bookings.confirmed_sessions_for_user(user_id).await
    }

    async fn insert_booking_if_available(
        &self,
        user_id: i64,
        class_id: i64,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<GuardedInsert> {
        self.bookings
            .insert_if_available(user_id, class_id, created_at)
            .await
    }

    async fn transition_booking(
        &self,
        booking_id: i64,
        next: BookingStatus,
    ) -> DatabaseResult<Option<Booking>> {
        self.bookings.transition_from_confirmed(booking_id, next).await
    }

    async fn mark_overdue_no_shows(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        self.bookings.mark_overdue_as_no_show(now).await
    }

    async fn bookings_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Booking>> {
        self.bookings.list_for_user(user_id).await
    }

    async fn all_bookings(&self) -> DatabaseResult<Vec<Booking>> {
        self.bookings.list_all().await
    }

    async fn count_no_shows_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        self.bookings
            .count_no_shows_between(user_id, from, until)
            .await
    }
}

impl SubscriptionRepo for SqliteStore {
    async fn find_subscription(&self, user_id: i64) -> DatabaseResult<Option<Subscription>> {
        self.subscriptions.find_by_user(user_id).await
    }

    async fn find_active_subscription(
        &self,
        user_id: i64,
    ) -> DatabaseResult<Option<Subscription>> {
        self.subscriptions.find_active_by_user(user_id).await
    }

    async fn insert_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> DatabaseResult<Subscription> {
        self.subscriptions.create(request).await
    }
}
