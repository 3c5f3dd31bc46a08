//! Shared setup for service tests

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use gymbook_database::{
    ClassSession, CreateClassRequest, CreateSubscriptionRequest, CreateUserRequest, PlanType,
    Subscription, User, UserRole,
};

use crate::clock::{Clock, FixedClock};
use crate::repositories::{ClassRepo, MemoryStore, SubscriptionRepo, UserRepo};
use crate::rules::{BillingPolicy, CancellationPolicy};
use crate::services::{
    BillingService, BookingService, ClassService, NoShowSweeper, StatsService,
    SubscriptionService, UserService,
};

pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::at(Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(FixedClock::new(now)),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    async fn user(&self, email: &str, role: UserRole) -> User {
        self.store
            .insert_user(
                &CreateUserRequest {
                    firstname: "Test".into(),
                    lastname: "Member".into(),
                    email: email.into(),
                    role,
                },
                self.now(),
            )
            .await
            .unwrap()
    }

    pub async fn member(&self, email: &str) -> User {
        self.user(email, UserRole::User).await
    }

    pub async fn admin(&self, email: &str) -> User {
        self.user(email, UserRole::Admin).await
    }

    /// Insert a class directly, bypassing scheduling validation
    pub async fn class_in(&self, starts_in: Duration, minutes: i64, capacity: i64) -> ClassSession {
        self.class_with_coach("Coach", starts_in, minutes, capacity).await
    }

    pub async fn class_with_coach(
        &self,
        coach: &str,
        starts_in: Duration,
        minutes: i64,
        capacity: i64,
    ) -> ClassSession {
        self.store
            .insert_class(&CreateClassRequest {
                title: "Circuit".into(),
                coach: coach.into(),
                starts_at: self.now() + starts_in,
                duration_minutes: minutes,
                capacity,
            })
            .await
            .unwrap()
    }

    pub async fn subscription(&self, user_id: i64, plan: PlanType, start: NaiveDate) -> Subscription {
        self.store
            .insert_subscription(&CreateSubscriptionRequest {
                user_id,
                plan_type: plan,
                start_date: start,
                end_date: start + Duration::days(365),
                auto_renew: false,
            })
            .await
            .unwrap()
    }

    pub fn bookings(&self) -> BookingService<MemoryStore> {
        BookingService::new(self.store.clone(), self.clock(), CancellationPolicy::default())
    }

    pub fn classes(&self) -> ClassService<MemoryStore> {
        ClassService::new(self.store.clone(), self.clock())
    }

    pub fn users(&self) -> UserService<MemoryStore> {
        UserService::new(self.store.clone(), self.clock())
    }

    pub fn subscriptions(&self) -> SubscriptionService<MemoryStore> {
        SubscriptionService::new(self.store.clone())
    }

    pub fn billing(&self) -> BillingService<MemoryStore> {
        BillingService::new(self.store.clone(), self.clock(), BillingPolicy::default())
    }

    pub fn sweeper(&self) -> NoShowSweeper<MemoryStore> {
        NoShowSweeper::new(self.store.clone(), self.clock())
    }

    pub fn stats(&self) -> StatsService<MemoryStore> {
        StatsService::new(self.store.clone())
    }
}
