//! In-memory store for exercising services without a database

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gymbook_database::{
    Booking, BookingStatus, ClassOccupancy, ClassSession, CreateClassRequest,
    CreateSubscriptionRequest, CreateUserRequest, DatabaseError, DatabaseResult, GuardedInsert,
    Subscription, User,
};
use tokio::sync::RwLock;

use super::{BookingRepo, ClassRepo, SubscriptionRepo, UserRepo};
use crate::rules::{overlaps, sessions_overlap};

#[derive(Default)]
struct State {
    users: HashMap<i64, User>,
    classes: HashMap<i64, ClassSession>,
    bookings: HashMap<i64, Booking>,
    subscriptions: HashMap<i64, Subscription>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn confirmed_in(&self, class_id: i64) -> i64 {
        self.bookings
            .values()
            .filter(|b| b.class_id == class_id && b.is_active())
            .count() as i64
    }

    fn push_class(&mut self, request: &CreateClassRequest) -> ClassSession {
        let session = ClassSession {
            id: self.next_id(),
            title: request.title.trim().to_string(),
            coach: request.coach.trim().to_string(),
            starts_at: request.starts_at,
            duration_minutes: request.duration_minutes,
            capacity: request.capacity,
            is_cancelled: false,
        };
        self.classes.insert(session.id, session.clone());
        session
    }

    fn require_user(&self, user_id: i64) -> DatabaseResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(DatabaseError::QueryError(
                "FOREIGN KEY constraint failed".to_string(),
            ))
        }
    }
}

/// Mock store with the same observable semantics as the SQLite one.
///
/// A single lock guards all collections so multi-step writes are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the `active` flag of a member's subscription
    pub async fn set_subscription_active(&self, user_id: i64, active: bool) -> bool {
        let mut state = self.state.write().await;
        match state.subscriptions.get_mut(&user_id) {
            Some(subscription) => {
                subscription.active = active;
                true
            }
            None => false,
        }
    }
}

impl UserRepo for MemoryStore {
    async fn find_user(&self, id: i64) -> DatabaseResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let email = email.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert_user(
        &self,
        request: &CreateUserRequest,
        joined_at: DateTime<Utc>,
    ) -> DatabaseResult<User> {
        let email = request.email.trim().to_lowercase();
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == email) {
            return Err(DatabaseError::Duplicate(format!(
                "email {email} already registered"
            )));
        }

        let user = User {
            id: state.next_id(),
            firstname: request.firstname.trim().to_string(),
            lastname: request.lastname.trim().to_string(),
            email,
            role: request.role,
            date_joined: joined_at,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> DatabaseResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| (u.date_joined, u.id));
        Ok(users)
    }
}

impl ClassRepo for MemoryStore {
    async fn find_class(&self, id: i64) -> DatabaseResult<Option<ClassSession>> {
        let state = self.state.read().await;
        Ok(state.classes.get(&id).cloned())
    }

    async fn insert_class(&self, request: &CreateClassRequest) -> DatabaseResult<ClassSession> {
        let mut state = self.state.write().await;
        Ok(state.push_class(request))
    }

    async fn insert_class_if_coach_free(
        &self,
        request: &CreateClassRequest,
    ) -> DatabaseResult<Option<ClassSession>> {
        let coach = request.coach.trim().to_lowercase();
        let duration = Duration::minutes(request.duration_minutes);
        let mut state = self.state.write().await;

        let busy = state.classes.values().any(|c| {
            !c.is_cancelled
                && c.coach.to_lowercase() == coach
                && overlaps(c.starts_at, c.duration(), request.starts_at, duration)
        });
        if busy {
            return Ok(None);
        }

        Ok(Some(state.push_class(request)))
    }

    async fn active_classes_for_coach(&self, coach: &str) -> DatabaseResult<Vec<ClassSession>> {
        let coach = coach.trim().to_lowercase();
        let state = self.state.read().await;
        let mut sessions: Vec<ClassSession> = state
            .classes
            .values()
            .filter(|c| !c.is_cancelled && c.coach.to_lowercase() == coach)
            .cloned()
            .collect();
        sessions.sort_by_key(|c| (c.starts_at, c.id));
        Ok(sessions)
    }

    async fn upcoming_classes(&self, from: DateTime<Utc>) -> DatabaseResult<Vec<ClassOccupancy>> {
        let state = self.state.read().await;
        let mut upcoming: Vec<ClassOccupancy> = state
            .classes
            .values()
            .filter(|c| !c.is_cancelled && c.starts_at > from)
            .map(|c| ClassOccupancy {
                session: c.clone(),
                confirmed_count: state.confirmed_in(c.id),
            })
            .collect();
        upcoming.sort_by_key(|o| (o.session.starts_at, o.session.id));
        Ok(upcoming)
    }

    async fn cancel_class_with_bookings(&self, class_id: i64) -> DatabaseResult<Option<u64>> {
        let mut state = self.state.write().await;

        match state.classes.get_mut(&class_id) {
            Some(class) if !class.is_cancelled => class.is_cancelled = true,
            _ => return Ok(None),
        }

        let mut moved = 0;
        for booking in state.bookings.values_mut() {
            if booking.class_id == class_id && booking.is_active() {
                booking.status = BookingStatus::CancelledByClass;
                moved += 1;
            }
        }

        Ok(Some(moved))
    }
}

impl BookingRepo for MemoryStore {
    async fn find_booking(&self, id: i64) -> DatabaseResult<Option<Booking>> {
        let state = self.state.read().await;
        Ok(state.bookings.get(&id).cloned())
    }

    async fn count_confirmed(&self, class_id: i64) -> DatabaseResult<i64> {
        let state = self.state.read().await;
        Ok(state.confirmed_in(class_id))
    }

    async fn find_confirmed_booking(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> DatabaseResult<Option<Booking>> {
        let state = self.state.read().await;
        Ok(state
            .bookings
            .values()
            .find(|b| b.user_id == user_id && b.class_id == class_id && b.is_active())
            .cloned())
    }

    async fn confirmed_sessions(&self, user_id: i64) -> DatabaseResult<Vec<ClassSession>> {
        let state = self.state.read().await;
        let mut sessions: Vec<ClassSession> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id && b.is_active())
            .filter_map(|b| state.classes.get(&b.class_id).cloned())
            .collect();
        sessions.sort_by_key(|c| (c.starts_at, c.id));
        Ok(sessions)
    }

    async fn insert_booking_if_available(
        &self,
        user_id: i64,
        class_id: i64,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<GuardedInsert> {
        let mut state = self.state.write().await;

        let class = match state.classes.get(&class_id) {
            Some(class) if !class.is_cancelled => class.clone(),
            _ => return Ok(GuardedInsert::ClassClosed),
        };

        if state.confirmed_in(class_id) >= class.capacity {
            return Ok(GuardedInsert::Full);
        }

        let held = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id && b.is_active());

        let mut overlapping = false;
        for booking in held {
            if booking.class_id == class_id {
                return Ok(GuardedInsert::Duplicate);
            }
            overlapping |= state
                .classes
                .get(&booking.class_id)
                .is_some_and(|session| sessions_overlap(session, &class));
        }
        if overlapping {
            return Ok(GuardedInsert::Overlap);
        }

        state.require_user(user_id)?;

        let booking = Booking {
            id: state.next_id(),
            user_id,
            class_id,
            status: BookingStatus::Confirmed,
            created_at,
        };
        state.bookings.insert(booking.id, booking.clone());
        Ok(GuardedInsert::Inserted(booking))
    }

    async fn transition_booking(
        &self,
        booking_id: i64,
        next: BookingStatus,
    ) -> DatabaseResult<Option<Booking>> {
        if !BookingStatus::Confirmed.can_transition_to(next) {
            return Err(DatabaseError::InvalidData(format!(
                "illegal booking transition confirmed -> {next}"
            )));
        }

        let mut state = self.state.write().await;
        match state.bookings.get_mut(&booking_id) {
            Some(booking) if booking.status == BookingStatus::Confirmed => {
                booking.status = next;
                Ok(Some(booking.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_overdue_no_shows(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let mut state = self.state.write().await;
        let State {
            classes, bookings, ..
        } = &mut *state;

        let mut swept = 0;
        for booking in bookings.values_mut() {
            let started = classes
                .get(&booking.class_id)
                .is_some_and(|c| c.starts_at < now);
            if booking.is_active() && started {
                booking.status = BookingStatus::NoShow;
                swept += 1;
            }
        }

        Ok(swept)
    }

    async fn bookings_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }

    async fn all_bookings(&self) -> DatabaseResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state.bookings.values().cloned().collect();
        bookings.sort_by_key(|b| b.id);
        Ok(bookings)
    }

    async fn count_no_shows_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        let state = self.state.read().await;
        let count = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id && b.status.is_penalized())
            .filter(|b| {
                state
                    .classes
                    .get(&b.class_id)
                    .is_some_and(|c| c.starts_at >= from && c.starts_at < until)
            })
            .count();
        Ok(count as i64)
    }
}

impl SubscriptionRepo for MemoryStore {
    async fn find_subscription(&self, user_id: i64) -> DatabaseResult<Option<Subscription>> {
        let state = self.state.read().await;
        Ok(state.subscriptions.get(&user_id).cloned())
    }

    async fn find_active_subscription(
        &self,
        user_id: i64,
    ) -> DatabaseResult<Option<Subscription>> {
        let state = self.state.read().await;
        Ok(state
            .subscriptions
            .get(&user_id)
            .filter(|s| s.active)
            .cloned())
    }

    async fn insert_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> DatabaseResult<Subscription> {
        let mut state = self.state.write().await;
        state.require_user(request.user_id)?;

        if state.subscriptions.contains_key(&request.user_id) {
            return Err(DatabaseError::Duplicate(format!(
                "user {} already has a subscription",
                request.user_id
            )));
        }

        let subscription = Subscription {
            id: state.next_id(),
            user_id: request.user_id,
            plan_type: request.plan_type,
            start_date: request.start_date,
            end_date: request.end_date,
            active: true,
            auto_renew: request.auto_renew,
        };
        state
            .subscriptions
            .insert(request.user_id, subscription.clone());
        Ok(subscription)
    }
}
