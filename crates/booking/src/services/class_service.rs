//! Class scheduling and lookup.

use std::sync::Arc;

use chrono::Duration;
use gymbook_database::{ClassSession, CreateClassRequest};
use tracing::{info, warn};

use crate::clock::Clock;
use crate::repositories::GymStore;
use crate::rules::overlaps;
use crate::types::{BookingError, BookingResult, ConflictKind, UpcomingClass};
use crate::utils::{PermissionChecker, Validator};

pub struct ClassService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> ClassService<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Schedule a class session. Admin only; a coach cannot lead two
    /// overlapping sessions.
    pub async fn schedule_class(
        &self,
        requesting_user_id: i64,
        request: CreateClassRequest,
    ) -> BookingResult<ClassSession> {
        let requester = self
            .store
            .find_user(requesting_user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(requesting_user_id))?;

        if let Err(e) = PermissionChecker::require_admin(&requester) {
            warn!(requesting_user_id, "non-admin attempted to schedule a class");
            return Err(e);
        }

        Validator::class_request(&request, self.clock.now())?;

        let duration = Duration::minutes(request.duration_minutes);
        let coach_sessions = self.store.active_classes_for_coach(&request.coach).await?;
        if let Some(clash) = coach_sessions
            .iter()
            .find(|s| overlaps(s.starts_at, s.duration(), request.starts_at, duration))
        {
            info!(coach = %request.coach, clashing_class_id = clash.id, "coach unavailable");
            return Err(ConflictKind::CoachUnavailable.into());
        }

        let Some(session) = self.store.insert_class_if_coach_free(&request).await? else {
            info!(coach = %request.coach, "coach booked concurrently");
            return Err(ConflictKind::CoachUnavailable.into());
        };
        info!(
            class_id = session.id,
            coach = %session.coach,
            starts_at = %session.starts_at,
            admin_id = requesting_user_id,
            "class scheduled"
        );

        Ok(session)
    }

    pub async fn get_class(&self, class_id: i64) -> BookingResult<ClassSession> {
        self.store
            .find_class(class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(class_id))
    }

    /// Future, non-cancelled sessions with their remaining places
    pub async fn upcoming_classes(&self) -> BookingResult<Vec<UpcomingClass>> {
        let upcoming = self.store.upcoming_classes(self.clock.now()).await?;

        Ok(upcoming
            .into_iter()
            .map(|occupancy| UpcomingClass {
                available_spots: occupancy.available_spots(),
                session: occupancy.session,
            })
            .collect())
    }
}
