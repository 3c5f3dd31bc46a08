//! Subscription service.

use std::sync::Arc;

use gymbook_database::{CreateSubscriptionRequest, DatabaseError, Subscription};
use tracing::info;

use crate::repositories::GymStore;
use crate::types::{BookingError, BookingResult, ConflictKind, NewSubscription};
use crate::utils::Validator;

pub struct SubscriptionService<S> {
    store: Arc<S>,
}

impl<S> SubscriptionService<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open the member's subscription; each member holds at most one
    pub async fn subscribe(
        &self,
        user_id: i64,
        request: NewSubscription,
    ) -> BookingResult<Subscription> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(user_id))?;

        Validator::subscription(&request)?;

        if self.store.find_subscription(user_id).await?.is_some() {
            return Err(ConflictKind::SubscriptionExists.into());
        }

        let create = CreateSubscriptionRequest {
            user_id,
            plan_type: request.plan_type,
            start_date: request.start_date,
            end_date: request.end_date,
            auto_renew: request.auto_renew,
        };

        let subscription = match self.store.insert_subscription(&create).await {
            Ok(subscription) => subscription,
            Err(DatabaseError::Duplicate(_)) => {
                return Err(ConflictKind::SubscriptionExists.into())
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            subscription_id = subscription.id,
            user_id,
            plan = %subscription.plan_type,
            "subscription opened"
        );
        Ok(subscription)
    }

    pub async fn active_subscription(&self, user_id: i64) -> BookingResult<Subscription> {
        self.store
            .find_active_subscription(user_id)
            .await?
            .ok_or_else(|| BookingError::subscription_not_found(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::Fixture;
    use chrono::NaiveDate;
    use gymbook_database::PlanType;

    fn plan(start: (i32, u32, u32), end: (i32, u32, u32)) -> NewSubscription {
        NewSubscription {
            plan_type: PlanType::Premium,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            auto_renew: true,
        }
    }

    #[tokio::test]
    async fn test_subscribe_once() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let service = fx.subscriptions();

        let created = service
            .subscribe(member.id, plan((2025, 1, 1), (2025, 12, 31)))
            .await
            .unwrap();
        assert!(created.active);
        assert_eq!(created.plan_type, PlanType::Premium);
        assert_eq!(service.active_subscription(member.id).await.unwrap(), created);

        let err = service
            .subscribe(member.id, plan((2025, 2, 1), (2025, 12, 31)))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_kind(), Some(ConflictKind::SubscriptionExists));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_bad_input() {
        let fx = Fixture::new();
        let member = fx.member("ana@gym.fr").await;
        let service = fx.subscriptions();

        let err = service
            .subscribe(member.id, plan((2025, 6, 1), (2025, 5, 31)))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = service
            .subscribe(999, plan((2025, 1, 1), (2025, 12, 31)))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        assert!(service.active_subscription(member.id).await.unwrap_err().is_not_found());
    }
}
