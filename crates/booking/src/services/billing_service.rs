//! Monthly subscription billing.

use std::sync::Arc;

use tracing::info;

use crate::clock::Clock;
use crate::repositories::GymStore;
use crate::rules::{calendar_month, months_subscribed, BillingPolicy};
use crate::types::{BillingResult, BookingError, BookingResult};

/// Computes what a subscriber owes for the current month
pub struct BillingService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: BillingPolicy,
}

impl<S> BillingService<S>
where
    S: GymStore,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, policy: BillingPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Charge for the current UTC calendar month.
    ///
    /// No-shows are counted for classes that start within that month.
    pub async fn calculate_monthly_billing(&self, user_id: i64) -> BookingResult<BillingResult> {
        let now = self.clock.now();

        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BookingError::user_not_found(user_id))?;

        let subscription = self
            .store
            .find_active_subscription(user_id)
            .await?
            .ok_or_else(|| BookingError::subscription_not_found(user_id))?;

        let (month_start, month_end) = calendar_month(now)
            .ok_or_else(|| BookingError::internal(format!("no calendar month for {now}")))?;

        let no_shows = self
            .store
            .count_no_shows_between(user_id, month_start, month_end)
            .await?;
        let no_shows = u32::try_from(no_shows).unwrap_or(u32::MAX);

        let months = months_subscribed(subscription.start_date, now.date_naive());
        let charge = self
            .policy
            .monthly_charge(subscription.plan_type, months, no_shows);

        info!(
            user_id,
            plan = %subscription.plan_type,
            months,
            no_shows,
            amount = %charge.final_amount,
            "computed monthly billing"
        );

        Ok(BillingResult::from_breakdown(
            user_id,
            subscription.id,
            charge,
            now,
        ))
    }
}
