//! Response types returned by the booking services.

use chrono::{DateTime, Utc};
use gymbook_database::{ClassSession, PlanType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::ChargeBreakdown;

/// Monthly billing statement for one subscriber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingResult {
    pub user_id: i64,
    pub subscription_id: i64,
    pub plan_type: PlanType,
    pub months_subscribed: i32,
    pub monthly_no_shows: u32,
    pub base_price: Decimal,
    pub loyalty_discount_percent: Decimal,
    pub loyalty_discount: Decimal,
    pub no_show_penalty: Decimal,
    pub final_amount: Decimal,
    pub billed_at: DateTime<Utc>,
}

impl BillingResult {
    pub fn from_breakdown(
        user_id: i64,
        subscription_id: i64,
        charge: ChargeBreakdown,
        billed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            subscription_id,
            plan_type: charge.plan_type,
            months_subscribed: charge.months_subscribed,
            monthly_no_shows: charge.monthly_no_shows,
            base_price: charge.base_price,
            loyalty_discount_percent: charge.loyalty_discount_percent,
            loyalty_discount: charge.loyalty_discount,
            no_show_penalty: charge.no_show_penalty,
            final_amount: charge.final_amount,
            billed_at,
        }
    }
}

/// Booking rollup for a member or the whole gym
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResult {
    pub total_bookings: u64,
    pub confirmed: u64,
    pub cancelled: u64,
    pub no_shows: u64,
    pub cancelled_by_class: u64,
    /// Percentage of all bookings that ended as no-shows
    pub no_show_rate: f64,
}

/// Outcome of an admin class cancellation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCancellation {
    pub class_id: i64,
    pub cancelled_count: u64,
}

/// A bookable session and how many places remain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingClass {
    #[serde(flatten)]
    pub session: ClassSession,
    pub available_spots: i64,
}
