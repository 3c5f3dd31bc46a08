//! Subscription pricing: plan table, loyalty discount and no-show penalty.
//!
//! All money is exact decimal. Every intermediate amount is rounded to the
//! cent, half away from zero, before it is combined.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use gymbook_config::PolicyConfig;
use gymbook_database::PlanType;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Monthly list price of a plan
pub fn base_price(plan: PlanType) -> Decimal {
    match plan {
        PlanType::Standard => dec!(39.99),
        PlanType::Premium => dec!(59.99),
        PlanType::Etudiant => dec!(29.99),
    }
}

/// Round to two decimals, half away from zero
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole calendar months between the subscription start and `today`.
///
/// Days are ignored. A start date in the future yields a negative count.
pub fn months_subscribed(start: NaiveDate, today: NaiveDate) -> i32 {
    (today.year() - start.year()) * 12 + (today.month() as i32 - start.month() as i32)
}

/// `[first instant of the month, first instant of the next month)` around `now`, in UTC
pub fn calendar_month(now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?;
    let next = if now.month() == 12 {
        NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(now.year(), now.month() + 1, 1)?
    };

    Some((
        first.and_hms_opt(0, 0, 0)?.and_utc(),
        next.and_hms_opt(0, 0, 0)?.and_utc(),
    ))
}

/// Tunable billing thresholds and rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPolicy {
    /// Penalty applies once the monthly no-show count is strictly above this
    pub penalty_threshold: u32,
    pub penalty_percent: Decimal,
    pub loyalty_min_months: i32,
    pub loyalty_percent: Decimal,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for BillingPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            penalty_threshold: config.no_show_penalty_threshold,
            penalty_percent: Decimal::from(config.no_show_penalty_percent),
            loyalty_min_months: config.loyalty_min_months,
            loyalty_percent: Decimal::from(config.loyalty_discount_percent),
        }
    }
}

/// Itemised monthly charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub plan_type: PlanType,
    pub base_price: Decimal,
    pub months_subscribed: i32,
    pub loyalty_discount_percent: Decimal,
    pub loyalty_discount: Decimal,
    pub monthly_no_shows: u32,
    pub no_show_penalty: Decimal,
    pub final_amount: Decimal,
}

impl BillingPolicy {
    pub fn loyalty_discount_percent(&self, months: i32) -> Decimal {
        if months >= self.loyalty_min_months {
            self.loyalty_percent
        } else {
            Decimal::ZERO
        }
    }

    pub fn no_show_penalty(&self, monthly_no_shows: u32, base: Decimal) -> Decimal {
        if monthly_no_shows > self.penalty_threshold {
            round2(base * self.penalty_percent / dec!(100))
        } else {
            Decimal::ZERO
        }
    }

    pub fn monthly_charge(
        &self,
        plan: PlanType,
        months: i32,
        monthly_no_shows: u32,
    ) -> ChargeBreakdown {
        let base = base_price(plan);
        let loyalty_percent = self.loyalty_discount_percent(months);
        let loyalty = round2(base * loyalty_percent / dec!(100));
        let penalty = self.no_show_penalty(monthly_no_shows, base);

        ChargeBreakdown {
            plan_type: plan,
            base_price: base,
            months_subscribed: months,
            loyalty_discount_percent: loyalty_percent,
            loyalty_discount: loyalty,
            monthly_no_shows,
            no_show_penalty: penalty,
            final_amount: round2(base - loyalty + penalty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_standard_plan_without_adjustments() {
        let charge = BillingPolicy::default().monthly_charge(PlanType::Standard, 3, 0);
        assert_eq!(charge.final_amount, dec!(39.99));
        assert_eq!(charge.loyalty_discount, Decimal::ZERO);
        assert_eq!(charge.no_show_penalty, Decimal::ZERO);
    }

    #[test]
    fn test_premium_with_loyalty_and_penalty() {
        let charge = BillingPolicy::default().monthly_charge(PlanType::Premium, 8, 7);
        assert_eq!(charge.loyalty_discount_percent, dec!(10));
        assert_eq!(charge.loyalty_discount, dec!(6.00));
        assert_eq!(charge.no_show_penalty, dec!(9.00));
        assert_eq!(charge.final_amount, dec!(62.99));
    }

    #[test]
    fn test_penalty_threshold_is_strict() {
        let policy = BillingPolicy::default();
        let base = base_price(PlanType::Standard);
        assert_eq!(policy.no_show_penalty(5, base), Decimal::ZERO);
        assert_eq!(policy.no_show_penalty(6, base), round2(base * dec!(0.15)));
        assert_eq!(policy.no_show_penalty(6, base), dec!(6.00));
    }

    #[test]
    fn test_loyalty_starts_at_six_months() {
        let policy = BillingPolicy::default();
        assert_eq!(policy.loyalty_discount_percent(5), Decimal::ZERO);
        assert_eq!(policy.loyalty_discount_percent(6), dec!(10));
        assert_eq!(policy.loyalty_discount_percent(-2), Decimal::ZERO);

        let charge = policy.monthly_charge(PlanType::Etudiant, 6, 0);
        assert_eq!(charge.loyalty_discount, dec!(3.00));
        assert_eq!(charge.final_amount, dec!(26.99));
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round2(dec!(8.9985)), dec!(9.00));
        assert_eq!(round2(dec!(0.125)), dec!(0.13));
        assert_eq!(round2(dec!(0.135)), dec!(0.14));
        assert_eq!(round2(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn test_months_ignore_days_and_may_be_negative() {
        assert_eq!(months_subscribed(date(2024, 1, 31), date(2024, 2, 1)), 1);
        assert_eq!(months_subscribed(date(2023, 11, 15), date(2024, 7, 14)), 8);
        assert_eq!(months_subscribed(date(2024, 5, 1), date(2024, 5, 31)), 0);
        assert_eq!(months_subscribed(date(2025, 3, 1), date(2024, 12, 1)), -3);
    }

    #[test]
    fn test_custom_policy_rates() {
        let config = PolicyConfig {
            no_show_penalty_threshold: 2,
            no_show_penalty_percent: 20,
            loyalty_min_months: 12,
            loyalty_discount_percent: 5,
            ..PolicyConfig::default()
        };
        let policy = BillingPolicy::from(&config);
        let charge = policy.monthly_charge(PlanType::Standard, 12, 3);
        assert_eq!(charge.loyalty_discount, dec!(2.00));
        assert_eq!(charge.no_show_penalty, dec!(8.00));
        assert_eq!(charge.final_amount, dec!(45.99));
    }

    #[test]
    fn test_calendar_month_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 12, 17, 22, 5, 0).unwrap();
        let (from, until) = calendar_month(now).unwrap();
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(until, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}
