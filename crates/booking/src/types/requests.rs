//! Request types accepted by the booking services.

use chrono::NaiveDate;
use gymbook_database::PlanType;
use serde::{Deserialize, Serialize};

/// Plan details for a new subscription; the owner is passed separately
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubscription {
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub auto_renew: bool,
}
