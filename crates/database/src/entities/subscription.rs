//! Subscription entity definitions

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A member's monthly plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
    pub auto_renew: bool,
}

/// Request for opening a subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub user_id: i64,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub auto_renew: bool,
}

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanType {
    Standard,
    Premium,
    Etudiant,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Standard => "standard",
            PlanType::Premium => "premium",
            PlanType::Etudiant => "etudiant",
        }
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(PlanType::Standard),
            "premium" => Ok(PlanType::Premium),
            "etudiant" => Ok(PlanType::Etudiant),
            other => Err(format!("unknown plan type '{other}'")),
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
