//! Domain entities for the database layer

pub mod booking;
pub mod class_session;
pub mod subscription;
pub mod user;

pub use booking::{Booking, BookingStatus, GuardedInsert};
pub use class_session::{ClassOccupancy, ClassSession, CreateClassRequest};
pub use subscription::{CreateSubscriptionRequest, PlanType, Subscription};
pub use user::{CreateUserRequest, User, UserRole};

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{DatabaseError, DatabaseResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Instants are persisted as Unix milliseconds so SQL comparisons stay numeric.
pub(crate) fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DatabaseResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DatabaseError::InvalidData(format!("timestamp out of range: {millis}")))
}

pub(crate) fn to_date_text(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn from_date_text(text: &str) -> DatabaseResult<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|e| DatabaseError::InvalidData(format!("invalid date '{text}': {e}")))
}
