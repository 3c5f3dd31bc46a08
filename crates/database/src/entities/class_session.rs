//! Class session entity definitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled group class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSession {
    pub id: i64,
    pub title: String,
    pub coach: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub capacity: i64,
    /// Terminal once set
    pub is_cancelled: bool,
}

impl ClassSession {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes)
    }

    /// Exclusive end of the session interval
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + self.duration()
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }
}

/// Request for scheduling a new class session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassRequest {
    pub title: String,
    pub coach: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub capacity: i64,
}

/// A class session together with its current confirmed head count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassOccupancy {
    pub session: ClassSession,
    pub confirmed_count: i64,
}

impl ClassOccupancy {
    pub fn available_spots(&self) -> i64 {
        (self.session.capacity - self.confirmed_count).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(duration_minutes: i64) -> ClassSession {
        ClassSession {
            id: 1,
            title: "Spin".to_string(),
            coach: "Marie".to_string(),
            starts_at: Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap(),
            duration_minutes,
            capacity: 12,
            is_cancelled: false,
        }
    }

    #[test]
    fn end_is_start_plus_duration() {
        let class = session(45);
        assert_eq!(
            class.ends_at(),
            Utc.with_ymd_and_hms(2025, 3, 10, 18, 45, 0).unwrap()
        );
    }

    #[test]
    fn started_includes_the_start_instant() {
        let class = session(60);
        assert!(class.has_started(class.starts_at));
        assert!(!class.has_started(class.starts_at - Duration::seconds(1)));
    }

    #[test]
    fn available_spots_never_negative() {
        let occupancy = ClassOccupancy {
            session: session(60),
            confirmed_count: 15,
        };
        assert_eq!(occupancy.available_spots(), 0);
    }
}
