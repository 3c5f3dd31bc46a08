//! Booking entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A member's reservation of a place in a class session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub class_id: i64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether the booking still holds a capacity slot
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// Booking lifecycle state.
///
/// A booking starts `Confirmed` and moves exactly once into one of the
/// terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    NoShow,
    CancelledByClass,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
        BookingStatus::NoShow,
        BookingStatus::CancelledByClass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no_show",
            BookingStatus::CancelledByClass => "cancelled_by_class",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Only `Confirmed -> terminal` transitions exist.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        self.is_active() && next.is_terminal()
    }

    /// Statuses that count against the member in penalty calculations
    pub fn is_penalized(&self) -> bool {
        matches!(self, BookingStatus::NoShow)
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no_show" => Ok(BookingStatus::NoShow),
            "cancelled_by_class" => Ok(BookingStatus::CancelledByClass),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an atomic, capacity and overlap checked booking insert
#[derive(Debug, Clone, PartialEq)]
pub enum GuardedInsert {
    Inserted(Booking),
    /// Every slot is held by a confirmed booking
    Full,
    /// The class was cancelled or removed before the insert landed
    ClassClosed,
    /// The member already holds a confirmed booking for the class
    Duplicate,
    /// The member holds a confirmed booking for a session that overlaps this one
    Overlap,
}
