//! Error types for the booking system.

use gymbook_database::DatabaseError;
use std::fmt;
use thiserror::Error;

/// Result type alias for booking operations
pub type BookingResult<T> = Result<T, BookingError>;

/// Business-rule violations reported as `BookingError::Conflict`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    ClassCancelled,
    ClassStarted,
    Full,
    DuplicateBooking,
    TimeOverlap,
    AlreadyCancelled,
    CoachUnavailable,
    EmailTaken,
    SubscriptionExists,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::ClassCancelled => "class is cancelled",
            ConflictKind::ClassStarted => "class has already started",
            ConflictKind::Full => "class is full",
            ConflictKind::DuplicateBooking => "user already holds a booking for this class",
            ConflictKind::TimeOverlap => "booking overlaps another confirmed booking",
            ConflictKind::AlreadyCancelled => "class was already cancelled",
            ConflictKind::CoachUnavailable => "coach already leads an overlapping class",
            ConflictKind::EmailTaken => "email is already registered",
            ConflictKind::SubscriptionExists => "user already has a subscription",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the booking system
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Conflict: {0}")]
    Conflict(ConflictKind),

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BookingError {
    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound { entity: "user", id }
    }

    pub fn class_not_found(id: i64) -> Self {
        Self::NotFound { entity: "class", id }
    }

    pub fn booking_not_found(id: i64) -> Self {
        Self::NotFound { entity: "booking", id }
    }

    /// No active subscription for the given user
    pub fn subscription_not_found(user_id: i64) -> Self {
        Self::NotFound {
            entity: "subscription",
            id: user_id,
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// The conflict kind, if this is a rule violation
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Conflict(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<ConflictKind> for BookingError {
    fn from(kind: ConflictKind) -> Self {
        Self::Conflict(kind)
    }
}

impl From<DatabaseError> for BookingError {
    fn from(err: DatabaseError) -> Self {
        Self::Database(err.to_string())
    }
}
