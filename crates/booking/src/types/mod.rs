//! Shared types for the booking system.

pub mod errors;
pub mod requests;
pub mod responses;

pub use errors::{BookingError, BookingResult, ConflictKind};
pub use requests::NewSubscription;
pub use responses::{BillingResult, ClassCancellation, StatsResult, UpcomingClass};
