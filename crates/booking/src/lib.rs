//! # Gymbook Booking Crate
//!
//! Business rules and services for the gym-class booking system: who may
//! book which class, what a cancellation turns into, how overdue bookings
//! lapse and what a subscriber owes each month.
//!
//! ## Architecture
//!
//! - **Clock**: injected time source
//! - **Rules**: pure capacity, overlap, cancellation, pricing and stats functions
//! - **Repositories**: storage traits with SQLite and in-memory implementations
//! - **Services**: orchestration over a store and a clock
//! - **Types**: errors, requests and responses
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gymbook_booking::{BookingService, CancellationPolicy, SqliteStore, SystemClock};
//!
//! let store = Arc::new(SqliteStore::new(pool));
//! let bookings = BookingService::new(store, Arc::new(SystemClock), CancellationPolicy::default());
//! let booking = bookings.create_booking(user_id, class_id).await?;
//! ```

pub mod clock;
pub mod repositories;
pub mod rules;
pub mod services;
pub mod types;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use repositories::{
    BookingRepo, ClassRepo, GymStore, MemoryStore, SqliteStore, SubscriptionRepo, UserRepo,
};
pub use rules::{BillingPolicy, CancellationPolicy, ChargeBreakdown};
pub use services::{
    BillingService, BookingService, ClassService, NoShowSweeper, StatsService,
    SubscriptionService, UserService,
};
pub use types::{
    BillingResult, BookingError, BookingResult, ClassCancellation, ConflictKind,
    NewSubscription, StatsResult, UpcomingClass,
};
