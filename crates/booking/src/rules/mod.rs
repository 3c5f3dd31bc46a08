//! Pure booking and billing rules.
//!
//! Nothing in here touches storage or reads the clock; services feed the
//! current instant and persisted state in explicitly.

pub mod capacity;
pub mod conflict;
pub mod lifecycle;
pub mod pricing;
pub mod stats;

pub use capacity::has_capacity;
pub use conflict::{overlaps, sessions_overlap};
pub use lifecycle::{classify_cancellation, CancellationPolicy};
pub use pricing::{calendar_month, months_subscribed, round2, BillingPolicy, ChargeBreakdown};
pub use stats::aggregate;
