//! Business logic services.
//!
//! Every service is generic over a [`GymStore`](crate::repositories::GymStore)
//! and reads time from an injected [`Clock`](crate::clock::Clock).

pub mod billing_service;
pub mod booking_service;
pub mod class_service;
pub mod stats_service;
pub mod subscription_service;
pub mod sweeper;
pub mod user_service;

#[cfg(test)]
pub(crate) mod fixtures;

pub use billing_service::BillingService;
pub use booking_service::BookingService;
pub use class_service::ClassService;
pub use stats_service::StatsService;
pub use subscription_service::SubscriptionService;
pub use sweeper::NoShowSweeper;
pub use user_service::UserService;
