//! Database repository implementations

pub mod booking_repository;
pub mod class_repository;
pub mod subscription_repository;
pub mod user_repository;

pub use booking_repository::BookingRepository;
pub use class_repository::ClassRepository;
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::UserRepository;
