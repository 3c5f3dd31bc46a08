//! Gymbook Database Crate
//!
//! This crate provides database functionality for the gymbook backend,
//! including connection management, migrations, and repository implementations
//! for users, class sessions, bookings and subscriptions.

use gymbook_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{BookingRepository, ClassRepository, SubscriptionRepository, UserRepository};

pub use entities::{
    Booking, BookingStatus, ClassOccupancy, ClassSession, CreateClassRequest,
    CreateSubscriptionRequest, CreateUserRequest, GuardedInsert, PlanType, Subscription, User,
    UserRole,
};

pub use types::{DatabaseError, DatabaseResult};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}
