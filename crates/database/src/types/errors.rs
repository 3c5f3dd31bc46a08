//! Error types for the database layer

use thiserror::Error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database query error: {0}")]
    QueryError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Duplicate(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionError(err.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::InvalidData(err.to_string())
            }
            _ => DatabaseError::QueryError(err.to_string()),
        }
    }
}

impl DatabaseError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate(_))
    }
}
