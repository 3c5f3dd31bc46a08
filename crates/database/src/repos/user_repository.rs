//! User repository for database operations.

use crate::entities::{from_millis, to_millis, CreateUserRequest, User, UserRole};
use crate::types::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

const USER_COLUMNS: &str = "id, firstname, lastname, email, role, date_joined";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Find user by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user).transpose()
    }

    /// Create new user; the email is stored lowercased
    pub async fn create(
        &self,
        request: &CreateUserRequest,
        joined_at: DateTime<Utc>,
    ) -> DatabaseResult<User> {
        let email = request.email.trim().to_lowercase();

        let result = sqlx::query(
            "INSERT INTO users (firstname, lastname, email, role, date_joined) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(request.firstname.trim())
        .bind(request.lastname.trim())
        .bind(&email)
        .bind(request.role.as_str())
        .bind(to_millis(joined_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Duplicate(_) => {
                DatabaseError::Duplicate(format!("email {email} already registered"))
            }
            other => other,
        })?;

        let user_id = result.last_insert_rowid();
        info!(user_id, role = %request.role, "created user");

        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {user_id}")))
    }

    /// List all users ordered by join date
    pub async fn list(&self) -> DatabaseResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY date_joined ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_user).collect()
    }
}

fn map_user(row: &SqliteRow) -> DatabaseResult<User> {
    let role: String = row.try_get("role")?;

    Ok(User {
        id: row.try_get("id")?,
        firstname: row.try_get("firstname")?,
        lastname: row.try_get("lastname")?,
        email: row.try_get("email")?,
        role: UserRole::from(role.as_str()),
        date_joined: from_millis(row.try_get("date_joined")?)?,
    })
}
