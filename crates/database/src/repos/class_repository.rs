//! Repository for class session data access operations.

use crate::entities::{
    from_millis, to_millis, BookingStatus, ClassOccupancy, ClassSession, CreateClassRequest,
};
use crate::types::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

const CLASS_COLUMNS: &str =
    "c.id, c.title, c.coach, c.starts_at, c.duration_minutes, c.capacity, c.is_cancelled";

/// Repository for class session database operations
#[derive(Clone)]
pub struct ClassRepository {
    pool: SqlitePool,
}

impl ClassRepository {
    /// Create a new class repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a class session by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<ClassSession>> {
        let row = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS} FROM class_sessions c WHERE c.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_class).transpose()
    }

    /// Schedule a new class session
    pub async fn create(&self, request: &CreateClassRequest) -> DatabaseResult<ClassSession> {
        let result = sqlx::query(
            "INSERT INTO class_sessions (title, coach, starts_at, duration_minutes, capacity, is_cancelled)
             VALUES (?, ?, ?, ?, ?, 0)",
        )
        .bind(request.title.trim())
        .bind(request.coach.trim())
        .bind(to_millis(request.starts_at))
        .bind(request.duration_minutes)
        .bind(request.capacity)
        .execute(&self.pool)
        .await?;

        let class_id = result.last_insert_rowid();
        info!(
            class_id,
            coach = %request.coach,
            capacity = request.capacity,
            "scheduled class session"
        );

        self.find_by_id(class_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("class {class_id}")))
    }

    /// Schedule a session unless its coach already leads an overlapping,
    /// non-cancelled one. Returns `None` when the coach is busy.
    pub async fn create_if_coach_free(
        &self,
        request: &CreateClassRequest,
    ) -> DatabaseResult<Option<ClassSession>> {
        let starts_at = to_millis(request.starts_at);
        let ends_at = starts_at.saturating_add(request.duration_minutes.saturating_mul(60_000));
        let coach = request.coach.trim();

        let result = sqlx::query(
            "INSERT INTO class_sessions (title, coach, starts_at, duration_minutes, capacity, is_cancelled)
             SELECT ?, ?, ?, ?, ?, 0
             WHERE NOT EXISTS (
                 SELECT 1 FROM class_sessions o
                 WHERE o.coach = ? COLLATE NOCASE
                   AND o.is_cancelled = 0
                   AND o.starts_at < ?
                   AND ? < o.starts_at + o.duration_minutes * 60000
             )",
        )
        .bind(request.title.trim())
        .bind(coach)
        .bind(starts_at)
        .bind(request.duration_minutes)
        .bind(request.capacity)
        .bind(coach)
        .bind(ends_at)
        .bind(starts_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(coach, starts_at = %request.starts_at, "coach already booked");
            return Ok(None);
        }

        let class_id = result.last_insert_rowid();
        info!(class_id, coach, capacity = request.capacity, "scheduled class session");

        self.find_by_id(class_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("class {class_id}")))
            .map(Some)
    }

    /// Non-cancelled sessions led by a coach
    pub async fn find_active_by_coach(&self, coach: &str) -> DatabaseResult<Vec<ClassSession>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS} FROM class_sessions c
             WHERE c.coach = ? COLLATE NOCASE AND c.is_cancelled = 0
             ORDER BY c.starts_at ASC"
        ))
        .bind(coach.trim())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_class).collect()
    }

    /// Non-cancelled sessions starting after `from`, with their confirmed head count
    pub async fn list_upcoming(&self, from: DateTime<Utc>) -> DatabaseResult<Vec<ClassOccupancy>> {
        let rows = sqlx::query(&format!(
            "SELECT {CLASS_COLUMNS},
                    (SELECT COUNT(*) FROM bookings b WHERE b.class_id = c.id AND b.status = ?) AS confirmed_count
             FROM class_sessions c
             WHERE c.is_cancelled = 0 AND c.starts_at > ?
             ORDER BY c.starts_at ASC"
        ))
        .bind(BookingStatus::Confirmed.as_str())
        .bind(to_millis(from))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ClassOccupancy {
                    session: map_class(row)?,
                    confirmed_count: row.try_get("confirmed_count")?,
                })
            })
            .collect()
    }

    /// Mark a session cancelled and move its confirmed bookings to
    /// `cancelled_by_class` in one transaction.
    ///
    /// Returns `None` when the session was already cancelled or does not exist.
    pub async fn cancel_with_bookings(&self, class_id: i64) -> DatabaseResult<Option<u64>> {
        let mut tx = self.pool.begin().await?;

        let flagged = sqlx::query(
            "UPDATE class_sessions SET is_cancelled = 1 WHERE id = ? AND is_cancelled = 0",
        )
        .bind(class_id)
        .execute(&mut *tx)
        .await?;

        if flagged.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let moved = sqlx::query("UPDATE bookings SET status = ? WHERE class_id = ? AND status = ?")
            .bind(BookingStatus::CancelledByClass.as_str())
            .bind(class_id)
            .bind(BookingStatus::Confirmed.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            class_id,
            cancelled_bookings = moved.rows_affected(),
            "cancelled class session"
        );

        Ok(Some(moved.rows_affected()))
    }
}

pub(crate) fn map_class(row: &SqliteRow) -> DatabaseResult<ClassSession> {
    Ok(ClassSession {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        coach: row.try_get("coach")?,
        starts_at: from_millis(row.try_get("starts_at")?)?,
        duration_minutes: row.try_get("duration_minutes")?,
        capacity: row.try_get("capacity")?,
        is_cancelled: row.try_get("is_cancelled")?,
    })
}
