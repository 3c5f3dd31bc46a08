//! Repository for booking data access operations.

use crate::entities::{
    from_millis, to_millis, Booking, BookingStatus, ClassSession, GuardedInsert,
};
use crate::repos::class_repository::map_class;
use crate::types::{DatabaseError, DatabaseResult};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.class_id, b.status, b.created_at";

/// Repository for booking database operations
#[derive(Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Create a new booking repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find booking by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Booking>> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_booking).transpose()
    }

    /// Count bookings currently holding a slot in a class
    pub async fn count_confirmed(&self, class_id: i64) -> DatabaseResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE class_id = ? AND status = ?")
                .bind(class_id)
                .bind(BookingStatus::Confirmed.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// The member's confirmed booking for a class, if any
    pub async fn find_confirmed(
        &self,
        user_id: i64,
        class_id: i64,
    ) -> DatabaseResult<Option<Booking>> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.user_id = ? AND b.class_id = ? AND b.status = ?"
        ))
        .bind(user_id)
        .bind(class_id)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_booking).transpose()
    }

    /// Sessions the member currently holds a confirmed booking for
    pub async fn confirmed_sessions_for_user(
        &self,
        user_id: i64,
    ) -> DatabaseResult<Vec<ClassSession>> {
        let rows = sqlx::query(
            "SELECT c.id, c.title, c.coach, c.starts_at, c.duration_minutes, c.capacity, c.is_cancelled
             FROM bookings b
             JOIN class_sessions c ON c.id = b.class_id
             WHERE b.user_id = ? AND b.status = ?
             ORDER BY c.starts_at ASC",
        )
        .bind(user_id)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_class).collect()
    }

    /// Insert a confirmed booking only if the class is open, has a free slot
    /// and does not overlap another session the member holds.
    ///
    /// All three checks and the insert are one statement, so concurrent
    /// callers cannot both take the last slot or book clashing sessions. The
    /// partial unique index on `(user_id, class_id)` rejects a second
    /// confirmed booking for the pair.
    pub async fn insert_if_available(
        &self,
        user_id: i64,
        class_id: i64,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<GuardedInsert> {
        let confirmed = BookingStatus::Confirmed.as_str();
        let result = sqlx::query(
            "INSERT INTO bookings (user_id, class_id, status, created_at)
             SELECT ?, c.id, ?, ?
             FROM class_sessions c
             WHERE c.id = ?
               AND c.is_cancelled = 0
               AND (SELECT COUNT(*) FROM bookings b WHERE b.class_id = c.id AND b.status = ?) < c.capacity
               AND NOT EXISTS (
                   SELECT 1 FROM bookings h
                   JOIN class_sessions o ON o.id = h.class_id
                   WHERE h.user_id = ? AND h.status = ? AND o.id <> c.id
                     AND o.starts_at < c.starts_at + c.duration_minutes * 60000
                     AND c.starts_at < o.starts_at + o.duration_minutes * 60000
               )",
        )
        .bind(user_id)
        .bind(confirmed)
        .bind(to_millis(created_at))
        .bind(class_id)
        .bind(confirmed)
        .bind(user_id)
        .bind(confirmed)
        .execute(&self.pool)
        .await;

        let result = match result.map_err(DatabaseError::from) {
            Ok(result) => result,
            Err(DatabaseError::Duplicate(_)) => return Ok(GuardedInsert::Duplicate),
            Err(e) => return Err(e),
        };

        if result.rows_affected() == 0 {
            let outcome = self.classify_rejection(class_id).await?;
            debug!(user_id, class_id, ?outcome, "guarded booking insert rejected");
            return Ok(outcome);
        }

        let booking_id = result.last_insert_rowid();
        info!(booking_id, user_id, class_id, "created booking");

        let booking = self
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("booking {booking_id}")))?;

        Ok(GuardedInsert::Inserted(booking))
    }

    /// Work out why a guarded insert touched no row
    async fn classify_rejection(&self, class_id: i64) -> DatabaseResult<GuardedInsert> {
        let row = sqlx::query(
            "SELECT c.is_cancelled, c.capacity,
                    (SELECT COUNT(*) FROM bookings b WHERE b.class_id = c.id AND b.status = ?) AS confirmed_count
             FROM class_sessions c
             WHERE c.id = ?",
        )
        .bind(BookingStatus::Confirmed.as_str())
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(GuardedInsert::ClassClosed);
        };

        let is_cancelled: bool = row.try_get("is_cancelled")?;
        let capacity: i64 = row.try_get("capacity")?;
        let confirmed_count: i64 = row.try_get("confirmed_count")?;

        Ok(if is_cancelled {
            GuardedInsert::ClassClosed
        } else if confirmed_count >= capacity {
            GuardedInsert::Full
        } else {
            GuardedInsert::Overlap
        })
    }

    /// Move a confirmed booking into a terminal state.
    ///
    /// Returns `None` when the booking is missing or no longer confirmed.
    pub async fn transition_from_confirmed(
        &self,
        booking_id: i64,
        next: BookingStatus,
    ) -> DatabaseResult<Option<Booking>> {
        if !BookingStatus::Confirmed.can_transition_to(next) {
            return Err(DatabaseError::InvalidData(format!(
                "illegal booking transition confirmed -> {next}"
            )));
        }

        let result = sqlx::query("UPDATE bookings SET status = ? WHERE id = ? AND status = ?")
            .bind(next.as_str())
            .bind(booking_id)
            .bind(BookingStatus::Confirmed.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        info!(booking_id, status = %next, "booking transitioned");
        self.find_by_id(booking_id).await
    }

    /// Lapse every confirmed booking whose session started strictly before `now`
    pub async fn mark_overdue_as_no_show(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query(
            "UPDATE bookings SET status = ?
             WHERE status = ?
               AND class_id IN (SELECT id FROM class_sessions WHERE starts_at < ?)",
        )
        .bind(BookingStatus::NoShow.as_str())
        .bind(BookingStatus::Confirmed.as_str())
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// All bookings of a member, newest first
    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b
             WHERE b.user_id = ?
             ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_booking).collect()
    }

    /// Every booking in the system
    pub async fn list_all(&self) -> DatabaseResult<Vec<Booking>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b ORDER BY b.id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_booking).collect()
    }

    /// Penalized bookings of a member for sessions starting within `[from, until)`
    pub async fn count_no_shows_between(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<i64> {
        let penalized: Vec<BookingStatus> = BookingStatus::ALL
            .into_iter()
            .filter(BookingStatus::is_penalized)
            .collect();
        let placeholders = vec!["?"; penalized.len()].join(", ");

        let sql = format!(
            "SELECT COUNT(*) FROM bookings b
             JOIN class_sessions c ON c.id = b.class_id
             WHERE b.user_id = ? AND b.status IN ({placeholders})
               AND c.starts_at >= ? AND c.starts_at < ?"
        );

        let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(user_id);
        for status in &penalized {
            query = query.bind(status.as_str());
        }

        let count = query
            .bind(to_millis(from))
            .bind(to_millis(until))
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn map_booking(row: &SqliteRow) -> DatabaseResult<Booking> {
    let status: String = row.try_get("status")?;

    Ok(Booking {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        class_id: row.try_get("class_id")?,
        status: status.parse().map_err(DatabaseError::InvalidData)?,
        created_at: from_millis(row.try_get("created_at")?)?,
    })
}
