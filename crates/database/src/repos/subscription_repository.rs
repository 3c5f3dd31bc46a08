//! Repository for subscription data access operations.

use crate::entities::{from_date_text, to_date_text, CreateSubscriptionRequest, Subscription};
use crate::types::{DatabaseError, DatabaseResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, plan_type, start_date, end_date, active, auto_renew";

/// Repository for subscription database operations
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a member's subscription regardless of its active flag
    pub async fn find_by_user(&self, user_id: i64) -> DatabaseResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_subscription).transpose()
    }

    /// Find a member's active subscription
    pub async fn find_active_by_user(&self, user_id: i64) -> DatabaseResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ? AND active = 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_subscription).transpose()
    }

    /// Open a subscription; a member holds at most one
    pub async fn create(&self, request: &CreateSubscriptionRequest) -> DatabaseResult<Subscription> {
        let result = sqlx::query(
            "INSERT INTO subscriptions (user_id, plan_type, start_date, end_date, active, auto_renew)
             VALUES (?, ?, ?, ?, 1, ?)",
        )
        .bind(request.user_id)
        .bind(request.plan_type.as_str())
        .bind(to_date_text(request.start_date))
        .bind(to_date_text(request.end_date))
        .bind(request.auto_renew)
        .execute(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::Duplicate(_) => DatabaseError::Duplicate(format!(
                "user {} already has a subscription",
                request.user_id
            )),
            other => other,
        })?;

        info!(
            subscription_id = result.last_insert_rowid(),
            user_id = request.user_id,
            plan = %request.plan_type,
            "opened subscription"
        );

        self.find_by_user(request.user_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("subscription for user {}", request.user_id)))
    }
}

fn map_subscription(row: &SqliteRow) -> DatabaseResult<Subscription> {
    let plan_type: String = row.try_get("plan_type")?;
    let start_date: String = row.try_get("start_date")?;
    let end_date: String = row.try_get("end_date")?;

    Ok(Subscription {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        plan_type: plan_type.parse().map_err(DatabaseError::InvalidData)?,
        start_date: from_date_text(&start_date)?,
        end_date: from_date_text(&end_date)?,
        active: row.try_get("active")?,
        auto_renew: row.try_get("auto_renew")?,
    })
}
