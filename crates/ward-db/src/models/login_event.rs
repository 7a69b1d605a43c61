//! Login event row model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use ward_core::Identity;

/// A row from the `login_events` table.
#[derive(Debug, Clone, FromRow)]
pub struct LoginEventRow {
    pub id: Uuid,
    pub email: String,
    pub provider: String,
    pub occurred_at: DateTime<Utc>,
}

impl LoginEventRow {
    /// Record a login.
    pub async fn insert<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        identity: &Identity,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO login_events (id, email, provider, occurred_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&identity.email)
        .bind(&identity.provider)
        .bind(occurred_at)
        .fetch_one(executor)
        .await
    }
}
