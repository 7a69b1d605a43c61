//! Access grant row model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use ward_core::{ArmId, GrantId, GrantStatus, Identity, ParseEnumError, RequestId, UserId};
use ward_governance::{AccessGrant, ReviewStamp};

/// A row from the `access_grants` table.
///
/// `detached_at` marks grants superseded by a later request; live queries
/// filter them out, but the rows are never deleted.
#[derive(Debug, Clone, FromRow)]
pub struct GrantRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub arm_id: Uuid,
    pub status: String,
    pub request_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewer_email: Option<String>,
    pub reviewer_provider: Option<String>,
    pub comment: Option<String>,
    pub detached_at: Option<DateTime<Utc>>,
}

impl GrantRow {
    /// Convert into the domain entity.
    pub fn into_domain(self) -> Result<AccessGrant, ParseEnumError> {
        let reviewer = match (self.reviewer_email, self.reviewer_provider) {
            (Some(email), Some(provider)) => Some(Identity { email, provider }),
            _ => None,
        };
        Ok(AccessGrant {
            id: GrantId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            arm_id: ArmId::from_uuid(self.arm_id),
            status: self.status.parse::<GrantStatus>()?,
            request_id: RequestId::from_uuid(self.request_id),
            requested_at: self.requested_at,
            reviewed_at: self.reviewed_at,
            reviewer,
            comment: self.comment,
        })
    }

    /// The user's live grants, oldest request first.
    pub async fn find_live_for_user<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM access_grants
            WHERE user_id = $1 AND detached_at IS NULL
            ORDER BY requested_at
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Lock the user's live grants on the given arms for the duration of the
    /// surrounding transaction.
    pub async fn lock_live_for_arms<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_id: Uuid,
        arm_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM access_grants
            WHERE user_id = $1 AND arm_id = ANY($2) AND detached_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(arm_ids)
        .fetch_all(executor)
        .await
    }

    /// Insert a fresh requested grant.
    pub async fn insert_requested<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_id: Uuid,
        arm_id: Uuid,
        request_id: Uuid,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO access_grants (id, user_id, arm_id, status, request_id, requested_at)
            VALUES ($1, $2, $3, 'requested', $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(arm_id)
        .bind(request_id)
        .bind(requested_at)
        .fetch_one(executor)
        .await
    }

    /// Detach the listed grants, superseding them.
    pub async fn detach<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        grant_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE access_grants
            SET detached_at = now()
            WHERE id = ANY($1) AND detached_at IS NULL
            "#,
        )
        .bind(grant_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Transition the listed grants to the target state and stamp the review.
    pub async fn transition<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        grant_ids: &[Uuid],
        target: GrantStatus,
        stamp: &ReviewStamp,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE access_grants
            SET status = $2,
                reviewed_at = $3,
                reviewer_email = $4,
                reviewer_provider = $5,
                comment = $6
            WHERE id = ANY($1)
            RETURNING *
            "#,
        )
        .bind(grant_ids)
        .bind(target.to_string())
        .bind(stamp.reviewed_at)
        .bind(&stamp.reviewer.email)
        .bind(&stamp.reviewer.provider)
        .bind(stamp.comment.as_deref())
        .fetch_all(executor)
        .await
    }
}
