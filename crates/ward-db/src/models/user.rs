//! User row model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use ward_core::{Identity, ParseEnumError, Role, UserId, UserStatus};
use ward_governance::{CreateUserRecord, User, UserUpdate};

/// A row from the `users` table.
///
/// Role and status are stored as text and parsed into the closed domain
/// enums on the way out; a value that fails to parse marks a corrupt row.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub provider: String,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert into the domain entity.
    pub fn into_domain(self) -> Result<User, ParseEnumError> {
        Ok(User {
            id: UserId::from_uuid(self.id),
            identity: Identity {
                email: self.email,
                provider: self.provider,
            },
            first_name: self.first_name,
            last_name: self.last_name,
            organization: self.organization,
            role: self.role.parse::<Role>()?,
            status: self.status.parse::<UserStatus>()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Find a user by identity (exact match).
    pub async fn find_by_identity<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        identity: &Identity,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE email = $1 AND provider = $2
            "#,
        )
        .bind(&identity.email)
        .bind(&identity.provider)
        .fetch_optional(executor)
        .await
    }

    /// Find a user by primary key.
    pub async fn find_by_user_id<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Insert a new user.
    pub async fn insert<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        record: &CreateUserRecord,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO users (id, email, provider, first_name, last_name, organization, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.identity.email)
        .bind(&record.identity.provider)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.organization)
        .bind(record.role.to_string())
        .bind(record.status.to_string())
        .fetch_one(executor)
        .await
    }

    /// Apply a partial update; absent fields keep their stored value.
    pub async fn update<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        identity: &Identity,
        update: &UserUpdate,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE users
            SET first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                organization = COALESCE($5, organization),
                role = COALESCE($6, role),
                status = COALESCE($7, status),
                updated_at = now()
            WHERE email = $1 AND provider = $2
            RETURNING *
            "#,
        )
        .bind(&identity.email)
        .bind(&identity.provider)
        .bind(update.first_name.as_deref())
        .bind(update.last_name.as_deref())
        .bind(update.organization.as_deref())
        .bind(update.role.map(|r| r.to_string()))
        .bind(update.status.map(|s| s.to_string()))
        .fetch_optional(executor)
        .await
    }

    /// All users holding the admin role.
    pub async fn list_admins<'e>(
        executor: impl sqlx::PgExecutor<'e>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE role = 'admin'
            ORDER BY email
            "#,
        )
        .fetch_all(executor)
        .await
    }

    /// Users whose most recent login predates the cutoff, excluding already
    /// disabled accounts and accounts with no recorded login.
    pub async fn find_inactive<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        cutoff: DateTime<Utc>,
        match_email_case_insensitively: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.* FROM users u
            JOIN login_events l
              ON l.provider = u.provider
             AND (CASE WHEN $2 THEN lower(l.email) = lower(u.email)
                       ELSE l.email = u.email END)
            WHERE u.status <> 'disabled'
            GROUP BY u.id
            HAVING max(l.occurred_at) < $1
            ORDER BY u.email
            "#,
        )
        .bind(cutoff)
        .bind(match_email_case_insensitively)
        .fetch_all(executor)
        .await
    }

    /// Batch-disable users; returns the number of rows actually changed.
    pub async fn disable_batch<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET status = 'disabled', updated_at = now()
            WHERE id = ANY($1) AND status <> 'disabled'
            "#,
        )
        .bind(user_ids)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Demote any admins among the users to member.
    pub async fn demote_admins<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        user_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE users
            SET role = 'member', updated_at = now()
            WHERE id = ANY($1) AND role = 'admin'
            RETURNING *
            "#,
        )
        .bind(user_ids)
        .fetch_all(executor)
        .await
    }
}
