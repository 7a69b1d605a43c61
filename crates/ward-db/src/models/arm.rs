//! Arm row model.

use sqlx::FromRow;
use uuid::Uuid;
use ward_core::ArmId;
use ward_governance::Arm;

/// A row from the `arms` table.
#[derive(Debug, Clone, FromRow)]
pub struct ArmRow {
    pub id: Uuid,
    pub name: String,
    pub acronym: String,
}

impl ArmRow {
    /// Convert into the domain entity.
    pub fn into_domain(self) -> Arm {
        Arm {
            id: ArmId::from_uuid(self.id),
            name: self.name,
            acronym: self.acronym,
        }
    }

    /// Resolve the subset of the given ids that exist.
    pub async fn find_by_ids<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM arms
            WHERE id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await
    }

    /// All arms, by name.
    pub async fn list_all<'e>(
        executor: impl sqlx::PgExecutor<'e>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM arms
            ORDER BY name
            "#,
        )
        .fetch_all(executor)
        .await
    }

    /// Insert a new arm.
    pub async fn insert<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        arm: &Arm,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO arms (id, name, acronym)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::from(arm.id))
        .bind(&arm.name)
        .bind(&arm.acronym)
        .fetch_one(executor)
        .await
    }
}
