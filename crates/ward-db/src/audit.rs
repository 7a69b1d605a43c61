//! Postgres-backed audit store.

use sqlx::PgPool;
use ward_core::Identity;
use ward_governance::{AuditEvent, AuditEventInput, AuditStore, LifecycleError, Result};

use crate::models::AuditEventRow;

/// Append-only audit trail in the `audit_events` table.
#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    /// Create a store over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AuditStore for PgAuditStore {
    async fn append(&self, input: AuditEventInput) -> Result<AuditEvent> {
        let row = AuditEventRow::insert(&self.pool, &input).await?;
        row.into_domain().map_err(LifecycleError::Internal)
    }

    async fn events_for(&self, subject: &Identity) -> Result<Vec<AuditEvent>> {
        AuditEventRow::find_for_subject(&self.pool, subject)
            .await?
            .into_iter()
            .map(|row| row.into_domain().map_err(LifecycleError::Internal))
            .collect()
    }
}
