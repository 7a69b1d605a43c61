//! Postgres-backed grant repository.
//!
//! Every mutating method runs inside one transaction. Transition methods
//! re-read the targeted grants with `FOR UPDATE` and validate their state
//! inside the transaction boundary, so two concurrent reviews of the same
//! grants serialize and the loser sees a state conflict.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use ward_core::{ArmId, GrantStatus, Identity, RequestId, UserId};
use ward_governance::{
    AccessGrant, Arm, CreateUserRecord, GrantRepository, LifecycleError, Result, ReviewStamp,
    User, UserUpdate,
};

use crate::models::{ArmRow, GrantRow, LoginEventRow, UserRow};

const UNIQUE_VIOLATION: &str = "23505";

/// The production repository over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgGrantRepository {
    pool: PgPool,
}

impl PgGrantRepository {
    /// Create a repository over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION)
    }
}

fn uuids(arm_ids: &[ArmId]) -> Vec<Uuid> {
    arm_ids.iter().copied().map(Uuid::from).collect()
}

fn grants_from_rows(rows: Vec<GrantRow>) -> Result<Vec<AccessGrant>> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(LifecycleError::from))
        .collect()
}

#[async_trait::async_trait]
impl GrantRepository for PgGrantRepository {
    async fn find_user(&self, identity: &Identity) -> Result<Option<User>> {
        match UserRow::find_by_identity(&self.pool, identity).await? {
            Some(row) => Ok(Some(row.into_domain()?)),
            None => Ok(None),
        }
    }

    async fn create_user(&self, record: CreateUserRecord) -> Result<User> {
        let row = UserRow::insert(&self.pool, &record)
            .await
            .map_err(|err| {
                if Self::is_unique_violation(&err) {
                    LifecycleError::NotUnique(record.identity.clone())
                } else {
                    LifecycleError::from(err)
                }
            })?;
        Ok(row.into_domain()?)
    }

    async fn update_user(&self, identity: &Identity, update: UserUpdate) -> Result<User> {
        let row = UserRow::update(&self.pool, identity, &update)
            .await?
            .ok_or_else(|| LifecycleError::UserNotFound(identity.clone()))?;
        Ok(row.into_domain()?)
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        UserRow::list_admins(&self.pool)
            .await?
            .into_iter()
            .map(|row| row.into_domain().map_err(LifecycleError::from))
            .collect()
    }

    async fn find_arms(&self, arm_ids: &[ArmId]) -> Result<Vec<Arm>> {
        Ok(ArmRow::find_by_ids(&self.pool, &uuids(arm_ids))
            .await?
            .into_iter()
            .map(ArmRow::into_domain)
            .collect())
    }

    async fn list_arms(&self) -> Result<Vec<Arm>> {
        Ok(ArmRow::list_all(&self.pool)
            .await?
            .into_iter()
            .map(ArmRow::into_domain)
            .collect())
    }

    async fn create_arm(&self, arm: Arm) -> Result<Arm> {
        Ok(ArmRow::insert(&self.pool, &arm).await?.into_domain())
    }

    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<AccessGrant>> {
        let rows = GrantRow::find_live_for_user(&self.pool, Uuid::from(user_id)).await?;
        grants_from_rows(rows)
    }

    async fn replace_grants(
        &self,
        user_id: UserId,
        arm_ids: &[ArmId],
        request_id: RequestId,
        requested_at: DateTime<Utc>,
    ) -> Result<Vec<AccessGrant>> {
        let arm_uuids = uuids(arm_ids);
        let mut tx = self.pool.begin().await?;

        let existing =
            GrantRow::lock_live_for_arms(&mut *tx, Uuid::from(user_id), &arm_uuids).await?;

        let mut conflicting = Vec::new();
        let mut superseded = Vec::new();
        for row in &existing {
            let status: GrantStatus = row.status.parse().map_err(LifecycleError::from)?;
            if status.is_live() {
                conflicting.push(ArmId::from_uuid(row.arm_id));
            } else {
                superseded.push(row.id);
            }
        }
        if !conflicting.is_empty() {
            return Err(LifecycleError::GrantStateConflict(conflicting));
        }

        if !superseded.is_empty() {
            GrantRow::detach(&mut *tx, &superseded).await?;
        }

        let mut created = Vec::with_capacity(arm_uuids.len());
        for arm_id in &arm_uuids {
            let row = GrantRow::insert_requested(
                &mut *tx,
                Uuid::from(user_id),
                *arm_id,
                Uuid::from(request_id),
                requested_at,
            )
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        grants_from_rows(created)
    }

    async fn transition_grants(
        &self,
        user_id: UserId,
        arm_ids: &[ArmId],
        target: GrantStatus,
        allowed_sources: &[GrantStatus],
        stamp: ReviewStamp,
        user_update: Option<UserUpdate>,
    ) -> Result<Vec<AccessGrant>> {
        let arm_uuids = uuids(arm_ids);
        let mut tx = self.pool.begin().await?;

        let locked =
            GrantRow::lock_live_for_arms(&mut *tx, Uuid::from(user_id), &arm_uuids).await?;

        // Re-validate under the row locks: the state may have moved between
        // the caller's read and this transaction.
        let mut grant_ids = Vec::with_capacity(arm_uuids.len());
        let mut conflicting = Vec::new();
        for arm_id in &arm_uuids {
            match locked.iter().find(|row| row.arm_id == *arm_id) {
                Some(row) => {
                    let status: GrantStatus =
                        row.status.parse().map_err(LifecycleError::from)?;
                    if allowed_sources.contains(&status) {
                        grant_ids.push(row.id);
                    } else {
                        conflicting.push(ArmId::from_uuid(*arm_id));
                    }
                }
                None => conflicting.push(ArmId::from_uuid(*arm_id)),
            }
        }
        if !conflicting.is_empty() {
            return Err(LifecycleError::GrantStateConflict(conflicting));
        }

        let updated = GrantRow::transition(&mut *tx, &grant_ids, target, &stamp).await?;

        if let Some(update) = &user_update {
            let subject = UserRow::find_by_user_id(&mut *tx, Uuid::from(user_id))
                .await?
                .ok_or_else(|| {
                    LifecycleError::Internal(format!("user {user_id} vanished mid-transition"))
                })?;
            let identity = Identity {
                email: subject.email.clone(),
                provider: subject.provider.clone(),
            };
            UserRow::update(&mut *tx, &identity, update).await?;
        }

        tx.commit().await?;
        grants_from_rows(updated)
    }

    async fn record_login(&self, identity: &Identity, at: DateTime<Utc>) -> Result<()> {
        LoginEventRow::insert(&self.pool, identity, at).await?;
        Ok(())
    }

    async fn find_inactive_users(
        &self,
        cutoff: DateTime<Utc>,
        match_email_case_insensitively: bool,
    ) -> Result<Vec<User>> {
        UserRow::find_inactive(&self.pool, cutoff, match_email_case_insensitively)
            .await?
            .into_iter()
            .map(|row| row.into_domain().map_err(LifecycleError::from))
            .collect()
    }

    async fn disable_users(&self, user_ids: &[UserId]) -> Result<u64> {
        let ids: Vec<Uuid> = user_ids.iter().copied().map(Uuid::from).collect();
        Ok(UserRow::disable_batch(&self.pool, &ids).await?)
    }

    async fn demote_admins_to_member(&self, user_ids: &[UserId]) -> Result<Vec<User>> {
        let ids: Vec<Uuid> = user_ids.iter().copied().map(Uuid::from).collect();
        UserRow::demote_admins(&self.pool, &ids)
            .await?
            .into_iter()
            .map(|row| row.into_domain().map_err(LifecycleError::from))
            .collect()
    }
}
