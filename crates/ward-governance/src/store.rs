//! The access-grant repository contract and its in-memory realization.
//!
//! The repository is the transactional interface to the shared store. Every
//! mutating method is one atomic, all-or-nothing unit: either every entity
//! named by the call is updated or none is. Transition methods re-validate
//! grant state inside the transaction boundary (read-validate-write) and
//! reject with [`LifecycleError::GrantStateConflict`] when the persisted
//! state no longer matches the expected source-state set; there is no
//! in-process locking.
//!
//! The in-memory implementation backs the engine's test suites; the Postgres
//! implementation lives in `ward-db`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use ward_core::{ArmId, GrantId, GrantStatus, Identity, RequestId, Role, UserId, UserStatus};

use crate::error::{LifecycleError, Result};
use crate::types::{AccessGrant, Arm, User};

/// Record for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserRecord {
    pub identity: Identity,
    pub first_name: String,
    pub last_name: String,
    pub organization: String,
    pub role: Role,
    pub status: UserStatus,
}

/// Partial update of a user record; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
}

impl UserUpdate {
    /// Whether the update changes anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Reviewer identity, timestamp, and comment stamped on transitioned grants.
#[derive(Debug, Clone)]
pub struct ReviewStamp {
    pub reviewer: Identity,
    pub reviewed_at: DateTime<Utc>,
    pub comment: Option<String>,
}

/// The transactional interface to the shared store.
#[async_trait::async_trait]
pub trait GrantRepository: Send + Sync {
    /// Look up a user by identity (exact match).
    async fn find_user(&self, identity: &Identity) -> Result<Option<User>>;

    /// Create a user. Fails with `NotUnique` if the identity is taken.
    async fn create_user(&self, record: CreateUserRecord) -> Result<User>;

    /// Apply a partial update to a user. Fails with `UserNotFound`.
    async fn update_user(&self, identity: &Identity, update: UserUpdate) -> Result<User>;

    /// All users currently holding the admin role.
    async fn list_admins(&self) -> Result<Vec<User>>;

    /// Resolve the subset of the given arm ids that exist.
    async fn find_arms(&self, arm_ids: &[ArmId]) -> Result<Vec<Arm>>;

    /// All seeded arms.
    async fn list_arms(&self) -> Result<Vec<Arm>>;

    /// Import an arm (seeding / ad hoc administrative import).
    async fn create_arm(&self, arm: Arm) -> Result<Arm>;

    /// The user's live grants (not superseded by a later request).
    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<AccessGrant>>;

    /// Atomically replace grants for the given arms with fresh `requested`
    /// ones sharing `request_id`.
    ///
    /// Existing rejected/revoked grants on those arms are detached; a live
    /// (requested/approved) grant on any of the arms fails the whole batch
    /// with `GrantStateConflict`.
    async fn replace_grants(
        &self,
        user_id: UserId,
        arm_ids: &[ArmId],
        request_id: RequestId,
        requested_at: DateTime<Utc>,
    ) -> Result<Vec<AccessGrant>>;

    /// Atomically transition the grants on the given arms to `target`.
    ///
    /// Re-reads each grant inside the transaction; if any is missing or not
    /// in `allowed_sources`, the whole batch fails with `GrantStateConflict`
    /// and nothing changes. On success every affected grant carries the
    /// review stamp, and `user_update` (the derived role/status side effect)
    /// is applied to the owning user in the same transaction.
    async fn transition_grants(
        &self,
        user_id: UserId,
        arm_ids: &[ArmId],
        target: GrantStatus,
        allowed_sources: &[GrantStatus],
        stamp: ReviewStamp,
        user_update: Option<UserUpdate>,
    ) -> Result<Vec<AccessGrant>>;

    /// Record a successful login for the identity.
    async fn record_login(&self, identity: &Identity, at: DateTime<Utc>) -> Result<()>;

    /// Users whose most recent login predates `cutoff` and whose status is
    /// not already disabled. Users with no recorded login are not selected.
    ///
    /// `match_email_case_insensitively` controls how login-event emails are
    /// matched to user identities; provider matching is always exact.
    async fn find_inactive_users(
        &self,
        cutoff: DateTime<Utc>,
        match_email_case_insensitively: bool,
    ) -> Result<Vec<User>>;

    /// Batch-disable the users; one transaction. Returns rows affected.
    async fn disable_users(&self, user_ids: &[UserId]) -> Result<u64>;

    /// Demote any admins among the users to member; a second, independent
    /// transaction. Returns the users actually demoted.
    async fn demote_admins_to_member(&self, user_ids: &[UserId]) -> Result<Vec<User>>;
}

#[derive(Debug, Clone)]
struct LoginRecord {
    email: String,
    provider: String,
    at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    users_by_identity: HashMap<Identity, UserId>,
    arms: HashMap<ArmId, Arm>,
    grants: HashMap<GrantId, AccessGrant>,
    detached: Vec<AccessGrant>,
    logins: Vec<LoginRecord>,
}

impl Inner {
    fn live_grants(&self, user_id: UserId) -> Vec<AccessGrant> {
        let mut grants: Vec<AccessGrant> = self
            .grants
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        grants.sort_by_key(|g| g.requested_at);
        grants
    }

    fn live_grant_for_arm(&self, user_id: UserId, arm_id: ArmId) -> Option<&AccessGrant> {
        self.grants
            .values()
            .find(|g| g.user_id == user_id && g.arm_id == arm_id)
    }

    fn apply_user_update(&mut self, user_id: UserId, update: &UserUpdate) {
        if let Some(user) = self.users.get_mut(&user_id) {
            if let Some(first_name) = &update.first_name {
                user.first_name = first_name.clone();
            }
            if let Some(last_name) = &update.last_name {
                user.last_name = last_name.clone();
            }
            if let Some(organization) = &update.organization {
                user.organization = organization.clone();
            }
            if let Some(role) = update.role {
                user.role = role;
            }
            if let Some(status) = update.status {
                user.status = status;
            }
            user.updated_at = Utc::now();
        }
    }
}

/// In-memory repository for tests and the engine's integration suites.
///
/// A single lock guards all entities, so each mutating method is naturally
/// all-or-nothing, mirroring the one-transaction-per-call contract.
#[derive(Debug, Default)]
pub struct InMemoryGrantRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryGrantRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants superseded by a later request (for test assertions).
    pub async fn detached_grants(&self) -> Vec<AccessGrant> {
        self.inner.read().await.detached.clone()
    }
}

#[async_trait::async_trait]
impl GrantRepository for InMemoryGrantRepository {
    async fn find_user(&self, identity: &Identity) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users_by_identity
            .get(identity)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn create_user(&self, record: CreateUserRecord) -> Result<User> {
        let mut inner = self.inner.write().await;
        if inner.users_by_identity.contains_key(&record.identity) {
            return Err(LifecycleError::NotUnique(record.identity));
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            identity: record.identity.clone(),
            first_name: record.first_name,
            last_name: record.last_name,
            organization: record.organization,
            role: record.role,
            status: record.status,
            created_at: now,
            updated_at: now,
        };
        inner.users_by_identity.insert(record.identity, user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, identity: &Identity, update: UserUpdate) -> Result<User> {
        let mut inner = self.inner.write().await;
        let user_id = *inner
            .users_by_identity
            .get(identity)
            .ok_or_else(|| LifecycleError::UserNotFound(identity.clone()))?;
        inner.apply_user_update(user_id, &update);
        Ok(inner.users[&user_id].clone())
    }

    async fn list_admins(&self) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|u| u.role.is_admin())
            .cloned()
            .collect())
    }

    async fn find_arms(&self, arm_ids: &[ArmId]) -> Result<Vec<Arm>> {
        let inner = self.inner.read().await;
        Ok(arm_ids
            .iter()
            .filter_map(|id| inner.arms.get(id))
            .cloned()
            .collect())
    }

    async fn list_arms(&self) -> Result<Vec<Arm>> {
        let inner = self.inner.read().await;
        let mut arms: Vec<Arm> = inner.arms.values().cloned().collect();
        arms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(arms)
    }

    async fn create_arm(&self, arm: Arm) -> Result<Arm> {
        let mut inner = self.inner.write().await;
        inner.arms.insert(arm.id, arm.clone());
        Ok(arm)
    }

    async fn grants_for_user(&self, user_id: UserId) -> Result<Vec<AccessGrant>> {
        Ok(self.inner.read().await.live_grants(user_id))
    }

    async fn replace_grants(
        &self,
        user_id: UserId,
        arm_ids: &[ArmId],
        request_id: RequestId,
        requested_at: DateTime<Utc>,
    ) -> Result<Vec<AccessGrant>> {
        let mut inner = self.inner.write().await;

        // Validate before touching anything: the batch is all-or-nothing.
        let mut conflicting = Vec::new();
        for arm_id in arm_ids {
            if let Some(existing) = inner.live_grant_for_arm(user_id, *arm_id) {
                if existing.status.is_live() {
                    conflicting.push(*arm_id);
                }
            }
        }
        if !conflicting.is_empty() {
            return Err(LifecycleError::GrantStateConflict(conflicting));
        }

        let mut created = Vec::with_capacity(arm_ids.len());
        for arm_id in arm_ids {
            // Detach the superseded rejected/revoked grant, keeping its record.
            if let Some(old_id) = inner
                .live_grant_for_arm(user_id, *arm_id)
                .map(|g| g.id)
            {
                if let Some(old) = inner.grants.remove(&old_id) {
                    inner.detached.push(old);
                }
            }
            let grant = AccessGrant {
                id: GrantId::new(),
                user_id,
                arm_id: *arm_id,
                status: GrantStatus::Requested,
                request_id,
                requested_at,
                reviewed_at: None,
                reviewer: None,
                comment: None,
            };
            inner.grants.insert(grant.id, grant.clone());
            created.push(grant);
        }
        Ok(created)
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
        let mut inner = self.inner.write().await;

        // Read-validate-write under the single lock: reject the whole batch
        // if any grant's current state is outside the allowed source set.
        let mut grant_ids = Vec::with_capacity(arm_ids.len());
        let mut conflicting = Vec::new();
        for arm_id in arm_ids {
            match inner.live_grant_for_arm(user_id, *arm_id) {
                Some(grant) if allowed_sources.contains(&grant.status) => {
                    grant_ids.push(grant.id);
                }
                _ => conflicting.push(*arm_id),
            }
        }
        if !conflicting.is_empty() {
            return Err(LifecycleError::GrantStateConflict(conflicting));
        }

        let mut updated = Vec::with_capacity(grant_ids.len());
        for grant_id in grant_ids {
            if let Some(grant) = inner.grants.get_mut(&grant_id) {
                grant.status = target;
                grant.reviewed_at = Some(stamp.reviewed_at);
                grant.reviewer = Some(stamp.reviewer.clone());
                grant.comment = stamp.comment.clone();
                updated.push(grant.clone());
            }
        }
        if let Some(update) = &user_update {
            inner.apply_user_update(user_id, update);
        }
        Ok(updated)
    }

    async fn record_login(&self, identity: &Identity, at: DateTime<Utc>) -> Result<()> {
        self.inner.write().await.logins.push(LoginRecord {
            email: identity.email.clone(),
            provider: identity.provider.clone(),
            at,
        });
        Ok(())
    }

    async fn find_inactive_users(
        &self,
        cutoff: DateTime<Utc>,
        match_email_case_insensitively: bool,
    ) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let mut selected = Vec::new();
        for user in inner.users.values() {
            if user.status.is_disabled() {
                continue;
            }
            let last_login = inner
                .logins
                .iter()
                .filter(|l| {
                    l.provider == user.identity.provider
                        && if match_email_case_insensitively {
                            l.email.eq_ignore_ascii_case(&user.identity.email)
                        } else {
                            l.email == user.identity.email
                        }
                })
                .map(|l| l.at)
                .max();
            if let Some(last) = last_login {
                if last < cutoff {
                    selected.push(user.clone());
                }
            }
        }
        selected.sort_by(|a, b| a.identity.email.cmp(&b.identity.email));
        Ok(selected)
    }

    async fn disable_users(&self, user_ids: &[UserId]) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut affected = 0;
        for user_id in user_ids {
            if let Some(user) = inner.users.get_mut(user_id) {
                if user.status != UserStatus::Disabled {
                    user.status = UserStatus::Disabled;
                    user.updated_at = Utc::now();
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }

    async fn demote_admins_to_member(&self, user_ids: &[UserId]) -> Result<Vec<User>> {
        let mut inner = self.inner.write().await;
        let mut demoted = Vec::new();
        for user_id in user_ids {
            if let Some(user) = inner.users.get_mut(user_id) {
                if user.role.is_admin() {
                    user.role = Role::Member;
                    user.updated_at = Utc::now();
                    demoted.push(user.clone());
                }
            }
        }
        Ok(demoted)
    }
}
