//! The access-grant lifecycle engine.
//!
//! Every operation runs the same shape: evaluate preconditions in order,
//! mutate through one repository transaction, emit audit events, then fire
//! notifications. Audit-append failures and notification failures are logged
//! and never roll back the committed mutation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};
use ward_core::{ArmId, GrantStatus, RequestId, Role, UserStatus};

use crate::audit::{Actor, AuditEventInput, AuditStore};
use crate::conditions::{check_all, Precondition, TransitionKind};
use crate::config::EngineConfig;
use crate::derive::{
    demotion_outcome, diff_snapshots, role_after_approval, status_after_approval,
    status_for_approved_count, UserSnapshot,
};
use crate::error::{LifecycleError, Result};
use crate::notify::{NotificationDispatcher, TemplateKey};
use crate::store::{CreateUserRecord, GrantRepository, ReviewStamp, UserUpdate};
use crate::types::{
    AccessGrant, Arm, EditUserInput, RegisterUserInput, RequestAccessInput, ReviewInput,
    SessionContext, User,
};

/// States a grant may be approved from. Approving a rejected or revoked grant
/// reverses the earlier decision without requiring a fresh request.
pub const APPROVE_SOURCE_STATES: [GrantStatus; 3] = [
    GrantStatus::Requested,
    GrantStatus::Rejected,
    GrantStatus::Revoked,
];

/// States a grant may be rejected from.
pub const REJECT_SOURCE_STATES: [GrantStatus; 1] = [GrantStatus::Requested];

/// States a grant may be revoked from.
pub const REVOKE_SOURCE_STATES: [GrantStatus; 1] = [GrantStatus::Approved];

/// The lifecycle engine: preconditions, transitions, derived state, audit,
/// and notifications behind one facade.
pub struct LifecycleEngine {
    repo: Arc<dyn GrantRepository>,
    audit: Arc<dyn AuditStore>,
    notifier: Arc<dyn NotificationDispatcher>,
    config: EngineConfig,
}

impl LifecycleEngine {
    /// Create an engine over the given stores.
    pub fn new(
        repo: Arc<dyn GrantRepository>,
        audit: Arc<dyn AuditStore>,
        notifier: Arc<dyn NotificationDispatcher>,
        config: EngineConfig,
    ) -> Self {
        Self {
            repo,
            audit,
            notifier,
            config,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying repository.
    #[must_use]
    pub fn repository(&self) -> Arc<dyn GrantRepository> {
        Arc::clone(&self.repo)
    }

    /// Register a new user, optionally filing an initial access request.
    ///
    /// An admin registration must not carry arm requests; any other requested
    /// role is rejected because membership is derived, never claimed.
    #[instrument(skip(self, input), fields(email = %session.identity.email))]
    pub async fn register_user(
        &self,
        session: &SessionContext,
        input: RegisterUserInput,
    ) -> Result<User> {
        check_all(&[
            Precondition::Login(&session.identity),
            Precondition::IdentityProvider {
                identity: &session.identity,
                allowed: &self.config.allowed_identity_providers,
            },
        ])?;

        if self.repo.find_user(&session.identity).await?.is_some() {
            return Err(LifecycleError::NotUnique(session.identity.clone()));
        }

        let role = input.requested_role.unwrap_or(Role::NonMember);
        let status = match role {
            Role::Admin => {
                if !input.arm_ids.is_empty() {
                    return Err(LifecycleError::InvalidAdminArmRequest);
                }
                UserStatus::Active
            }
            Role::Member => {
                // Membership is derived from approvals, never self-asserted.
                return Err(LifecycleError::InvalidRole("member".to_string()));
            }
            Role::NonMember => UserStatus::Unreviewed,
        };

        let arm_ids = dedupe(&input.arm_ids);
        if !arm_ids.is_empty() {
            let requestable = self.requestable_arm_ids(&arm_ids).await?;
            check_all(&[Precondition::ArmsExist {
                requested: &arm_ids,
                requestable: &requestable,
            }])?;
        }

        let user = self
            .repo
            .create_user(CreateUserRecord {
                identity: session.identity.clone(),
                first_name: input.first_name,
                last_name: input.last_name,
                organization: input.organization,
                role,
                status,
            })
            .await
            .map_err(|err| match err {
                LifecycleError::NotUnique(identity) => LifecycleError::NotUnique(identity),
                LifecycleError::Database(db) => {
                    LifecycleError::UnableToRegisterUser(db.to_string())
                }
                other => other,
            })?;

        info!(user_id = %user.id, role = %user.role, "registered user");

        if !arm_ids.is_empty() {
            self.file_request(&user, &arm_ids).await?;
        }
        Ok(user)
    }

    /// Request access to one or more arms, optionally updating profile fields
    /// in the same call.
    ///
    /// The batch is all-or-nothing: one unknown or already-live arm voids the
    /// whole request and no grant is created.
    #[instrument(skip(self, input), fields(email = %session.identity.email))]
    pub async fn request_access(
        &self,
        session: &SessionContext,
        input: RequestAccessInput,
    ) -> Result<Vec<AccessGrant>> {
        let user = self.authenticated_user(session).await?;
        let arm_ids = dedupe(&input.arm_ids);
        // An arm already held in a live state is not requestable again;
        // rejected and revoked grants may be re-requested.
        let held = self.repo.grants_for_user(user.id).await?;
        let requestable: Vec<ArmId> = self
            .requestable_arm_ids(&arm_ids)
            .await?
            .into_iter()
            .filter(|id| !held.iter().any(|g| g.arm_id == *id && g.status.is_live()))
            .collect();
        check_all(&[
            Precondition::NotDisabled(&user),
            Precondition::GeneralUser(&user),
            Precondition::ArmRequestParams(&arm_ids),
            Precondition::ArmsExist {
                requested: &arm_ids,
                requestable: &requestable,
            },
        ])?;

        if let Some(profile) = input.profile.filter(|p| !p.is_empty()) {
            let before = UserSnapshot::capture(&user);
            let updated = self
                .repo
                .update_user(
                    &user.identity,
                    UserUpdate {
                        first_name: profile.first_name,
                        last_name: profile.last_name,
                        organization: profile.organization,
                        ..Default::default()
                    },
                )
                .await?;
            self.audit_field_changes(&before, &updated, Actor::user(user.identity.clone()))
                .await;
        }

        self.file_request(&user, &arm_ids).await
    }

    /// Approve the targeted grants: they become approved, the user gains
    /// membership if still a non-member, and an unreviewed or inactive
    /// account becomes active.
    pub async fn approve_access(
        &self,
        session: &SessionContext,
        input: ReviewInput,
    ) -> Result<Vec<AccessGrant>> {
        self.review(session, input, GrantStatus::Approved, &APPROVE_SOURCE_STATES)
            .await
    }

    /// Reject the targeted grants. Only pending requests can be rejected;
    /// the user's role and status are untouched.
    pub async fn reject_access(
        &self,
        session: &SessionContext,
        input: ReviewInput,
    ) -> Result<Vec<AccessGrant>> {
        self.review(session, input, GrantStatus::Rejected, &REJECT_SOURCE_STATES)
            .await
    }

    /// Revoke the targeted approved grants. The user's status is recomputed
    /// from the approvals that remain.
    pub async fn revoke_access(
        &self,
        session: &SessionContext,
        input: ReviewInput,
    ) -> Result<Vec<AccessGrant>> {
        self.review(session, input, GrantStatus::Revoked, &REVOKE_SOURCE_STATES)
            .await
    }

    /// Administrative edit of a user's profile, role, or status.
    ///
    /// Demoting an admin ignores the requested replacement role: the outcome
    /// is always `member`, with status recomputed from approved grants.
    #[instrument(skip(self, input), fields(admin = %session.identity.email, subject = %input.user.email))]
    pub async fn edit_user(
        &self,
        session: &SessionContext,
        input: EditUserInput,
    ) -> Result<User> {
        let admin = self.authenticated_user(session).await?;
        check_all(&[Precondition::AdminPermission(&admin)])?;

        let subject = self
            .repo
            .find_user(&input.user)
            .await?
            .ok_or_else(|| LifecycleError::UserNotFound(input.user.clone()))?;

        let mut update = UserUpdate {
            first_name: input.first_name,
            last_name: input.last_name,
            organization: input.organization,
            role: input.role,
            status: input.status,
        };

        if subject.role.is_admin() && matches!(input.role, Some(r) if !r.is_admin()) {
            let approved = self.approved_count(&subject).await?;
            let (role, status) = demotion_outcome(approved);
            update.role = Some(role);
            // Demotion recomputes status from approved grants alone; a
            // status supplied with the edit is superseded.
            update.status = Some(status);
        }

        if update.is_empty() {
            return Ok(subject);
        }

        let before = UserSnapshot::capture(&subject);
        let updated = self.repo.update_user(&input.user, update).await?;
        self.audit_field_changes(&before, &updated, Actor::user(admin.identity.clone()))
            .await;
        Ok(updated)
    }

    /// The caller's own record and live grants.
    pub async fn access_list(&self, session: &SessionContext) -> Result<(User, Vec<AccessGrant>)> {
        let user = self.authenticated_user(session).await?;
        let grants = self.repo.grants_for_user(user.id).await?;
        Ok((user, grants))
    }

    /// All requestable arms.
    pub async fn list_arms(&self) -> Result<Vec<Arm>> {
        self.repo.list_arms().await
    }

    /// Record a successful login for the session identity.
    pub async fn record_login(&self, session: &SessionContext) -> Result<()> {
        check_all(&[
            Precondition::Login(&session.identity),
            Precondition::IdentityProvider {
                identity: &session.identity,
                allowed: &self.config.allowed_identity_providers,
            },
        ])?;
        self.repo.record_login(&session.identity, Utc::now()).await
    }

    /// Shared approve/reject/revoke path.
    #[instrument(skip(self, input), fields(admin = %session.identity.email, subject = %input.user.email, target = %target))]
    async fn review(
        &self,
        session: &SessionContext,
        input: ReviewInput,
        target: GrantStatus,
        allowed_sources: &[GrantStatus],
    ) -> Result<Vec<AccessGrant>> {
        let admin = self.authenticated_user(session).await?;
        check_all(&[Precondition::AdminPermission(&admin)])?;

        let subject = self
            .repo
            .find_user(&input.user)
            .await?
            .ok_or_else(|| LifecycleError::UserNotFound(input.user.clone()))?;

        let arm_ids = dedupe(&input.arm_ids);
        let grants = self.repo.grants_for_user(subject.id).await?;
        let kind = transition_kind(target);
        check_all(&[
            Precondition::ArmRequestParams(&arm_ids),
            Precondition::GrantStateForTransition {
                grants: &grants,
                targets: &arm_ids,
                allowed_sources,
                kind,
            },
        ])?;

        let user_update = self.review_side_effect(&subject, &grants, &arm_ids, target);

        let stamp = ReviewStamp {
            reviewer: admin.identity.clone(),
            reviewed_at: Utc::now(),
            comment: input.comment,
        };
        let updated = self
            .repo
            .transition_grants(
                subject.id,
                &arm_ids,
                target,
                allowed_sources,
                stamp,
                user_update,
            )
            .await
            .map_err(|err| translate_conflict(err, kind))?;

        info!(
            arms = arm_ids.len(),
            "grants transitioned to {target} by {}", admin.identity
        );

        let actor = Actor::user(admin.identity.clone());
        for grant in &updated {
            let old = grants
                .iter()
                .find(|g| g.arm_id == grant.arm_id)
                .map(|g| g.status);
            self.audit_append(AuditEventInput::grant_transition(
                subject.identity.clone(),
                actor.clone(),
                grant.arm_id,
                old,
                target,
            ))
            .await;
        }

        if let Ok(Some(refreshed)) = self.repo.find_user(&subject.identity).await {
            let before = UserSnapshot::capture(&subject);
            self.audit_field_changes(&before, &refreshed, actor).await;
        }

        self.notify(
            &[subject.identity.email.clone()],
            TemplateKey::ReviewCompleted,
            serde_json::json!({
                "outcome": target.to_string(),
                "arms": arm_ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
        )
        .await;

        self.repo.grants_for_user(subject.id).await
    }

    /// Derived role/status side effect for a review transition.
    fn review_side_effect(
        &self,
        subject: &User,
        grants: &[AccessGrant],
        arm_ids: &[ArmId],
        target: GrantStatus,
    ) -> Option<UserUpdate> {
        match target {
            GrantStatus::Approved => {
                let role = role_after_approval(subject.role);
                let status = status_after_approval(subject.status);
                if role == subject.role && status == subject.status {
                    None
                } else {
                    Some(UserUpdate {
                        role: Some(role),
                        status: Some(status),
                        ..Default::default()
                    })
                }
            }
            GrantStatus::Revoked => {
                let remaining = grants
                    .iter()
                    .filter(|g| {
                        g.status == GrantStatus::Approved && !arm_ids.contains(&g.arm_id)
                    })
                    .count();
                let status = status_for_approved_count(remaining);
                if status == subject.status {
                    None
                } else {
                    Some(UserUpdate {
                        status: Some(status),
                        ..Default::default()
                    })
                }
            }
            // A rejection leaves the user's derived fields alone.
            GrantStatus::Requested | GrantStatus::Rejected => None,
        }
    }

    /// Create the fresh requested grants, emit audit and notifications.
    async fn file_request(&self, user: &User, arm_ids: &[ArmId]) -> Result<Vec<AccessGrant>> {
        let request_id = RequestId::new();
        let created = self
            .repo
            .replace_grants(user.id, arm_ids, request_id, Utc::now())
            .await
            .map_err(|err| match err {
                LifecycleError::GrantStateConflict(arms) => {
                    LifecycleError::InvalidRequestArm(arms)
                }
                LifecycleError::Database(db) => {
                    LifecycleError::UnableToRequestArmAccess(db.to_string())
                }
                other => other,
            })?;

        info!(user_id = %user.id, request_id = %request_id, arms = created.len(), "filed access request");

        let actor = Actor::user(user.identity.clone());
        for grant in &created {
            self.audit_append(AuditEventInput::grant_transition(
                user.identity.clone(),
                actor.clone(),
                grant.arm_id,
                None,
                GrantStatus::Requested,
            ))
            .await;
        }

        self.notify(
            &[user.identity.email.clone()],
            TemplateKey::RequestSubmitted,
            serde_json::json!({
                "arms": arm_ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }),
        )
        .await;

        let admins = self.repo.list_admins().await.unwrap_or_default();
        let recipients: Vec<String> =
            admins.iter().map(|a| a.identity.email.clone()).collect();
        if !recipients.is_empty() {
            self.notify(
                &recipients,
                TemplateKey::RequestPendingReview,
                serde_json::json!({
                    "user": user.identity.to_string(),
                    "arms": arm_ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                }),
            )
            .await;
        }

        Ok(created)
    }

    /// Resolve the session to a persisted user, running the login and
    /// provider preconditions first.
    pub(crate) async fn authenticated_user(&self, session: &SessionContext) -> Result<User> {
        check_all(&[
            Precondition::Login(&session.identity),
            Precondition::IdentityProvider {
                identity: &session.identity,
                allowed: &self.config.allowed_identity_providers,
            },
        ])?;
        self.repo
            .find_user(&session.identity)
            .await?
            .ok_or_else(|| LifecycleError::UserNotFound(session.identity.clone()))
    }

    async fn requestable_arm_ids(&self, arm_ids: &[ArmId]) -> Result<Vec<ArmId>> {
        Ok(self
            .repo
            .find_arms(arm_ids)
            .await?
            .into_iter()
            .map(|arm| arm.id)
            .collect())
    }

    async fn approved_count(&self, user: &User) -> Result<usize> {
        Ok(self
            .repo
            .grants_for_user(user.id)
            .await?
            .iter()
            .filter(|g| g.status == GrantStatus::Approved)
            .count())
    }

    /// Diff, then append one field-change event per changed tracked field.
    pub(crate) async fn audit_field_changes(
        &self,
        before: &UserSnapshot,
        after: &User,
        actor: Actor,
    ) {
        let after_snapshot = UserSnapshot::capture(after);
        for change in diff_snapshots(before, &after_snapshot) {
            self.audit_append(AuditEventInput::field_changed(
                after.identity.clone(),
                actor.clone(),
                change.field.name(),
                change.old,
                change.new,
            ))
            .await;
        }
    }

    /// Append an audit event; failures are logged and isolated.
    pub(crate) async fn audit_append(&self, input: AuditEventInput) {
        if let Err(err) = self.audit.append(input).await {
            warn!(error = %err, "failed to append audit event");
        }
    }

    /// Fire-and-forget notification send.
    pub(crate) async fn notify(
        &self,
        recipients: &[String],
        template: TemplateKey,
        variables: serde_json::Value,
    ) {
        if let Err(err) = self.notifier.send(recipients, template, variables).await {
            warn!(error = %err, ?template, "notification dispatch failed");
        }
    }
}

fn transition_kind(target: GrantStatus) -> TransitionKind {
    match target {
        GrantStatus::Revoked => TransitionKind::Revoke,
        _ => TransitionKind::Review,
    }
}

fn translate_conflict(err: LifecycleError, kind: TransitionKind) -> LifecycleError {
    match (err, kind) {
        (LifecycleError::GrantStateConflict(arms), TransitionKind::Review) => {
            LifecycleError::InvalidReviewArms(arms)
        }
        (LifecycleError::GrantStateConflict(arms), TransitionKind::Revoke) => {
            LifecycleError::InvalidRevokeArms(arms)
        }
        (other, _) => other,
    }
}

/// Preserve first-occurrence order while dropping duplicates.
fn dedupe(arm_ids: &[ArmId]) -> Vec<ArmId> {
    let mut seen = Vec::with_capacity(arm_ids.len());
    for id in arm_ids {
        if !seen.contains(id) {
            seen.push(*id);
        }
    }
    seen
}
