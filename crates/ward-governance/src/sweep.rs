//! The inactivity sweep.
//!
//! A scheduled pass over all enabled users: anyone whose most recent login
//! predates the configured threshold is disabled, and any admins among them
//! are additionally demoted to member. Disabling is one batch transaction;
//! demotion is a second, independent one, so a demotion failure never undoes
//! the disable.

use chrono::{Duration, Utc};
use tracing::{error, info, instrument, warn};
use ward_core::{Identity, UserStatus};

use crate::audit::{Actor, AuditEventInput};
use crate::derive::TrackedField;
use crate::engine::LifecycleEngine;
use crate::error::{LifecycleError, Result};
use crate::notify::TemplateKey;

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Users selected as inactive.
    pub selected: usize,
    /// Users disabled this run.
    pub disabled: u64,
    /// Admins demoted to member this run.
    pub demoted: usize,
    /// Identities of the users disabled this run.
    pub disabled_users: Vec<Identity>,
}

impl LifecycleEngine {
    /// Run the inactivity sweep once.
    ///
    /// Selecting zero users is a successful no-op. Selecting users and then
    /// disabling zero rows means the batch silently failed and surfaces as an
    /// internal error.
    #[instrument(skip(self))]
    pub async fn run_inactivity_sweep(&self) -> Result<SweepOutcome> {
        let config = self.config();
        let cutoff = Utc::now() - Duration::days(config.inactivity_threshold_days);
        let repo = self.repository();

        let inactive = repo
            .find_inactive_users(cutoff, config.match_login_email_case_insensitively)
            .await?;
        if inactive.is_empty() {
            info!("inactivity sweep selected no users");
            return Ok(SweepOutcome::default());
        }

        let user_ids: Vec<_> = inactive.iter().map(|u| u.id).collect();
        let disabled = repo.disable_users(&user_ids).await?;
        if disabled == 0 {
            error!(
                selected = inactive.len(),
                "inactivity sweep disabled zero of the selected users"
            );
            return Err(LifecycleError::Internal(
                "inactivity sweep failed to disable selected users".to_string(),
            ));
        }

        for user in &inactive {
            self.audit_append(AuditEventInput::field_changed(
                user.identity.clone(),
                Actor::System,
                TrackedField::Status.name(),
                Some(user.status.to_string()),
                Some(UserStatus::Disabled.to_string()),
            ))
            .await;
            self.notify(
                &[user.identity.email.clone()],
                TemplateKey::UserDisabled,
                serde_json::json!({ "threshold_days": config.inactivity_threshold_days }),
            )
            .await;
        }

        // Demotion is best-effort after the disable has committed.
        let demoted = match repo.demote_admins_to_member(&user_ids).await {
            Ok(demoted) => {
                for user in &demoted {
                    self.audit_append(AuditEventInput::field_changed(
                        user.identity.clone(),
                        Actor::System,
                        TrackedField::Role.name(),
                        Some(ward_core::Role::Admin.to_string()),
                        Some(user.role.to_string()),
                    ))
                    .await;
                }
                demoted
            }
            Err(err) => {
                warn!(error = %err, "admin demotion pass failed after disable committed");
                Vec::new()
            }
        };

        let outcome = SweepOutcome {
            selected: inactive.len(),
            disabled,
            demoted: demoted.len(),
            disabled_users: inactive.iter().map(|u| u.identity.clone()).collect(),
        };
        info!(
            selected = outcome.selected,
            disabled = outcome.disabled,
            demoted = outcome.demoted,
            "inactivity sweep complete"
        );

        let admins = repo.list_admins().await.unwrap_or_default();
        let recipients: Vec<String> = admins.iter().map(|a| a.identity.email.clone()).collect();
        if !recipients.is_empty() {
            self.notify(
                &recipients,
                TemplateKey::InactivityDigest,
                serde_json::json!({
                    "selected": outcome.selected,
                    "disabled": outcome.disabled,
                    "demoted": outcome.demoted,
                }),
            )
            .await;
        }

        Ok(outcome)
    }
}
