//! Precondition checks gating every mutating operation.
//!
//! Conditions are composed as an ordered list and evaluated in the order
//! supplied; the first failure short-circuits. Ordering matters because later
//! checks may assume earlier ones passed (an arm-existence check assumes the
//! request parameters were non-empty). Each check returns a structured
//! outcome rather than panicking, so control flow stays explicit.

use ward_core::{ArmId, GrantStatus, Identity};

use crate::error::{LifecycleError, Result};
use crate::types::{AccessGrant, User};

/// Which failure kind a grant-state check surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Approve or reject; failures surface as `INVALID_REVIEW_ARMS`.
    Review,
    /// Revoke; failures surface as `INVALID_REVOKE_ARMS`.
    Revoke,
}

/// A single precondition check.
#[derive(Debug)]
pub enum Precondition<'a> {
    /// Session identity has both an email and an identity provider.
    Login(&'a Identity),
    /// Identity provider is on the configured allow-list.
    IdentityProvider {
        identity: &'a Identity,
        allowed: &'a [String],
    },
    /// Caller holds the admin role with active status.
    AdminPermission(&'a User),
    /// Caller holds one of the general (non-admin) roles.
    GeneralUser(&'a User),
    /// Caller is not administratively disabled.
    NotDisabled(&'a User),
    /// The requested arm-id list is non-empty.
    ArmRequestParams(&'a [ArmId]),
    /// Every requested arm resolved to a currently requestable arm.
    ArmsExist {
        requested: &'a [ArmId],
        requestable: &'a [ArmId],
    },
    /// Every targeted grant currently sits in a legal source state.
    GrantStateForTransition {
        grants: &'a [AccessGrant],
        targets: &'a [ArmId],
        allowed_sources: &'a [GrantStatus],
        kind: TransitionKind,
    },
}

impl Precondition<'_> {
    /// Evaluate the condition: `Ok(())` on pass, the specific failure kind
    /// otherwise.
    pub fn check(&self) -> Result<()> {
        match self {
            Self::Login(identity) => {
                if identity.is_complete() {
                    Ok(())
                } else {
                    Err(LifecycleError::NotLoggedIn)
                }
            }
            Self::IdentityProvider { identity, allowed } => {
                if allowed.iter().any(|p| p == &identity.provider) {
                    Ok(())
                } else {
                    Err(LifecycleError::InvalidIdp(identity.provider.clone()))
                }
            }
            Self::AdminPermission(user) => {
                if user.role.is_admin() && user.status == ward_core::UserStatus::Active {
                    Ok(())
                } else {
                    Err(LifecycleError::NotAuthorized)
                }
            }
            Self::GeneralUser(user) => {
                if user.role.is_general() {
                    Ok(())
                } else {
                    Err(LifecycleError::NotGeneralUser)
                }
            }
            Self::NotDisabled(user) => {
                if user.status.is_disabled() {
                    Err(LifecycleError::NotAuthorized)
                } else {
                    Ok(())
                }
            }
            Self::ArmRequestParams(arm_ids) => {
                if arm_ids.is_empty() {
                    Err(LifecycleError::MissingArmRequestInputs)
                } else {
                    Ok(())
                }
            }
            Self::ArmsExist {
                requested,
                requestable,
            } => {
                let invalid: Vec<ArmId> = requested
                    .iter()
                    .filter(|id| !requestable.contains(id))
                    .copied()
                    .collect();
                if invalid.is_empty() {
                    Ok(())
                } else {
                    Err(LifecycleError::InvalidRequestArm(invalid))
                }
            }
            Self::GrantStateForTransition {
                grants,
                targets,
                allowed_sources,
                kind,
            } => {
                let conflicting: Vec<ArmId> = targets
                    .iter()
                    .filter(|arm_id| {
                        !grants.iter().any(|g| {
                            g.arm_id == **arm_id && allowed_sources.contains(&g.status)
                        })
                    })
                    .copied()
                    .collect();
                if conflicting.is_empty() {
                    Ok(())
                } else {
                    match kind {
                        TransitionKind::Review => {
                            Err(LifecycleError::InvalidReviewArms(conflicting))
                        }
                        TransitionKind::Revoke => {
                            Err(LifecycleError::InvalidRevokeArms(conflicting))
                        }
                    }
                }
            }
        }
    }
}

/// Evaluate conditions in order, surfacing the first failure.
pub fn check_all(conditions: &[Precondition<'_>]) -> Result<()> {
    for condition in conditions {
        condition.check()?;
    }
    Ok(())
}
