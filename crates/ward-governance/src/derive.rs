//! Derived-status synchronization and audit diffing.
//!
//! A user's role and status are never set directly by a review operation;
//! they are recomputed from the grant set after every mutation. The functions
//! here are pure so every rule is testable in isolation.

use tracing::warn;
use ward_core::{Role, UserStatus};

use crate::types::User;

/// The fields audited on every user mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    FirstName,
    LastName,
    Organization,
    Role,
    Status,
}

impl TrackedField {
    /// All tracked fields, in diff order.
    pub const ALL: [TrackedField; 5] = [
        TrackedField::FirstName,
        TrackedField::LastName,
        TrackedField::Organization,
        TrackedField::Role,
        TrackedField::Status,
    ];

    /// Wire name of the field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Organization => "organization",
            Self::Role => "role",
            Self::Status => "status",
        }
    }
}

/// A point-in-time image of a user's tracked fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSnapshot {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl UserSnapshot {
    /// Capture the tracked fields of a user record.
    #[must_use]
    pub fn capture(user: &User) -> Self {
        Self {
            first_name: Some(user.first_name.clone()),
            last_name: Some(user.last_name.clone()),
            organization: Some(user.organization.clone()),
            role: Some(user.role.to_string()),
            status: Some(user.status.to_string()),
        }
    }

    fn field(&self, field: TrackedField) -> &Option<String> {
        match field {
            TrackedField::FirstName => &self.first_name,
            TrackedField::LastName => &self.last_name,
            TrackedField::Organization => &self.organization,
            TrackedField::Role => &self.role,
            TrackedField::Status => &self.status,
        }
    }
}

/// One changed field between a pre- and post-image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// Diff two snapshots across the tracked fields.
///
/// A field present in the pre-image but absent in the post-image is a
/// data-integrity problem: it is logged and excluded from the change set
/// rather than silently skipped.
#[must_use]
pub fn diff_snapshots(before: &UserSnapshot, after: &UserSnapshot) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    for field in TrackedField::ALL {
        let old = before.field(field);
        let new = after.field(field);
        match (old, new) {
            (Some(_), None) => {
                warn!(
                    field = field.name(),
                    "tracked field present before update but missing afterwards"
                );
            }
            _ if old != new => {
                changes.push(FieldChange {
                    field,
                    old: old.clone(),
                    new: new.clone(),
                });
            }
            _ => {}
        }
    }
    changes
}

/// Role after an approval: a non-member becomes a member, others keep theirs.
#[must_use]
pub fn role_after_approval(current: Role) -> Role {
    match current {
        Role::NonMember => Role::Member,
        other => other,
    }
}

/// Status after an approval: unreviewed/inactive accounts become active;
/// an already-active account is untouched.
#[must_use]
pub fn status_after_approval(current: UserStatus) -> UserStatus {
    if current.is_promotable() {
        UserStatus::Active
    } else {
        current
    }
}

/// Status derived from the number of approved grants the user retains.
#[must_use]
pub fn status_for_approved_count(approved: usize) -> UserStatus {
    if approved > 0 {
        UserStatus::Active
    } else {
        UserStatus::Inactive
    }
}

/// Outcome of demoting an admin to a non-admin role.
///
/// Admin accounts carry no standing grants of their own, so the new role is
/// always `member` regardless of what was requested, and status is recomputed
/// from the approved grants alone.
#[must_use]
pub fn demotion_outcome(approved: usize) -> (Role, UserStatus) {
    (Role::Member, status_for_approved_count(approved))
}
