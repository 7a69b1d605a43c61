//! Domain entities and operation inputs for the lifecycle engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ward_core::{ArmId, GrantId, GrantStatus, Identity, RequestId, Role, UserId, UserStatus};

/// A user account.
///
/// `role` and `status` are derived fields: they change only as a side effect
/// of grant-state changes, the inactivity sweep, or an administrative edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// The (email, identity-provider) pair; unique among users.
    pub identity: Identity,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Organization; defaults to the empty string.
    pub organization: String,
    /// Derived role.
    pub role: Role,
    /// Derived status.
    pub status: UserStatus,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last edited.
    pub updated_at: DateTime<Utc>,
}

/// A named access-controlled data resource.
///
/// Immutable once seeded except for ad hoc administrative import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arm {
    /// Unique identifier; referenced by every grant.
    pub id: ArmId,
    /// Display name.
    pub name: String,
    /// Short acronym.
    pub acronym: String,
}

/// The access relationship between one user and one arm.
///
/// At most one live grant exists per (user, arm); superseded grants are
/// detached, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Unique identifier.
    pub id: GrantId,
    /// Owning user.
    pub user_id: UserId,
    /// Target arm.
    pub arm_id: ArmId,
    /// Review state.
    pub status: GrantStatus,
    /// Groups grants created in the same request batch.
    pub request_id: RequestId,
    /// When the grant was requested.
    pub requested_at: DateTime<Utc>,
    /// When the grant was last reviewed, if ever.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Identity of the reviewing administrator, if reviewed.
    pub reviewer: Option<Identity>,
    /// Free-text review comment.
    pub comment: Option<String>,
}

impl AccessGrant {
    /// Whether this grant carries the review stamp an approved grant must have.
    #[must_use]
    pub fn has_review_stamp(&self) -> bool {
        self.reviewer.is_some() && self.reviewed_at.is_some()
    }
}

/// Caller identity as supplied by the session layer.
///
/// Untrusted input: the Login and IdentityProvider conditions validate it,
/// and authorization decisions use the persisted user record, never the
/// session's claimed role or status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Claimed identity.
    pub identity: Identity,
}

impl SessionContext {
    /// Build a session context, normalizing the identity.
    #[must_use]
    pub fn new(email: impl AsRef<str>, provider: impl AsRef<str>) -> Self {
        Self {
            identity: Identity::new(email, provider),
        }
    }
}

/// Mutable profile fields a user may update alongside a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// New first name, if changing.
    pub first_name: Option<String>,
    /// New last name, if changing.
    pub last_name: Option<String>,
    /// New organization, if changing.
    pub organization: Option<String>,
}

impl ProfileUpdate {
    /// Whether any field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.organization.is_none()
    }
}

/// Input for registering a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Organization; empty string when not supplied.
    #[serde(default)]
    pub organization: String,
    /// Requested role; defaults to non-member.
    pub requested_role: Option<Role>,
    /// Arms to request access to at registration time.
    #[serde(default)]
    pub arm_ids: Vec<ArmId>,
}

/// Input for requesting access to one or more arms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestAccessInput {
    /// Arms requested; deduplicated before use.
    pub arm_ids: Vec<ArmId>,
    /// Optional profile fields updated in the same call.
    pub profile: Option<ProfileUpdate>,
}

/// Input for the review operations (approve / reject / revoke).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewInput {
    /// Identity of the user under review.
    pub user: Identity,
    /// Arms whose grants are targeted.
    pub arm_ids: Vec<ArmId>,
    /// Free-text review comment stamped on every affected grant.
    pub comment: Option<String>,
}

/// Input for the administrative edit operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditUserInput {
    /// Identity of the user being edited.
    pub user: Identity,
    /// New first name, if changing.
    pub first_name: Option<String>,
    /// New last name, if changing.
    pub last_name: Option<String>,
    /// New organization, if changing.
    pub organization: Option<String>,
    /// New role, if changing.
    pub role: Option<Role>,
    /// New status, if changing (administrative override).
    pub status: Option<UserStatus>,
}
