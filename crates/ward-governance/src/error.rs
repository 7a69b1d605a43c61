//! Error taxonomy for lifecycle operations.
//!
//! Every failure maps to a stable [`ErrorKind`] plus a severity class (the
//! HTTP-status-equivalent of the failure) through a static lookup. Precondition
//! failures are raised before any store mutation; store failures propagate as
//! the opaque `Database` variant and are never retried here.

use thiserror::Error;
use ward_core::{ArmId, Identity};

/// Result type alias for lifecycle operations.
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Domain error for the access-grant lifecycle engine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Session identity is missing an email or identity provider.
    #[error("Caller is not logged in")]
    NotLoggedIn,

    /// Caller lacks the privilege the operation requires.
    #[error("Caller is not authorized for this operation")]
    NotAuthorized,

    /// Identity provider is not on the configured allow-list.
    #[error("Identity provider is not allowed: {0}")]
    InvalidIdp(String),

    /// Role value failed to parse at the boundary.
    #[error("Invalid role value: {0}")]
    InvalidRole(String),

    /// Status value failed to parse at the boundary.
    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    /// A user with this identity already exists.
    #[error("User already exists: {0}")]
    NotUnique(Identity),

    /// The request batch contains arms that do not exist or are already held
    /// in a live state. Any invalid arm voids the entire batch.
    #[error("Request contains arms that are not requestable: {0:?}")]
    InvalidRequestArm(Vec<ArmId>),

    /// The request carried no arm ids.
    #[error("No arms were supplied with the request")]
    MissingArmRequestInputs,

    /// Approve/reject targeted grants outside the legal source states.
    #[error("Review targets grants outside the legal source states: {0:?}")]
    InvalidReviewArms(Vec<ArmId>),

    /// Revoke targeted grants that are not currently approved.
    #[error("Revoke targets grants that are not approved: {0:?}")]
    InvalidRevokeArms(Vec<ArmId>),

    /// Caller is an administrator attempting a self-service operation.
    #[error("Caller is not a general user")]
    NotGeneralUser,

    /// Registration requested admin role together with arm access.
    #[error("Admin accounts cannot request arm access")]
    InvalidAdminArmRequest,

    /// No user record matches the identity.
    #[error("User not found: {0}")]
    UserNotFound(Identity),

    /// Registration failed at the store after preconditions passed.
    #[error("Unable to register user: {0}")]
    UnableToRegisterUser(String),

    /// Grant creation failed at the store after preconditions passed.
    #[error("Unable to request arm access: {0}")]
    UnableToRequestArmAccess(String),

    /// A transition found grants whose persisted state no longer matches the
    /// expected source-state set. Raised inside the repository's
    /// read-validate-write step; operations translate it to the
    /// review/revoke-specific kind before surfacing.
    #[error("Grant state conflict on arms: {0:?}")]
    GrantStateConflict(Vec<ArmId>),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Store-transaction failure; opaque, no automatic retry.
    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Stable error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotLoggedIn,
    NotAuthorized,
    InvalidIdp,
    InvalidRole,
    InvalidStatus,
    NotUnique,
    InvalidRequestArm,
    MissingArmRequestInputs,
    InvalidReviewArms,
    InvalidRevokeArms,
    NotGeneralUser,
    InvalidAdminArmRequest,
    UserNotFound,
    UnableToRegisterUser,
    UnableToRequestArmAccess,
    Internal,
}

impl ErrorKind {
    /// Stable wire code for the kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotLoggedIn => "NOT_LOGGED_IN",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::InvalidIdp => "INVALID_IDP",
            Self::InvalidRole => "INVALID_ROLE",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::NotUnique => "NOT_UNIQUE",
            Self::InvalidRequestArm => "INVALID_REQUEST_ARM",
            Self::MissingArmRequestInputs => "MISSING_ARM_REQUEST_INPUTS",
            Self::InvalidReviewArms => "INVALID_REVIEW_ARMS",
            Self::InvalidRevokeArms => "INVALID_REVOKE_ARMS",
            Self::NotGeneralUser => "NOT_GENERAL_USER",
            Self::InvalidAdminArmRequest => "INVALID_ADMIN_ARM_REQUEST",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::UnableToRegisterUser => "UNABLE_TO_REGISTER_USER",
            Self::UnableToRequestArmAccess => "UNABLE_TO_REQUEST_ARM_ACCESS",
            Self::Internal => "INTERNAL",
        }
    }

    /// HTTP-status-equivalent severity class for the kind.
    ///
    /// 400 for input/validation errors, 401/403 for auth errors, 409 for
    /// state-conflict errors, 500 for internal failures.
    #[must_use]
    pub fn severity_class(&self) -> u16 {
        match self {
            Self::InvalidRole
            | Self::InvalidStatus
            | Self::InvalidRequestArm
            | Self::MissingArmRequestInputs
            | Self::InvalidAdminArmRequest
            | Self::UserNotFound => 400,
            Self::NotLoggedIn | Self::InvalidIdp => 401,
            Self::NotAuthorized | Self::NotGeneralUser => 403,
            Self::NotUnique | Self::InvalidReviewArms | Self::InvalidRevokeArms => 409,
            Self::UnableToRegisterUser | Self::UnableToRequestArmAccess | Self::Internal => 500,
        }
    }
}

impl LifecycleError {
    /// The stable kind for this error. Unknown/internal failures collapse to
    /// [`ErrorKind::Internal`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLoggedIn => ErrorKind::NotLoggedIn,
            Self::NotAuthorized => ErrorKind::NotAuthorized,
            Self::InvalidIdp(_) => ErrorKind::InvalidIdp,
            Self::InvalidRole(_) => ErrorKind::InvalidRole,
            Self::InvalidStatus(_) => ErrorKind::InvalidStatus,
            Self::NotUnique(_) => ErrorKind::NotUnique,
            Self::InvalidRequestArm(_) => ErrorKind::InvalidRequestArm,
            Self::MissingArmRequestInputs => ErrorKind::MissingArmRequestInputs,
            Self::InvalidReviewArms(_) => ErrorKind::InvalidReviewArms,
            Self::InvalidRevokeArms(_) => ErrorKind::InvalidRevokeArms,
            Self::NotGeneralUser => ErrorKind::NotGeneralUser,
            Self::InvalidAdminArmRequest => ErrorKind::InvalidAdminArmRequest,
            Self::UserNotFound(_) => ErrorKind::UserNotFound,
            Self::UnableToRegisterUser(_) => ErrorKind::UnableToRegisterUser,
            Self::UnableToRequestArmAccess(_) => ErrorKind::UnableToRequestArmAccess,
            // State conflicts that escape an operation untranslated still
            // surface as conflicts, not internal errors.
            Self::GrantStateConflict(_) => ErrorKind::InvalidReviewArms,
            Self::Internal(_) | Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Severity class shorthand.
    #[must_use]
    pub fn severity_class(&self) -> u16 {
        self.kind().severity_class()
    }
}

impl From<ward_core::ParseEnumError> for LifecycleError {
    fn from(err: ward_core::ParseEnumError) -> Self {
        if err.kind == "role" {
            Self::InvalidRole(err.value)
        } else {
            Self::InvalidStatus(err.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(ErrorKind::NotLoggedIn.code(), "NOT_LOGGED_IN");
        assert_eq!(ErrorKind::InvalidRequestArm.code(), "INVALID_REQUEST_ARM");
        assert_eq!(
            ErrorKind::UnableToRequestArmAccess.code(),
            "UNABLE_TO_REQUEST_ARM_ACCESS"
        );
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(ErrorKind::NotLoggedIn.severity_class(), 401);
        assert_eq!(ErrorKind::InvalidIdp.severity_class(), 401);
        assert_eq!(ErrorKind::NotAuthorized.severity_class(), 403);
        assert_eq!(ErrorKind::NotGeneralUser.severity_class(), 403);
        assert_eq!(ErrorKind::MissingArmRequestInputs.severity_class(), 400);
        assert_eq!(ErrorKind::NotUnique.severity_class(), 409);
        assert_eq!(ErrorKind::InvalidReviewArms.severity_class(), 409);
        assert_eq!(ErrorKind::Internal.severity_class(), 500);
    }

    #[test]
    fn test_internal_fallback() {
        let err = LifecycleError::Internal("boom".to_string());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.severity_class(), 500);
    }

    #[test]
    fn test_parse_error_conversion() {
        let err: LifecycleError = "bogus".parse::<ward_core::Role>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidRole);

        let err: LifecycleError = "bogus".parse::<ward_core::UserStatus>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidStatus);
    }

    #[test]
    fn test_untranslated_conflict_is_a_conflict() {
        let err = LifecycleError::GrantStateConflict(vec![]);
        assert_eq!(err.severity_class(), 409);
    }
}
