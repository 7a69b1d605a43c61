//! Closed role and status enumerations.
//!
//! The source systems exchange these as strings with inconsistent casing.
//! Parsing is case-insensitive and happens once at the boundary; internal
//! comparison is always exact enum equality.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a role or status string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} value: {value:?}")]
pub struct ParseEnumError {
    /// Which enumeration failed to parse ("role" or "status").
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

/// A user's role.
///
/// Derived from grant state for the member/non-member split; `admin` is
/// conferred administratively and is independent of grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Holds no approved grants and no administrative privilege.
    #[serde(rename = "non-member")]
    NonMember,
    /// Holds (or has held) at least one approved grant.
    #[serde(rename = "member")]
    Member,
    /// Reviews access requests; has no standing grants of their own.
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    /// Whether the role is one of the general (non-administrative) roles.
    #[must_use]
    pub fn is_general(&self) -> bool {
        matches!(self, Self::NonMember | Self::Member)
    }

    /// Whether the role carries administrative privilege.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonMember => write!(f, "non-member"),
            Self::Member => write!(f, "member"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "non-member" | "non_member" | "nonmember" => Ok(Self::NonMember),
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseEnumError {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// A user's derived account status.
///
/// Never set directly by a review operation; recomputed from the user's
/// grant set and activity after every grant mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    /// Never reviewed; the empty string on the wire.
    #[serde(rename = "")]
    Unreviewed,
    /// No approved grants remain.
    #[serde(rename = "inactive")]
    Inactive,
    /// At least one approved grant and not administratively disabled.
    #[serde(rename = "active")]
    Active,
    /// Disabled by the inactivity sweep or an administrator.
    #[serde(rename = "disabled")]
    Disabled,
}

impl UserStatus {
    /// Whether the account may act at all.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Whether the account is in a state approve may promote to active.
    #[must_use]
    pub fn is_promotable(&self) -> bool {
        matches!(self, Self::Unreviewed | Self::Inactive)
    }
}

impl Display for UserStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreviewed => write!(f, ""),
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(Self::Unreviewed),
            "inactive" => Ok(Self::Inactive),
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// Review state of an access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    /// Awaiting review.
    Requested,
    /// Access granted by an administrator.
    Approved,
    /// Denied while requested.
    Rejected,
    /// Withdrawn after having been approved.
    Revoked,
}

impl GrantStatus {
    /// Whether a grant in this state blocks a fresh request for the same arm.
    ///
    /// Rejected and revoked grants do not: re-requesting those arms replaces
    /// the old grant with a new requested one.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Requested | Self::Approved)
    }
}

impl Display for GrantStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Requested => write!(f, "requested"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

impl FromStr for GrantStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "requested" => Ok(Self::Requested),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "revoked" => Ok(Self::Revoked),
            _ => Err(ParseEnumError {
                kind: "grant status",
                value: s.to_string(),
            }),
        }
    }
}
