//! User identity: the (email, identity-provider) pair.
//!
//! Identity equality is exact byte equality after the one-time boundary
//! normalization performed by [`Identity::new`] (trim + ASCII lowercase).
//! The only place the system ever compares identities loosely is the
//! inactivity sweep's login matching, which is a separate, explicitly
//! configured behavior.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A user identity drawn from an external identity provider.
///
/// The default value has both components empty, the same shape an
/// unauthenticated session produces; it never passes [`Identity::is_complete`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Email address, normalized.
    pub email: String,
    /// Identity provider key, normalized.
    pub provider: String,
}

impl Identity {
    /// Build an identity, normalizing both components.
    #[must_use]
    pub fn new(email: impl AsRef<str>, provider: impl AsRef<str>) -> Self {
        Self {
            email: email.as_ref().trim().to_ascii_lowercase(),
            provider: provider.as_ref().trim().to_ascii_lowercase(),
        }
    }

    /// Whether both components are present.
    ///
    /// Session contexts are untrusted input; either field may arrive empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.provider.is_empty()
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.email, self.provider)
    }
}
