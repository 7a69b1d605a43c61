//! Ward Core Library
//!
//! Shared types for ward, the access-grant lifecycle service.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`UserId`, `ArmId`, `GrantId`, `RequestId`)
//! - [`identity`] - The (email, identity-provider) identity pair and its
//!   boundary normalization
//! - [`types`] - Closed role/status enumerations for users and access grants
//!
//! Role and status values arrive from external systems as free-form strings.
//! They are normalized exactly once, at the boundary ([`identity::Identity::new`]
//! and the `FromStr` impls in [`types`]); everything past that point compares
//! enum values, never strings.

pub mod identity;
pub mod ids;
pub mod types;

pub use identity::Identity;
pub use ids::{ArmId, GrantId, ParseIdError, RequestId, UserId};
pub use types::{GrantStatus, ParseEnumError, Role, UserStatus};
