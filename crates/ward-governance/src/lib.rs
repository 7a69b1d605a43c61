//! Access-grant lifecycle governance.
//!
//! Users authenticate through an external identity provider and request
//! access to named data resources (arms). Administrators approve, reject, or
//! revoke those requests; a user's role and status are derived from the
//! resulting grant set, never set directly. A scheduled inactivity sweep
//! disables accounts that have not logged in within the configured threshold.
//!
//! The [`engine::LifecycleEngine`] is the single entry point: it evaluates
//! ordered preconditions, drives grant transitions through the
//! [`store::GrantRepository`], synchronizes derived role/status, appends
//! audit events, and dispatches notifications.

pub mod audit;
pub mod conditions;
pub mod config;
pub mod derive;
pub mod engine;
pub mod error;
pub mod notify;
pub mod seed;
pub mod store;
pub mod sweep;
pub mod types;

pub use audit::{Actor, AuditAction, AuditEvent, AuditEventInput, AuditStore, InMemoryAuditStore};
pub use config::{EngineConfig, DEFAULT_INACTIVITY_THRESHOLD_DAYS};
pub use engine::{
    LifecycleEngine, APPROVE_SOURCE_STATES, REJECT_SOURCE_STATES, REVOKE_SOURCE_STATES,
};
pub use error::{ErrorKind, LifecycleError, Result};
pub use notify::{
    EmailNotifier, NotificationConfig, NotificationDispatcher, NotifyError, TemplateKey,
};
pub use seed::{seed_arms, seed_initial_admin, ArmSeed};
pub use store::{
    CreateUserRecord, GrantRepository, InMemoryGrantRepository, ReviewStamp, UserUpdate,
};
pub use sweep::SweepOutcome;
pub use types::{
    AccessGrant, Arm, EditUserInput, ProfileUpdate, RegisterUserInput, RequestAccessInput,
    ReviewInput, SessionContext, User,
};
