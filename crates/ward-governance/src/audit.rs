//! Audit event emission.
//!
//! Every grant state transition and every tracked-field change is recorded as
//! an immutable event against an append-only store. Events attribute the
//! change either to a human actor (by identity) or to the synthetic system
//! actor used for automated changes like the inactivity sweep, and the two
//! are distinguishable in the trail.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;
use ward_core::{ArmId, GrantStatus, Identity};

use crate::error::Result;

/// Who performed an audited change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Actor {
    /// A human actor, identified by (email, identity-provider).
    User { identity: Identity },
    /// The synthetic system actor for automated changes.
    System,
}

impl Actor {
    /// Build a human actor.
    #[must_use]
    pub fn user(identity: Identity) -> Self {
        Self::User { identity }
    }

    /// Whether this is the synthetic system actor.
    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User { identity } => write!(f, "{identity}"),
            Self::System => write!(f, "system"),
        }
    }
}

/// What an audit event records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A tracked user field changed.
    FieldChanged,
    /// An access grant entered a new state.
    GrantTransition,
}

/// An immutable audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for the event.
    pub id: Uuid,
    /// What kind of change this records.
    pub action: AuditAction,
    /// The user the change applies to.
    pub subject: Identity,
    /// Who made the change.
    pub actor: Actor,
    /// Changed field name, for field changes.
    pub field: Option<String>,
    /// Value before the change.
    pub old_value: Option<String>,
    /// Value after the change.
    pub new_value: Option<String>,
    /// Affected arm, for grant transitions.
    pub arm_id: Option<ArmId>,
    /// When the event was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Input for appending an audit event.
#[derive(Debug, Clone)]
pub struct AuditEventInput {
    pub action: AuditAction,
    pub subject: Identity,
    pub actor: Actor,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub arm_id: Option<ArmId>,
}

impl AuditEventInput {
    /// A field-change event.
    #[must_use]
    pub fn field_changed(
        subject: Identity,
        actor: Actor,
        field: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> Self {
        Self {
            action: AuditAction::FieldChanged,
            subject,
            actor,
            field: Some(field.to_string()),
            old_value,
            new_value,
            arm_id: None,
        }
    }

    /// A grant-transition event.
    #[must_use]
    pub fn grant_transition(
        subject: Identity,
        actor: Actor,
        arm_id: ArmId,
        old_status: Option<GrantStatus>,
        new_status: GrantStatus,
    ) -> Self {
        Self {
            action: AuditAction::GrantTransition,
            subject,
            actor,
            field: None,
            old_value: old_status.map(|s| s.to_string()),
            new_value: Some(new_status.to_string()),
            arm_id: Some(arm_id),
        }
    }
}

/// Trait for audit event storage backends. Append-only; no deletion.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event.
    async fn append(&self, input: AuditEventInput) -> Result<AuditEvent>;

    /// Events recorded for a subject, oldest first.
    async fn events_for(&self, subject: &Identity) -> Result<Vec<AuditEvent>>;
}

/// In-memory audit store for testing.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl InMemoryAuditStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// All events, in append order.
    pub async fn all(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }

    /// Clear all events (for testing).
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait::async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn append(&self, input: AuditEventInput) -> Result<AuditEvent> {
        let event = AuditEvent {
            id: Uuid::new_v4(),
            action: input.action,
            subject: input.subject,
            actor: input.actor,
            field: input.field,
            old_value: input.old_value,
            new_value: input.new_value,
            arm_id: input.arm_id,
            timestamp: Utc::now(),
        };
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    async fn events_for(&self, subject: &Identity) -> Result<Vec<AuditEvent>> {
        Ok(self
            .events
            .read()
            .await
            .iter()
            .filter(|e| &e.subject == subject)
            .cloned()
            .collect())
    }
}
