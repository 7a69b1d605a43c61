//! Audit event row model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use ward_core::{ArmId, Identity};
use ward_governance::{Actor, AuditAction, AuditEvent, AuditEventInput};

fn action_to_str(action: &AuditAction) -> &'static str {
    match action {
        AuditAction::FieldChanged => "field_changed",
        AuditAction::GrantTransition => "grant_transition",
    }
}

fn action_from_str(s: &str) -> Option<AuditAction> {
    match s {
        "field_changed" => Some(AuditAction::FieldChanged),
        "grant_transition" => Some(AuditAction::GrantTransition),
        _ => None,
    }
}

/// A row from the `audit_events` table.
#[derive(Debug, Clone, FromRow)]
pub struct AuditEventRow {
    pub id: Uuid,
    pub action: String,
    pub subject_email: String,
    pub subject_provider: String,
    pub actor_type: String,
    pub actor_email: Option<String>,
    pub actor_provider: Option<String>,
    pub field: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub arm_id: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEventRow {
    /// Convert into the domain event. Rows with an unknown action or a
    /// malformed actor are corrupt.
    pub fn into_domain(self) -> Result<AuditEvent, String> {
        let action = action_from_str(&self.action)
            .ok_or_else(|| format!("unknown audit action {:?}", self.action))?;
        let actor = match self.actor_type.as_str() {
            "system" => Actor::System,
            "user" => match (self.actor_email, self.actor_provider) {
                (Some(email), Some(provider)) => Actor::User {
                    identity: Identity { email, provider },
                },
                _ => return Err("user actor row missing identity".to_string()),
            },
            other => return Err(format!("unknown actor type {other:?}")),
        };
        Ok(AuditEvent {
            id: self.id,
            action,
            subject: Identity {
                email: self.subject_email,
                provider: self.subject_provider,
            },
            actor,
            field: self.field,
            old_value: self.old_value,
            new_value: self.new_value,
            arm_id: self.arm_id.map(ArmId::from_uuid),
            timestamp: self.recorded_at,
        })
    }

    /// Append an event.
    pub async fn insert<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        input: &AuditEventInput,
    ) -> Result<Self, sqlx::Error> {
        let (actor_type, actor_email, actor_provider) = match &input.actor {
            Actor::System => ("system", None, None),
            Actor::User { identity } => (
                "user",
                Some(identity.email.clone()),
                Some(identity.provider.clone()),
            ),
        };
        sqlx::query_as(
            r#"
            INSERT INTO audit_events
                (id, action, subject_email, subject_provider,
                 actor_type, actor_email, actor_provider,
                 field, old_value, new_value, arm_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(action_to_str(&input.action))
        .bind(&input.subject.email)
        .bind(&input.subject.provider)
        .bind(actor_type)
        .bind(actor_email)
        .bind(actor_provider)
        .bind(input.field.as_deref())
        .bind(input.old_value.as_deref())
        .bind(input.new_value.as_deref())
        .bind(input.arm_id.map(Uuid::from))
        .fetch_one(executor)
        .await
    }

    /// Events recorded for a subject, oldest first.
    pub async fn find_for_subject<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        subject: &Identity,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM audit_events
            WHERE subject_email = $1 AND subject_provider = $2
            ORDER BY recorded_at
            "#,
        )
        .bind(&subject.email)
        .bind(&subject.provider)
        .fetch_all(executor)
        .await
    }
}
