//! Notification dispatch.
//!
//! Notifications are fire-and-forget relative to the state transition: they
//! run after commit and their failure is logged, never propagated, and never
//! rolls back a committed mutation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Errors that can occur during notification dispatch.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP configuration error.
    #[error("SMTP configuration error: {0}")]
    Configuration(String),

    /// Failed to send email.
    #[error("Failed to send email: {0}")]
    SendFailed(String),
}

/// Template keys for outbound mail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKey {
    /// To the requester after a request is filed.
    RequestSubmitted,
    /// To administrators when a request awaits review.
    RequestPendingReview,
    /// To the user after approve/reject/revoke, summarizing the arms affected.
    ReviewCompleted,
    /// To a user disabled by the inactivity sweep.
    UserDisabled,
    /// Digest to administrators after a sweep run.
    InactivityDigest,
}

/// Configuration for the email notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether notifications are enabled.
    pub enabled: bool,
    /// SMTP host.
    pub smtp_host: Option<String>,
    /// SMTP port.
    pub smtp_port: Option<u16>,
    /// From email address.
    pub from_email: Option<String>,
    /// From name.
    pub from_name: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: None,
            smtp_port: Some(587),
            from_email: None,
            from_name: Some("ward".to_string()),
        }
    }
}

/// Trait for notification backends.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Send one templated message to the recipients.
    async fn send(
        &self,
        recipients: &[String],
        template: TemplateKey,
        variables: serde_json::Value,
    ) -> Result<(), NotifyError>;
}

/// Email dispatcher driven by [`NotificationConfig`].
pub struct EmailNotifier {
    config: NotificationConfig,
}

impl EmailNotifier {
    /// Create a new email notifier.
    #[must_use]
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    /// Create a disabled notifier.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(NotificationConfig::default())
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for EmailNotifier {
    async fn send(
        &self,
        recipients: &[String],
        template: TemplateKey,
        variables: serde_json::Value,
    ) -> Result<(), NotifyError> {
        if !self.config.enabled {
            debug!(?template, "notifications disabled, skipping");
            return Ok(());
        }

        let smtp_host = self.config.smtp_host.as_ref().ok_or_else(|| {
            NotifyError::Configuration("SMTP host not configured".to_string())
        })?;
        let from_email = self.config.from_email.as_ref().ok_or_else(|| {
            NotifyError::Configuration("From email not configured".to_string())
        })?;

        info!(
            smtp_host,
            from = from_email,
            recipients = recipients.len(),
            ?template,
            %variables,
            "dispatching notification email"
        );

        Ok(())
    }
}

/// A notification captured by [`RecordingDispatcher`].
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub recipients: Vec<String>,
    pub template: TemplateKey,
    pub variables: serde_json::Value,
}

/// Test dispatcher that records every send; can be made to fail to exercise
/// the fire-and-forget path.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Arc<RwLock<Vec<SentNotification>>>,
    fail: bool,
}

impl RecordingDispatcher {
    /// Create a recording dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create one whose sends always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
            fail: true,
        }
    }

    /// All recorded sends.
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }

    /// Number of sends attempted.
    pub async fn count(&self) -> usize {
        self.sent.read().await.len()
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(
        &self,
        recipients: &[String],
        template: TemplateKey,
        variables: serde_json::Value,
    ) -> Result<(), NotifyError> {
        self.sent.write().await.push(SentNotification {
            recipients: recipients.to_vec(),
            template,
            variables,
        });
        if self.fail {
            return Err(NotifyError::SendFailed("recording dispatcher set to fail".to_string()));
        }
        Ok(())
    }
}
