//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default inactivity threshold before the sweep disables an account.
pub const DEFAULT_INACTIVITY_THRESHOLD_DAYS: i64 = 30;

/// Configuration for the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Identity providers accepted at login.
    pub allowed_identity_providers: Vec<String>,

    /// Days without a login before the sweep disables an account.
    pub inactivity_threshold_days: i64,

    /// Whether the sweep matches login-event emails case-insensitively.
    ///
    /// Identity equality everywhere else is exact. This single flag covers
    /// the one place the source system compared loosely.
    pub match_login_email_case_insensitively: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allowed_identity_providers: vec!["google".to_string(), "orcid".to_string()],
            inactivity_threshold_days: DEFAULT_INACTIVITY_THRESHOLD_DAYS,
            match_login_email_case_insensitively: true,
        }
    }
}

impl EngineConfig {
    /// Whether the provider is on the allow-list.
    #[must_use]
    pub fn provider_allowed(&self, provider: &str) -> bool {
        self.allowed_identity_providers
            .iter()
            .any(|p| p == provider)
    }
}
