//! Server configuration, loaded from flags or the environment.

use clap::Parser;
use ward_governance::{EngineConfig, NotificationConfig, DEFAULT_INACTIVITY_THRESHOLD_DAYS};

/// Ward API server.
#[derive(Debug, Parser)]
#[command(name = "ward-server", version, about)]
pub struct Config {
    /// Postgres connection string.
    #[arg(long, env = "WARD_DATABASE_URL")]
    pub database_url: String,

    /// Address to bind the HTTP listener to.
    #[arg(long, env = "WARD_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Identity providers accepted at login, comma separated.
    #[arg(
        long,
        env = "WARD_ALLOWED_PROVIDERS",
        value_delimiter = ',',
        default_values_t = vec!["google".to_string(), "orcid".to_string()]
    )]
    pub allowed_providers: Vec<String>,

    /// Days without a login before the sweep disables an account.
    #[arg(
        long,
        env = "WARD_INACTIVITY_THRESHOLD_DAYS",
        default_value_t = DEFAULT_INACTIVITY_THRESHOLD_DAYS
    )]
    pub inactivity_threshold_days: i64,

    /// How often the sweep scheduler runs, in seconds. Zero disables it.
    #[arg(long, env = "WARD_SWEEP_INTERVAL_SECS", default_value_t = 86_400)]
    pub sweep_interval_secs: u64,

    /// Email of the initial administrator seeded at startup.
    #[arg(long, env = "WARD_SEED_ADMIN_EMAIL")]
    pub seed_admin_email: Option<String>,

    /// Identity provider of the initial administrator.
    #[arg(long, env = "WARD_SEED_ADMIN_PROVIDER", default_value = "google")]
    pub seed_admin_provider: String,

    /// Enable outbound email notifications.
    #[arg(long, env = "WARD_NOTIFICATIONS_ENABLED", default_value_t = false)]
    pub notifications_enabled: bool,

    /// SMTP host for notifications.
    #[arg(long, env = "WARD_SMTP_HOST")]
    pub smtp_host: Option<String>,

    /// SMTP port for notifications.
    #[arg(long, env = "WARD_SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// From address for notifications.
    #[arg(long, env = "WARD_FROM_EMAIL")]
    pub from_email: Option<String>,
}

impl Config {
    /// Engine configuration derived from the flags.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            allowed_identity_providers: self.allowed_providers.clone(),
            inactivity_threshold_days: self.inactivity_threshold_days,
            ..EngineConfig::default()
        }
    }

    /// Notification configuration derived from the flags.
    pub fn notification_config(&self) -> NotificationConfig {
        NotificationConfig {
            enabled: self.notifications_enabled,
            smtp_host: self.smtp_host.clone(),
            smtp_port: Some(self.smtp_port),
            from_email: self.from_email.clone(),
            from_name: Some("ward".to_string()),
        }
    }
}
