//! Ward API server.
//!
//! Wires the Postgres stores into the lifecycle engine, runs migrations and
//! startup seeding, serves the HTTP surface, and schedules the inactivity
//! sweep.

mod config;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use ward_api::api_router;
use ward_core::Identity;
use ward_db::{PgAuditStore, PgGrantRepository};
use ward_governance::{
    seed_initial_admin, AuditStore, EmailNotifier, GrantRepository, LifecycleEngine,
    NotificationDispatcher,
};

use config::Config;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    if let Err(err) = run(config).await {
        error!(error = %err, "server exited with error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_addr = %config.bind_addr,
        "Starting ward server"
    );

    let pool = ward_db::connect(&config.database_url).await?;
    ward_db::run_migrations(&pool).await?;

    let repo: Arc<dyn GrantRepository> = Arc::new(PgGrantRepository::new(pool.clone()));
    let audit: Arc<dyn AuditStore> = Arc::new(PgAuditStore::new(pool));
    let notifier: Arc<dyn NotificationDispatcher> =
        Arc::new(EmailNotifier::new(config.notification_config()));

    if let Some(email) = &config.seed_admin_email {
        let identity = Identity::new(email, &config.seed_admin_provider);
        seed_initial_admin(repo.as_ref(), identity, "Initial", "Administrator").await?;
    }

    let engine = Arc::new(LifecycleEngine::new(
        repo,
        audit,
        notifier,
        config.engine_config(),
    ));

    if config.sweep_interval_secs > 0 {
        spawn_sweep_scheduler(Arc::clone(&engine), config.sweep_interval_secs);
    } else {
        warn!("sweep scheduler disabled");
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, api_router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Run the inactivity sweep on a fixed interval.
///
/// The first tick fires immediately so a long-stopped deployment catches up
/// on restart. Sweep failures are logged; the scheduler keeps running.
fn spawn_sweep_scheduler(engine: Arc<LifecycleEngine>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match engine.run_inactivity_sweep().await {
                Ok(outcome) => {
                    info!(
                        selected = outcome.selected,
                        disabled = outcome.disabled,
                        demoted = outcome.demoted,
                        "scheduled sweep finished"
                    );
                }
                Err(err) => {
                    error!(error = %err, "scheduled sweep failed");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
