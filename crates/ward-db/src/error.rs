//! Error types for the ward-db crate.

use thiserror::Error;

/// Setup errors raised before the repository takes over.
///
/// Query and row-conversion failures inside the repository surface as the
/// domain error type instead, so callers see one error taxonomy.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),
}
