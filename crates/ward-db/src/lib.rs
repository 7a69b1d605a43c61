//! Postgres persistence for the access-grant lifecycle engine.
//!
//! Provides the production [`PgGrantRepository`] and [`PgAuditStore`]
//! implementations, the row models behind them, embedded migrations, and
//! pool setup.

pub mod audit;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod repository;

pub use audit::PgAuditStore;
pub use error::DbError;
pub use migrations::run_migrations;
pub use pool::{connect, connect_with, DEFAULT_MAX_CONNECTIONS};
pub use repository::PgGrantRepository;
