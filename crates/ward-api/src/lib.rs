//! HTTP surface for the access-grant lifecycle engine.
//!
//! Thin handlers over [`ward_governance::LifecycleEngine`]: bodies are
//! validated at the boundary, the engine enforces every domain rule, and
//! failures map to HTTP statuses through the error taxonomy's severity
//! classes.

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod session;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use router::{api_router, ApiState};
pub use session::Session;
