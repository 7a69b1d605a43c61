//! HTTP handlers.

pub mod arms;
pub mod requests;
pub mod reviews;
pub mod users;
