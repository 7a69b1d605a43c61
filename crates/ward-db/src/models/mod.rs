//! Row models for the ward schema.

mod access_grant;
mod arm;
mod audit_event;
mod login_event;
mod user;

pub use access_grant::GrantRow;
pub use arm::ArmRow;
pub use audit_event::AuditEventRow;
pub use login_event::LoginEventRow;
pub use user::UserRow;
