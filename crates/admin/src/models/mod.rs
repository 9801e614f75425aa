//! Domain models for the admin console.

pub mod activity;
pub mod admin_user;
pub mod session;

pub use activity::{ActivityAction, ActivityEntry};
pub use admin_user::{AdminInputError, AdminRole, AdminUpdate, AdminUser, NewAdmin};
pub use session::{CurrentAdmin, keys as session_keys};
