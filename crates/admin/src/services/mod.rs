//! Business logic services for the admin console.
//!
//! # Services
//!
//! - `auth` - Email + password login (Argon2id)
//! - `admins` - Admin management rules and activity logging

pub mod admins;
pub mod auth;

pub use admins::{AdminService, ServiceError};
pub use auth::{AuthError, AuthService};
