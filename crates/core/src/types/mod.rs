//! Core types for the Lucky Draw admin console.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod permission;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use permission::{PageKey, PagePermissions, ParseKeyError, PermissionLevel, PermissionsError};
pub use role::AdminRole;
