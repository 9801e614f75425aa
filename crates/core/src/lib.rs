//! Lucky Draw Core - Shared types library.
//!
//! This crate provides the types shared by every Lucky Draw admin component:
//! - `admin` - Admin console server (sessions, guards, admin management API)
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Permission evaluation lives here so that the server, the
//! CLI and the tests all answer "may this admin do X" the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, page keys and permission maps
//! - [`access`] - The permission evaluator ([`Principal`])

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod types;

pub use access::Principal;
pub use types::*;
