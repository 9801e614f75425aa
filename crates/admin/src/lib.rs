//! Lucky Draw admin console library.
//!
//! Page-level access control for the console: admins carry a role and a
//! per-page permission map, and every page and API route is guarded by the
//! page and level it needs. The binary wires these modules into a server; the
//! CLI and integration tests use them directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
