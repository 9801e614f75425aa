//! HTTP route handlers for the admin console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (database ping)
//!
//! # Auth
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Email + password login (form or JSON)
//! POST /auth/logout                 - Logout
//! GET  /access-denied?page=         - Shown when a page guard refuses an HTML request
//!
//! # Dashboard                       (dashboard: read)
//! GET  /                            - Navigation for the logged-in admin
//!
//! # Current admin                   (logged in)
//! GET  /api/me                      - Profile and effective permissions
//! GET  /api/me/permissions          - Effective permission map
//! GET  /api/me/check?page=&level=   - Single permission check
//! GET  /api/navigation              - Pages the admin can open
//!
//! # Admin management                (admin_management)
//! GET    /api/admins                - List admins             (read)
//! POST   /api/admins                - Create admin            (write)
//! GET    /api/admins/{id}           - Get admin               (read)
//! PUT    /api/admins/{id}           - Edit admin              (update)
//! DELETE /api/admins/{id}           - Delete admin            (write)
//! PUT    /api/admins/{id}/permissions - Replace permissions   (update)
//! PUT    /api/admins/{id}/password    - Reset password        (super admin only)
//! GET    /api/activity              - Activity log            (read)
//! ```

pub mod activity;
pub mod admins;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod me;

use axum::Router;

use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(me::router())
        .merge(admins::router())
        .merge(activity::router())
}
