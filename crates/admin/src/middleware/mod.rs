//! HTTP middleware stack for the admin console.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Page guards (`route_layer` per route group, or extractors per handler)

pub mod auth;
pub mod guard;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, RequireSuperAdmin, clear_current_admin,
    set_current_admin,
};
pub use guard::{
    AdminManagementRead, AdminManagementUpdate, AdminManagementWrite, Gate, GuardRejection,
    PageAccess, RequirePage, RequirePageExt, authorize,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
