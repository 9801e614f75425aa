//! Page permission guards.
//!
//! Three ways to put a page permission in front of something:
//!
//! - [`RequirePage`]: extractor for a single handler, parameterised by a
//!   [`PageAccess`] marker such as [`AdminManagementWrite`].
//! - [`RequirePageExt::require_page`]: route layer for a whole group of routes.
//! - [`Gate`]: render-or-fallback for values inside a handler (navigation
//!   entries, optional page sections).
//!
//! All of them go through [`authorize`], which reads the permissions cached
//! in the session at login.

use std::marker::PhantomData;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use lucky_draw_core::{PageKey, PermissionLevel, Principal};

use super::auth::{LOGIN_PATH, is_api_request, load_current_admin};
use crate::models::CurrentAdmin;

/// Path of the access denied page.
pub const ACCESS_DENIED_PATH: &str = "/access-denied";

/// Why a guard refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// Not logged in, HTML request.
    RedirectToLogin,
    /// Not logged in, API request.
    Unauthorized,
    /// Logged in without the permission, HTML request.
    AccessDenied { page: PageKey },
    /// Logged in without the permission, API request.
    Forbidden {
        page: PageKey,
        level: PermissionLevel,
    },
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response(),
            Self::AccessDenied { page } => {
                Redirect::to(&format!("{ACCESS_DENIED_PATH}?page={page}")).into_response()
            }
            Self::Forbidden { page, level } => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "page": page,
                    "level": level,
                })),
            )
                .into_response(),
        }
    }
}

/// The decision every guard makes.
///
/// # Errors
///
/// Returns the rejection that fits the request when `admin` is absent or
/// lacks `level` on `page`.
pub fn authorize<P: Principal + ?Sized>(
    admin: Option<&P>,
    page: PageKey,
    level: PermissionLevel,
    is_api: bool,
) -> Result<(), GuardRejection> {
    let Some(admin) = admin else {
        return Err(if is_api {
            GuardRejection::Unauthorized
        } else {
            GuardRejection::RedirectToLogin
        });
    };

    if admin.has_permission(page, level) {
        return Ok(());
    }

    Err(if is_api {
        GuardRejection::Forbidden { page, level }
    } else {
        GuardRejection::AccessDenied { page }
    })
}

// =============================================================================
// Handler extractor
// =============================================================================

/// A page and level a handler requires.
pub trait PageAccess: Send + Sync + 'static {
    const PAGE: PageKey;
    const LEVEL: PermissionLevel;
}

/// Declare [`PageAccess`] markers.
macro_rules! page_access {
    ($($(#[$meta:meta])* $name:ident => $page:ident : $level:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl $crate::middleware::guard::PageAccess for $name {
                const PAGE: ::lucky_draw_core::PageKey = ::lucky_draw_core::PageKey::$page;
                const LEVEL: ::lucky_draw_core::PermissionLevel =
                    ::lucky_draw_core::PermissionLevel::$level;
            }
        )+
    };
}

page_access! {
    /// List and view admins.
    AdminManagementRead => AdminManagement: Read;
    /// Create and delete admins.
    AdminManagementWrite => AdminManagement: Write;
    /// Edit admins and their permissions.
    AdminManagementUpdate => AdminManagement: Update;
}

/// Extractor that requires `A::LEVEL` on `A::PAGE`.
///
/// ```rust,ignore
/// async fn delete_admin(
///     RequirePage(admin, _): RequirePage<AdminManagementWrite>,
/// ) -> impl IntoResponse { /* ... */ }
/// ```
pub struct RequirePage<A: PageAccess>(pub CurrentAdmin, pub PhantomData<A>);

impl<A: PageAccess> RequirePage<A> {
    #[must_use]
    pub fn into_admin(self) -> CurrentAdmin {
        self.0
    }
}

impl<S, A> FromRequestParts<S> for RequirePage<A>
where
    S: Send + Sync,
    A: PageAccess,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_api = is_api_request(&parts.uri);
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => load_current_admin(session).await,
            None => None,
        };

        authorize(admin.as_ref(), A::PAGE, A::LEVEL, is_api)?;

        match admin {
            Some(admin) => Ok(Self(admin, PhantomData)),
            None => Err(GuardRejection::Unauthorized),
        }
    }
}

// =============================================================================
// Route layer
// =============================================================================

/// Page and level required by a route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequirement {
    pub page: PageKey,
    pub level: PermissionLevel,
}

async fn page_guard(
    State(required): State<PageRequirement>,
    mut request: Request,
    next: Next,
) -> Response {
    let is_api = is_api_request(request.uri());
    let session = request.extensions().get::<Session>().cloned();
    let admin = match session {
        Some(session) => load_current_admin(&session).await,
        None => None,
    };

    if let Err(rejection) = authorize(admin.as_ref(), required.page, required.level, is_api) {
        tracing::debug!(
            page = %required.page,
            level = %required.level,
            path = %request.uri().path(),
            "page guard rejected request"
        );
        return rejection.into_response();
    }

    if let Some(admin) = admin {
        request.extensions_mut().insert(admin);
    }
    next.run(request).await
}

/// Put a page permission in front of every route of a router.
pub trait RequirePageExt {
    /// Require `level` on `page` for all routes added so far.
    #[must_use]
    fn require_page(self, page: PageKey, level: PermissionLevel) -> Self;
}

impl<S> RequirePageExt for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn require_page(self, page: PageKey, level: PermissionLevel) -> Self {
        self.route_layer(middleware::from_fn_with_state(
            PageRequirement { page, level },
            page_guard,
        ))
    }
}

// =============================================================================
// Render-or-fallback
// =============================================================================

/// Show a value only to admins who hold a permission.
///
/// ```rust,ignore
/// let gate = Gate::new(&admin);
/// let delete_button = gate.show(PageKey::Contests, PermissionLevel::Write, button);
/// let label = gate.show_or(PageKey::Draw, PermissionLevel::Update, "Run draw", "View draw");
/// ```
pub struct Gate<'a, P: Principal + ?Sized> {
    admin: Option<&'a P>,
}

impl<'a, P: Principal + ?Sized> Gate<'a, P> {
    #[must_use]
    pub const fn new(admin: &'a P) -> Self {
        Self { admin: Some(admin) }
    }

    /// A gate for a possibly anonymous visitor; nothing passes without an admin.
    #[must_use]
    pub const fn optional(admin: Option<&'a P>) -> Self {
        Self { admin }
    }

    #[must_use]
    pub fn allows(&self, page: PageKey, level: PermissionLevel) -> bool {
        self.admin.is_some_and(|admin| admin.has_permission(page, level))
    }

    /// `Some(value)` if permitted, otherwise `None`.
    pub fn show<T>(&self, page: PageKey, level: PermissionLevel, value: T) -> Option<T> {
        self.allows(page, level).then_some(value)
    }

    /// Like [`Gate::show`], building the value only when permitted.
    pub fn show_with<T>(
        &self,
        page: PageKey,
        level: PermissionLevel,
        build: impl FnOnce() -> T,
    ) -> Option<T> {
        self.allows(page, level).then(build)
    }

    /// `value` if permitted, otherwise `fallback`.
    pub fn show_or<T>(&self, page: PageKey, level: PermissionLevel, value: T, fallback: T) -> T {
        if self.allows(page, level) {
            value
        } else {
            fallback
        }
    }
}
