//! Authentication extractors for the admin console.
//!
//! The logged-in admin lives in the session as a [`CurrentAdmin`] snapshot.
//! HTML requests without one are redirected to the login page; `/api/`
//! requests get 401.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, Uri, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use lucky_draw_core::Principal;

use crate::models::{CurrentAdmin, session_keys};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/auth/login";

/// Whether the request expects a machine-readable response.
#[must_use]
pub fn is_api_request(uri: &Uri) -> bool {
    uri.path().starts_with("/api/")
}

/// Read the admin snapshot from the session.
///
/// A missing or unreadable entry counts as logged out.
pub async fn load_current_admin(session: &Session) -> Option<CurrentAdmin> {
    match session.get::<CurrentAdmin>(session_keys::CURRENT_ADMIN).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable admin session entry");
            None
        }
    }
}

/// Extractor that requires admin authentication.
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required but nobody is logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl AdminAuthRejection {
    /// The rejection that fits the request.
    #[must_use]
    pub const fn for_request(is_api: bool) -> Self {
        if is_api {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin = load_current_admin(session)
            .await
            .ok_or_else(|| AdminAuthRejection::for_request(is_api_request(&parts.uri)))?;

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
pub struct OptionalAdminAuth(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdminAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => load_current_admin(session).await,
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Extractor that requires a super admin.
pub struct RequireSuperAdmin(pub CurrentAdmin);

/// Error returned when super admin authentication is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperAdminRejection {
    NotLoggedIn(AdminAuthRejection),
    /// Logged in, but not a super admin.
    Forbidden,
}

impl IntoResponse for SuperAdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotLoggedIn(rejection) => rejection.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only super admins can access this resource",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = SuperAdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAdminAuth(admin) = RequireAdminAuth::from_request_parts(parts, state)
            .await
            .map_err(SuperAdminRejection::NotLoggedIn)?;

        if !admin.is_super_admin() {
            return Err(SuperAdminRejection::Forbidden);
        }

        Ok(Self(admin))
    }
}

/// Store the admin snapshot in the session (login, or refresh after a self-edit).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Remove the admin snapshot from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}
