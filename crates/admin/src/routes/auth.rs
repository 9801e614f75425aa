//! Authentication route handlers.
//!
//! Login accepts either an HTML form post or a JSON body. A successful login
//! caches the admin record, permissions included, in the session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json, Router,
    extract::{FromRequest, Query, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use lucky_draw_core::PageKey;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{LOGIN_PATH, load_current_admin};
use crate::middleware::guard::ACCESS_DENIED_PATH;
use crate::middleware::{OptionalAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::routes::me::MeResponse;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Where a successful form login lands.
const HOME_PATH: &str = "/";

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    error: Option<&'static str>,
    email: String,
}

/// Access denied page template.
#[derive(Template, WebTemplate)]
#[template(path = "access_denied.html")]
struct AccessDeniedTemplate {
    page_label: Option<&'static str>,
    admin_name: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
        .route(ACCESS_DENIED_PATH, get(access_denied))
}

/// Login credentials.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login body, from a form post or a JSON client.
pub enum LoginInput {
    Form(LoginRequest),
    Json(LoginRequest),
}

impl LoginInput {
    const fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    fn into_request(self) -> LoginRequest {
        match self {
            Self::Form(request) | Self::Json(request) => request,
        }
    }
}

impl<S> FromRequest<S> for LoginInput
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(request) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::Json(request))
        } else {
            let Form(request) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self::Form(request))
        }
    }
}

/// Render the login page.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth) -> Response {
    if admin.is_some() {
        return Redirect::to(HOME_PATH).into_response();
    }

    LoginPageTemplate {
        error: None,
        email: String::new(),
    }
    .into_response()
}

/// Log in with email and password.
///
/// POST /auth/login
#[instrument(skip_all)]
async fn login(
    State(state): State<AppState>,
    session: Session,
    input: LoginInput,
) -> Result<Response, AppError> {
    let is_json = input.is_json();
    let request = input.into_request();

    let admin = match AuthService::new(state.pool())
        .login_with_password(&request.email, &request.password)
        .await
    {
        Ok(admin) => admin,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) if !is_json => {
            tracing::info!("login rejected");
            let page = LoginPageTemplate {
                error: Some("Invalid email or password"),
                email: request.email,
            };
            return Ok((StatusCode::UNAUTHORIZED, page).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    // New session id on privilege change
    session.cycle_id().await?;

    let current = CurrentAdmin::from(admin);
    set_current_admin(&session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    tracing::info!(admin_id = %current.id, role = %current.role, "admin logged in");

    if is_json {
        Ok(Json(MeResponse::from(&current)).into_response())
    } else {
        Ok(Redirect::to(HOME_PATH).into_response())
    }
}

/// Logout and clear session.
///
/// POST /auth/logout
#[instrument(skip_all)]
async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    if let Some(admin) = load_current_admin(&session).await {
        if let Err(e) = AuthService::new(state.pool()).record_logout(admin.id).await {
            tracing::warn!(admin_id = %admin.id, error = %e, "failed to record logout");
        }
        tracing::info!(admin_id = %admin.id, "admin logged out");
    }

    clear_current_admin(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to(LOGIN_PATH))
}

#[derive(Debug, Deserialize)]
struct AccessDeniedQuery {
    page: Option<String>,
}

/// GET /access-denied?page=
async fn access_denied(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    Query(query): Query<AccessDeniedQuery>,
) -> impl IntoResponse {
    let page_label = query
        .page
        .as_deref()
        .and_then(|page| page.parse::<PageKey>().ok())
        .map(PageKey::label);

    (
        StatusCode::FORBIDDEN,
        AccessDeniedTemplate {
            page_label,
            admin_name: admin.map(|admin| admin.name),
        },
    )
}
