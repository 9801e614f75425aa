//! Admin management API.
//!
//! Each handler names the `admin_management` level it needs through its
//! [`RequirePage`] extractor. The rules that hold regardless of permissions
//! (super admin immutability, no self-deletion) live in [`AdminService`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use lucky_draw_core::{AdminId, AdminRole, Email, PagePermissions, Principal};

use crate::error::AppError;
use crate::middleware::{
    AdminManagementRead, AdminManagementUpdate, AdminManagementWrite, RequirePage,
    RequireSuperAdmin, set_current_admin,
};
use crate::models::{AdminUpdate, AdminUser, CurrentAdmin, NewAdmin, admin_user::validate_name};
use crate::services::AdminService;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admins", get(list_admins).post(create_admin))
        .route(
            "/api/admins/{id}",
            get(get_admin).put(update_admin).delete(delete_admin),
        )
        .route("/api/admins/{id}/permissions", put(replace_permissions))
        .route("/api/admins/{id}/password", put(reset_password))
}

/// Admin record as returned by the API.
#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    /// The stored map.
    pub permissions: PagePermissions,
    /// The map guards apply.
    pub effective_permissions: PagePermissions,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AdminUser> for AdminResponse {
    fn from(admin: AdminUser) -> Self {
        let effective_permissions = admin.effective_permissions();
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
            permissions: admin.permissions,
            effective_permissions,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

/// Decode a permission map from a request body.
///
/// Anything malformed is a 400; it never falls back to an empty map, since
/// saving one would revoke all of the target's access.
fn parse_permissions(value: &Value) -> Result<PagePermissions, AppError> {
    PagePermissions::from_json(value).map_err(|e| AppError::BadRequest(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    /// Starting permissions; the role defaults when absent.
    #[serde(default)]
    pub permissions: Option<Value>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CreateAdminRequest {
    fn into_new_admin(self) -> Result<(NewAdmin, Option<String>), AppError> {
        let permissions = self.permissions.as_ref().map(parse_permissions).transpose()?;
        let new = NewAdmin::new(self.email, &self.name, self.role, permissions)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        Ok((new, self.password))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateAdminRequest {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<AdminRole>,
    /// Replaces the whole stored map when present.
    pub permissions: Option<Value>,
}

impl UpdateAdminRequest {
    fn into_update(self) -> Result<AdminUpdate, AppError> {
        let name = self
            .name
            .as_deref()
            .map(validate_name)
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let permissions = self.permissions.as_ref().map(parse_permissions).transpose()?;

        Ok(AdminUpdate {
            name,
            email: self.email,
            role: self.role,
            permissions,
        })
    }
}

/// Refresh the session snapshot when an admin edits their own record.
async fn refresh_if_self(
    session: &Session,
    actor: &CurrentAdmin,
    updated: &AdminUser,
) -> Result<(), AppError> {
    if actor.id == updated.id {
        set_current_admin(session, &CurrentAdmin::from(updated)).await?;
        tracing::debug!(admin_id = %updated.id, "session refreshed after self-edit");
    }
    Ok(())
}

/// GET /api/admins
#[instrument(skip_all)]
async fn list_admins(
    State(state): State<AppState>,
    _guard: RequirePage<AdminManagementRead>,
) -> Result<Json<Vec<AdminResponse>>, AppError> {
    let admins = AdminService::new(state.pool()).list().await?;
    Ok(Json(admins.into_iter().map(AdminResponse::from).collect()))
}

/// POST /api/admins
#[instrument(skip_all, fields(actor = %actor.id))]
async fn create_admin(
    State(state): State<AppState>,
    RequirePage(actor, _): RequirePage<AdminManagementWrite>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), AppError> {
    let (new, password) = request.into_new_admin()?;

    let admin = AdminService::new(state.pool())
        .create(actor.id, new, password.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(AdminResponse::from(admin))))
}

/// GET /api/admins/{id}
#[instrument(skip(state, _guard))]
async fn get_admin(
    State(state): State<AppState>,
    _guard: RequirePage<AdminManagementRead>,
    Path(id): Path<AdminId>,
) -> Result<Json<AdminResponse>, AppError> {
    let admin = AdminService::new(state.pool()).get(id).await?;
    Ok(Json(AdminResponse::from(admin)))
}

/// PUT /api/admins/{id}
#[instrument(skip(state, session, actor, request), fields(actor = %actor.id))]
async fn update_admin(
    State(state): State<AppState>,
    session: Session,
    RequirePage(actor, _): RequirePage<AdminManagementUpdate>,
    Path(id): Path<AdminId>,
    Json(request): Json<UpdateAdminRequest>,
) -> Result<Json<AdminResponse>, AppError> {
    let update = request.into_update()?;
    let admin = AdminService::new(state.pool())
        .update(actor.id, id, update)
        .await?;

    refresh_if_self(&session, &actor, &admin).await?;
    Ok(Json(AdminResponse::from(admin)))
}

/// Replace an admin's whole permission map.
///
/// PUT /api/admins/{id}/permissions
#[instrument(skip(state, session, actor, body), fields(actor = %actor.id))]
async fn replace_permissions(
    State(state): State<AppState>,
    session: Session,
    RequirePage(actor, _): RequirePage<AdminManagementUpdate>,
    Path(id): Path<AdminId>,
    Json(body): Json<Value>,
) -> Result<Json<AdminResponse>, AppError> {
    let permissions = parse_permissions(&body)?;
    let admin = AdminService::new(state.pool())
        .replace_permissions(actor.id, id, &permissions)
        .await?;

    refresh_if_self(&session, &actor, &admin).await?;
    Ok(Json(AdminResponse::from(admin)))
}

/// DELETE /api/admins/{id}
#[instrument(skip(state, actor), fields(actor = %actor.id))]
async fn delete_admin(
    State(state): State<AppState>,
    RequirePage(actor, _): RequirePage<AdminManagementWrite>,
    Path(id): Path<AdminId>,
) -> Result<StatusCode, AppError> {
    AdminService::new(state.pool()).delete(actor.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Password resets bypass the permission map: super admins only.
///
/// PUT /api/admins/{id}/password
#[instrument(skip(state, actor, request), fields(actor = %actor.id))]
async fn reset_password(
    State(state): State<AppState>,
    RequireSuperAdmin(actor): RequireSuperAdmin,
    Path(id): Path<AdminId>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    AdminService::new(state.pool())
        .reset_password(actor.id, id, &request.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lucky_draw_core::{PageKey, PermissionLevel};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request_accepts_both_permission_forms() {
        let request: CreateAdminRequest = serde_json::from_value(json!({
            "email": "New.Mod@Example.org",
            "name": "New Mod",
            "role": "MODERATOR",
            "permissions": {
                "contests": ["read"],
                "winners": { "read": true, "write": false },
            },
        }))
        .unwrap();

        assert_eq!(request.email.as_str(), "new.mod@example.org");
        assert!(request.password.is_none());
        let (new, _) = request.into_new_admin().unwrap();
        let permissions = new.initial_permissions();
        assert!(permissions.contains(PageKey::Contests, PermissionLevel::Read));
        assert!(permissions.contains(PageKey::Winners, PermissionLevel::Read));
        assert!(!permissions.contains(PageKey::Winners, PermissionLevel::Write));
    }

    #[test]
    fn test_malformed_permission_bodies_are_bad_requests() {
        let bodies = [
            json!(null),
            json!("oops"),
            json!(["read"]),
            json!(42),
            json!({ "contest": ["read"] }),
            json!({ "contests": "read" }),
            json!({ "contests": ["read", "delete"] }),
        ];
        for body in bodies {
            assert!(
                matches!(parse_permissions(&body), Err(AppError::BadRequest(_))),
                "{body} should be rejected"
            );
        }
        assert!(parse_permissions(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_create_request_rejects_malformed_permissions() {
        let request: CreateAdminRequest = serde_json::from_value(json!({
            "email": "x@example.org",
            "name": "X",
            "role": "MODERATOR",
            "permissions": { "contests": "read" },
        }))
        .unwrap();
        assert!(matches!(request.into_new_admin(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_request_rejects_malformed_permissions() {
        let request: UpdateAdminRequest =
            serde_json::from_value(json!({ "name": "Kept", "permissions": ["read"] })).unwrap();
        assert!(matches!(request.into_update(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_create_request_rejects_unknown_role() {
        let result: Result<CreateAdminRequest, _> = serde_json::from_value(json!({
            "email": "x@example.org",
            "name": "X",
            "role": "OWNER",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_request_validates_name() {
        let blank = UpdateAdminRequest {
            name: Some("   ".to_owned()),
            ..Default::default()
        };
        assert!(matches!(blank.into_update(), Err(AppError::BadRequest(_))));

        let rename = UpdateAdminRequest {
            name: Some("  Trimmed  ".to_owned()),
            ..Default::default()
        };
        assert_eq!(rename.into_update().unwrap().name.as_deref(), Some("Trimmed"));
    }

    #[test]
    fn test_update_request_missing_fields_are_none() {
        let request: UpdateAdminRequest = serde_json::from_value(json!({ "role": "ADMIN" })).unwrap();
        let update = request.into_update().unwrap();
        assert_eq!(update.role, Some(AdminRole::Admin));
        assert!(update.permissions.is_none());
        assert!(!update.touches_profile());
    }
}
