//! Endpoints describing the logged-in admin.

use axum::{
    Json, Router,
    extract::Query,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lucky_draw_core::{
    AdminId, AdminRole, Email, PageKey, PagePermissions, PermissionLevel, Principal,
};

use crate::middleware::{Gate, RequireAdminAuth};
use crate::models::CurrentAdmin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(me))
        .route("/api/me/permissions", get(my_permissions))
        .route("/api/me/check", get(check))
        .route("/api/navigation", get(navigation_api))
}

/// The logged-in admin as clients see it.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub is_super_admin: bool,
    /// What the evaluator applies (the full map for a super admin).
    pub permissions: PagePermissions,
    pub accessible_pages: Vec<PageKey>,
}

impl From<&CurrentAdmin> for MeResponse {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            is_super_admin: admin.is_super_admin(),
            permissions: admin.effective_permissions(),
            accessible_pages: admin.accessible_pages(),
        }
    }
}

/// One entry of the page navigation.
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub key: PageKey,
    pub label: &'static str,
    pub href: String,
    /// Levels held on the page, `read` always among them.
    pub levels: Vec<&'static str>,
}

/// URL of a console page.
#[must_use]
pub fn page_href(page: PageKey) -> String {
    format!("/{}", page.as_str().replace('_', "-"))
}

/// Pages the admin may read, in navigation order.
pub fn navigation<P: Principal>(admin: &P) -> Vec<NavItem> {
    let gate = Gate::new(admin);
    PageKey::ALL
        .into_iter()
        .filter_map(|page| {
            gate.show_with(page, PermissionLevel::Read, || NavItem {
                key: page,
                label: page.label(),
                href: page_href(page),
                levels: PermissionLevel::ALL
                    .into_iter()
                    .filter(|level| gate.allows(page, *level))
                    .map(PermissionLevel::as_str)
                    .collect(),
            })
        })
        .collect()
}

/// GET /api/me
async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<MeResponse> {
    Json(MeResponse::from(&admin))
}

#[derive(Debug, Serialize)]
struct PermissionsResponse {
    role: AdminRole,
    permissions: PagePermissions,
}

/// GET /api/me/permissions
async fn my_permissions(RequireAdminAuth(admin): RequireAdminAuth) -> Json<PermissionsResponse> {
    Json(PermissionsResponse {
        role: admin.role,
        permissions: admin.effective_permissions(),
    })
}

#[derive(Debug, Deserialize)]
struct CheckQuery {
    page: String,
    level: String,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    page: String,
    level: String,
    allowed: bool,
}

/// Check one permission by its wire names.
///
/// Unknown page keys or levels are simply not allowed (except for a super admin).
///
/// GET /api/me/check?page=&level=
#[instrument(skip(admin), fields(admin_id = %admin.id))]
async fn check(
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<CheckQuery>,
) -> Json<CheckResponse> {
    let allowed = admin.has_permission_str(&query.page, &query.level);
    Json(CheckResponse {
        page: query.page,
        level: query.level,
        allowed,
    })
}

/// GET /api/navigation
async fn navigation_api(RequireAdminAuth(admin): RequireAdminAuth) -> Json<Vec<NavItem>> {
    Json(navigation(&admin))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn admin(role: AdminRole, permissions: PagePermissions) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminId::new(7),
            email: Email::parse("nav@example.org").unwrap(),
            name: "Nav".to_owned(),
            role,
            permissions,
        }
    }

    #[test]
    fn test_page_href() {
        assert_eq!(page_href(PageKey::Dashboard), "/dashboard");
        assert_eq!(page_href(PageKey::AdminManagement), "/admin-management");
    }

    #[test]
    fn test_navigation_follows_read_permission() {
        let mut permissions = PagePermissions::new();
        permissions.grant(PageKey::Contests, PermissionLevel::Read);
        permissions.grant(PageKey::Contests, PermissionLevel::Update);
        permissions.grant(PageKey::Draw, PermissionLevel::Write);

        let nav = navigation(&admin(AdminRole::Moderator, permissions));

        // Write without read does not put a page in the navigation
        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].key, PageKey::Contests);
        assert_eq!(nav[0].levels, vec!["read", "update"]);
    }

    #[test]
    fn test_navigation_super_admin_sees_everything() {
        let nav = navigation(&admin(AdminRole::SuperAdmin, PagePermissions::new()));
        assert_eq!(nav.len(), PageKey::ALL.len());
        assert!(nav.iter().all(|item| item.levels.len() == 3));
    }

    #[test]
    fn test_me_response_reports_effective_map() {
        let root = admin(AdminRole::SuperAdmin, PagePermissions::new());
        let response = MeResponse::from(&root);
        assert!(response.is_super_admin);
        assert_eq!(response.permissions, PagePermissions::full());
        assert_eq!(response.accessible_pages.len(), PageKey::ALL.len());

        let empty = admin(AdminRole::Admin, PagePermissions::new());
        let response = MeResponse::from(&empty);
        assert!(response.permissions.is_empty());
        assert!(response.accessible_pages.is_empty());
    }
}
