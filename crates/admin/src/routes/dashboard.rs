//! Dashboard page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Extension, Router, routing::get};

use lucky_draw_core::{PageKey, PermissionLevel};

use crate::middleware::{Gate, RequirePageExt};
use crate::models::CurrentAdmin;
use crate::routes::me::{NavItem, navigation, page_href};
use crate::state::AppState;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    admin_name: String,
    role: &'static str,
    navigation: Vec<NavItem>,
    manage_admins: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .require_page(PageKey::Dashboard, PermissionLevel::Read)
}

/// GET /
async fn dashboard(Extension(admin): Extension<CurrentAdmin>) -> DashboardTemplate {
    let manage_admins = Gate::new(&admin).show_with(
        PageKey::AdminManagement,
        PermissionLevel::Write,
        || page_href(PageKey::AdminManagement),
    );

    DashboardTemplate {
        navigation: navigation(&admin),
        role: admin.role.as_str(),
        admin_name: admin.name,
        manage_admins,
    }
}
