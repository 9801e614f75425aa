//! Activity log endpoint.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use lucky_draw_core::{AdminId, PageKey, PermissionLevel};

use crate::error::AppError;
use crate::middleware::RequirePageExt;
use crate::models::ActivityEntry;
use crate::services::AdminService;
use crate::state::AppState;

/// Rows returned when the client does not ask for a limit.
const DEFAULT_LIMIT: i64 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/activity", get(list_activity))
        .require_page(PageKey::AdminManagement, PermissionLevel::Read)
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    limit: Option<i64>,
    admin_id: Option<AdminId>,
}

/// GET /api/activity?limit=&admin_id=
#[instrument(skip(state))]
async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, AppError> {
    let service = AdminService::new(state.pool());
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let entries = match query.admin_id {
        Some(id) => service.activity_for(id, limit).await?,
        None => service.recent_activity(limit).await?,
    };

    Ok(Json(entries))
}
