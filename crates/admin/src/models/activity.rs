//! Admin activity log types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use lucky_draw_core::{ActivityLogId, AdminId};

/// Something an admin did that is worth an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Login,
    Logout,
    AdminCreated,
    AdminUpdated,
    PermissionsUpdated,
    AdminDeleted,
}

impl ActivityAction {
    /// Column value in `admin.admin_activity_log.action`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::AdminCreated => "admin_created",
            Self::AdminUpdated => "admin_updated",
            Self::PermissionsUpdated => "permissions_updated",
            Self::AdminDeleted => "admin_deleted",
        }
    }
}

impl std::fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            "admin_created" => Ok(Self::AdminCreated),
            "admin_updated" => Ok(Self::AdminUpdated),
            "permissions_updated" => Ok(Self::PermissionsUpdated),
            "admin_deleted" => Ok(Self::AdminDeleted),
            other => Err(format!("unknown activity action: {other}")),
        }
    }
}

/// One row of the activity log.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub id: ActivityLogId,
    /// Admin who acted. `None` once that admin has been deleted.
    pub admin_id: Option<AdminId>,
    pub action: ActivityAction,
    /// Admin the action was applied to, if any.
    pub target_admin_id: Option<AdminId>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
