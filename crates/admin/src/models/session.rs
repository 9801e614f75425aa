//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use lucky_draw_core::{AdminId, AdminRole, Email, PagePermissions, Principal};

use super::admin_user::AdminUser;

/// Session-stored admin identity.
///
/// Snapshot of the admin record taken at login. Guards evaluate permissions
/// against this snapshot, so edits made by another admin take effect on the
/// target's next login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role.
    pub role: AdminRole,
    /// Stored page permissions at login time.
    #[serde(default)]
    pub permissions: PagePermissions,
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(admin: &AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            permissions: admin.permissions.clone(),
        }
    }
}

impl From<AdminUser> for CurrentAdmin {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
            permissions: admin.permissions,
        }
    }
}

impl Principal for CurrentAdmin {
    fn role(&self) -> AdminRole {
        self.role
    }

    fn permissions(&self) -> &PagePermissions {
        &self.permissions
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";
}
