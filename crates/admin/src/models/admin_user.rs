//! Admin user domain types.
//!
//! These types represent validated domain objects for admin management.

use chrono::{DateTime, Utc};
use serde::Serialize;

use lucky_draw_core::{AdminId, Email, PagePermissions, Principal};

pub use lucky_draw_core::AdminRole;

/// Maximum length of an admin display name.
pub const MAX_NAME_LENGTH: usize = 100;

/// An admin user (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    /// Unique admin ID.
    pub id: AdminId,
    /// Admin's email address (login identifier).
    pub email: Email,
    /// Admin's display name.
    pub name: String,
    /// Admin's role.
    pub role: AdminRole,
    /// Stored page permissions. Ignored for super admins.
    pub permissions: PagePermissions,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
    /// When the admin was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Principal for AdminUser {
    fn role(&self) -> AdminRole {
        self.role
    }

    fn permissions(&self) -> &PagePermissions {
        &self.permissions
    }
}

/// Error returned when admin input fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminInputError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("name must be at most {MAX_NAME_LENGTH} characters")]
    NameTooLong,
}

/// Trim and validate a display name.
///
/// # Errors
///
/// Returns `AdminInputError` if the name is blank or too long.
pub fn validate_name(raw: &str) -> Result<String, AdminInputError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AdminInputError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AdminInputError::NameTooLong);
    }
    Ok(name.to_owned())
}

/// Input for creating an admin.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    /// Explicit starting permissions. `None` means the role defaults.
    pub permissions: Option<PagePermissions>,
}

impl NewAdmin {
    /// Build a validated creation input.
    ///
    /// # Errors
    ///
    /// Returns `AdminInputError` if the name is invalid.
    pub fn new(
        email: Email,
        name: &str,
        role: AdminRole,
        permissions: Option<PagePermissions>,
    ) -> Result<Self, AdminInputError> {
        Ok(Self {
            email,
            name: validate_name(name)?,
            role,
            permissions,
        })
    }

    /// The map the admin starts with.
    #[must_use]
    pub fn initial_permissions(&self) -> PagePermissions {
        self.permissions
            .clone()
            .unwrap_or_else(|| PagePermissions::defaults_for(self.role))
    }
}

/// Changes to an existing admin. `None` fields are left as they are.
///
/// `permissions`, when present, replaces the whole stored map.
#[derive(Debug, Clone, Default)]
pub struct AdminUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<AdminRole>,
    pub permissions: Option<PagePermissions>,
}

impl AdminUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.permissions.is_none()
    }

    /// Whether the update touches name or email.
    #[must_use]
    pub const fn touches_profile(&self) -> bool {
        self.name.is_some() || self.email.is_some()
    }
}
