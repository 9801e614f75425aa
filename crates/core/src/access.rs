//! Permission evaluation.
//!
//! Anything that has a role and a stored permission map can answer access
//! questions by implementing [`Principal`]. The provided methods are the only
//! place the super-admin short-circuit lives; guards and handlers call them
//! rather than looking at the map directly.
//!
//! ```
//! use lucky_draw_core::{AdminRole, PageKey, PagePermissions, PermissionLevel, Principal};
//!
//! struct Viewer(PagePermissions);
//!
//! impl Principal for Viewer {
//!     fn role(&self) -> AdminRole {
//!         AdminRole::Moderator
//!     }
//!     fn permissions(&self) -> &PagePermissions {
//!         &self.0
//!     }
//! }
//!
//! let viewer = Viewer(PagePermissions::defaults_for(AdminRole::Moderator));
//! assert!(viewer.can_read(PageKey::Contests));
//! assert!(!viewer.can_write(PageKey::Contests));
//! assert!(!viewer.has_permission_str("flow_builder", "read"));
//! ```

use crate::types::{AdminRole, PageKey, PagePermissions, PermissionLevel};

/// An authenticated admin, for access decisions.
pub trait Principal {
    /// The admin's role.
    fn role(&self) -> AdminRole;

    /// The admin's stored permission map.
    fn permissions(&self) -> &PagePermissions;

    /// Whether the admin holds every permission implicitly.
    fn is_super_admin(&self) -> bool {
        self.role() == AdminRole::SuperAdmin
    }

    /// True iff super admin, or `level` is stored for `page`.
    fn has_permission(&self, page: PageKey, level: PermissionLevel) -> bool {
        self.is_super_admin() || self.permissions().contains(page, level)
    }

    fn can_read(&self, page: PageKey) -> bool {
        self.has_permission(page, PermissionLevel::Read)
    }

    fn can_write(&self, page: PageKey) -> bool {
        self.has_permission(page, PermissionLevel::Write)
    }

    fn can_update(&self, page: PageKey) -> bool {
        self.has_permission(page, PermissionLevel::Update)
    }

    /// String-keyed check for untyped callers (query strings, templates).
    ///
    /// A page key or level that doesn't parse grants nothing, except to a
    /// super admin who is allowed everything.
    fn has_permission_str(&self, page: &str, level: &str) -> bool {
        if self.is_super_admin() {
            return true;
        }
        match (page.parse::<PageKey>(), level.parse::<PermissionLevel>()) {
            (Ok(page), Ok(level)) => self.permissions().contains(page, level),
            _ => false,
        }
    }

    /// Whether the admin holds any level at all on `page`.
    fn has_any(&self, page: PageKey) -> bool {
        self.is_super_admin() || self.permissions().levels(page).next().is_some()
    }

    /// Pages the admin can open, in navigation order.
    fn accessible_pages(&self) -> Vec<PageKey> {
        PageKey::ALL
            .into_iter()
            .filter(|page| self.can_read(*page))
            .collect()
    }

    /// The map the evaluator actually applies.
    ///
    /// For a super admin that is the full map, whatever is stored.
    fn effective_permissions(&self) -> PagePermissions {
        if self.is_super_admin() {
            PagePermissions::full()
        } else {
            self.permissions().clone()
        }
    }
}

impl<P: Principal + ?Sized> Principal for &P {
    fn role(&self) -> AdminRole {
        (**self).role()
    }

    fn permissions(&self) -> &PagePermissions {
        (**self).permissions()
    }
}
