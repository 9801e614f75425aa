//! Admin roles.

use serde::{Deserialize, Serialize};

/// Admin role.
///
/// The role decides how the permission map is read: a super admin holds every
/// level on every page regardless of what is stored, the other roles get
/// exactly what their map says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    /// Implicit access to everything. Only created outside the console.
    SuperAdmin,
    /// Day-to-day contest operator.
    Admin,
    /// Limited, mostly read-only operator.
    Moderator,
}

impl AdminRole {
    /// Every role, most privileged first.
    pub const ALL: [Self; 3] = [Self::SuperAdmin, Self::Admin, Self::Moderator];

    /// Wire and database spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Admin => "ADMIN",
            Self::Moderator => "MODERATOR",
        }
    }

    /// Whether an admin can hand this role to another admin from the console.
    ///
    /// Super admins are bootstrapped from the CLI; the console never creates
    /// or promotes one.
    #[must_use]
    pub const fn is_assignable(self) -> bool {
        !matches!(self, Self::SuperAdmin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SUPER_ADMIN" | "SUPERADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "MODERATOR" => Ok(Self::Moderator),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_common_spellings() {
        assert_eq!("SUPER_ADMIN".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
        assert_eq!("super_admin".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
        assert_eq!("super-admin".parse::<AdminRole>().unwrap(), AdminRole::SuperAdmin);
        assert_eq!("admin".parse::<AdminRole>().unwrap(), AdminRole::Admin);
        assert_eq!(" Moderator ".parse::<AdminRole>().unwrap(), AdminRole::Moderator);
        assert!("viewer".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        for role in AdminRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{role}\""));
        }
    }

    #[test]
    fn test_only_super_admin_is_unassignable() {
        assert!(!AdminRole::SuperAdmin.is_assignable());
        assert!(AdminRole::Admin.is_assignable());
        assert!(AdminRole::Moderator.is_assignable());
    }
}
