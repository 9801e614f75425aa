//! Admin management: creating, editing and removing console accounts.
//!
//! Route handlers have already passed the `admin_management` guard by the time
//! they get here. This layer enforces the rules that hold for every caller:
//!
//! - a super admin is never created, edited or deleted through the console
//! - nobody can hand out the super admin role
//! - nobody can delete their own account
//! - a permission edit replaces the stored map as a whole
//!
//! Holding `admin_management:update` is enough to edit any non-super admin,
//! the caller included. Granting levels the actor does not hold is allowed;
//! the guard level is the whole of the delegation check.
//!
//! Every change runs in one transaction together with its activity row, so a
//! change is either fully applied and logged or not applied at all.

use serde_json::json;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use lucky_draw_core::{AdminId, AdminRole, PagePermissions};

use crate::db::{ActivityLogRepository, AdminRepository, RepositoryError};
use crate::models::{
    ActivityAction, ActivityEntry, AdminInputError, AdminUpdate, AdminUser, NewAdmin,
};
use crate::services::auth::{self, AuthError};

/// Errors from admin management.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("admin not found")]
    NotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Repository(RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Repository(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

impl From<AdminInputError> for ServiceError {
    fn from(err: AdminInputError) -> Self {
        Self::Invalid(err.to_string())
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Whether the console may create this admin.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` for a super admin.
pub fn check_create(new: &NewAdmin) -> Result<(), ServiceError> {
    if !new.role.is_assignable() {
        return Err(ServiceError::Forbidden(
            "super admins can only be created from the CLI".to_owned(),
        ));
    }
    Ok(())
}

/// Whether `target` may be edited through the console.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` when the target is a super admin.
pub fn check_editable(target: &AdminUser) -> Result<(), ServiceError> {
    if target.role == AdminRole::SuperAdmin {
        return Err(ServiceError::Forbidden(
            "super admin accounts cannot be changed from the console".to_owned(),
        ));
    }
    Ok(())
}

/// Whether `update` may be applied to `target`.
///
/// # Errors
///
/// Returns `ServiceError::Invalid` for an empty update and
/// `ServiceError::Forbidden` if the target or the new role is super admin.
pub fn check_update(target: &AdminUser, update: &AdminUpdate) -> Result<(), ServiceError> {
    if update.is_empty() {
        return Err(ServiceError::Invalid("nothing to update".to_owned()));
    }
    check_editable(target)?;
    if update.role.is_some_and(|role| !role.is_assignable()) {
        return Err(ServiceError::Forbidden(
            "the super admin role cannot be assigned from the console".to_owned(),
        ));
    }
    Ok(())
}

/// Whether `actor` may delete `target`.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` for self-deletion or a super admin target.
pub fn check_delete(actor: AdminId, target: &AdminUser) -> Result<(), ServiceError> {
    if actor == target.id {
        return Err(ServiceError::Forbidden(
            "you cannot delete your own account".to_owned(),
        ));
    }
    check_editable(target)
}

// =============================================================================
// Service
// =============================================================================

/// Lock `id` for the rest of the transaction.
async fn lock_target(conn: &mut PgConnection, id: AdminId) -> Result<AdminUser, ServiceError> {
    AdminRepository::lock_by_id(conn, id)
        .await?
        .ok_or(ServiceError::NotFound)
}

/// Replace the stored map and log it, inside the caller's transaction.
async fn write_permissions(
    conn: &mut PgConnection,
    actor: AdminId,
    id: AdminId,
    permissions: &PagePermissions,
) -> Result<AdminUser, ServiceError> {
    let admin = AdminRepository::replace_permissions(&mut *conn, id, permissions).await?;

    ActivityLogRepository::record(
        &mut *conn,
        Some(actor),
        ActivityAction::PermissionsUpdated,
        Some(id),
        json!({ "permissions": admin.permissions }),
    )
    .await?;

    Ok(admin)
}

/// Admin management service.
pub struct AdminService<'a> {
    pool: &'a PgPool,
    admins: AdminRepository<'a>,
    activity: ActivityLogRepository<'a>,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            admins: AdminRepository::new(pool),
            activity: ActivityLogRepository::new(pool),
        }
    }

    /// All admins, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminUser>, ServiceError> {
        Ok(self.admins.list_all().await?)
    }

    /// One admin.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if there is no such admin.
    pub async fn get(&self, id: AdminId) -> Result<AdminUser, ServiceError> {
        self.admins.get_by_id(id).await?.ok_or(ServiceError::NotFound)
    }

    /// Create an admin from the console.
    ///
    /// Permissions default to the role defaults when `new.permissions` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Forbidden` for a super admin, `ServiceError::Conflict`
    /// for a taken email, `ServiceError::Auth` for a weak password.
    pub async fn create(
        &self,
        actor: AdminId,
        new: NewAdmin,
        password: Option<&str>,
    ) -> Result<AdminUser, ServiceError> {
        check_create(&new)?;
        self.insert(Some(actor), new, password).await
    }

    /// Create an admin outside the console (CLI bootstrap).
    ///
    /// This is the only path that can create a super admin.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` for a taken email, `ServiceError::Auth`
    /// for a weak password.
    pub async fn provision(
        &self,
        new: NewAdmin,
        password: Option<&str>,
    ) -> Result<AdminUser, ServiceError> {
        self.insert(None, new, password).await
    }

    async fn insert(
        &self,
        actor: Option<AdminId>,
        new: NewAdmin,
        password: Option<&str>,
    ) -> Result<AdminUser, ServiceError> {
        let password_hash = password.map(auth::hash_password).transpose()?;
        let permissions = new.initial_permissions();

        let mut tx = self.pool.begin().await?;

        let admin = AdminRepository::create(
            &mut *tx,
            &new.email,
            &new.name,
            new.role,
            &permissions,
            password_hash.as_deref(),
        )
        .await?;

        ActivityLogRepository::record(
            &mut *tx,
            actor,
            ActivityAction::AdminCreated,
            Some(admin.id),
            json!({
                "email": admin.email,
                "role": admin.role,
                "permissions": admin.permissions,
            }),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "admin created");
        Ok(admin)
    }

    /// Apply an edit to an admin.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound`, `ServiceError::Forbidden` (super admin
    /// target or role), `ServiceError::Invalid` (empty update) or
    /// `ServiceError::Conflict` (email taken).
    pub async fn update(
        &self,
        actor: AdminId,
        id: AdminId,
        update: AdminUpdate,
    ) -> Result<AdminUser, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let mut admin = lock_target(&mut tx, id).await?;
        check_update(&admin, &update)?;

        let mut fields = Vec::new();

        if update.touches_profile() {
            admin = AdminRepository::update_profile(
                &mut *tx,
                id,
                update.name.as_deref(),
                update.email.as_ref(),
            )
            .await?;
            if update.name.is_some() {
                fields.push("name");
            }
            if update.email.is_some() {
                fields.push("email");
            }
        }

        if let Some(role) = update.role
            && role != admin.role
        {
            admin = AdminRepository::update_role(&mut *tx, id, role).await?;
            fields.push("role");
        }

        if !fields.is_empty() {
            ActivityLogRepository::record(
                &mut *tx,
                Some(actor),
                ActivityAction::AdminUpdated,
                Some(id),
                json!({ "fields": fields, "role": admin.role }),
            )
            .await?;
        }

        if let Some(permissions) = &update.permissions {
            admin = write_permissions(&mut tx, actor, id, permissions).await?;
        }

        tx.commit().await?;

        tracing::info!(admin_id = %id, actor = %actor, ?fields, "admin updated");
        Ok(admin)
    }

    /// Overwrite an admin's permission map.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` (super admin).
    pub async fn replace_permissions(
        &self,
        actor: AdminId,
        id: AdminId,
        permissions: &PagePermissions,
    ) -> Result<AdminUser, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let target = lock_target(&mut tx, id).await?;
        check_editable(&target)?;
        let admin = write_permissions(&mut tx, actor, id, permissions).await?;

        tx.commit().await?;

        tracing::info!(admin_id = %id, actor = %actor, "admin permissions replaced");
        Ok(admin)
    }

    /// Delete an admin.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` or `ServiceError::Forbidden` (self or
    /// super admin).
    pub async fn delete(&self, actor: AdminId, id: AdminId) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let target = lock_target(&mut tx, id).await?;
        check_delete(actor, &target)?;

        AdminRepository::delete(&mut *tx, id).await?;
        ActivityLogRepository::record(
            &mut *tx,
            Some(actor),
            ActivityAction::AdminDeleted,
            Some(id),
            json!({ "email": target.email, "role": target.role }),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(admin_id = %id, actor = %actor, "admin deleted");
        Ok(())
    }

    /// Set a new password (CLI).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Auth` for a weak password, `ServiceError::NotFound`
    /// if the admin is gone.
    pub async fn set_password(&self, id: AdminId, password: &str) -> Result<(), ServiceError> {
        let hash = auth::hash_password(password)?;
        AdminRepository::set_password_hash(self.pool, id, &hash).await?;
        Ok(())
    }

    /// Reset another admin's password from the console.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound`, `ServiceError::Forbidden` (super admin
    /// target) or `ServiceError::Auth` for a weak password.
    pub async fn reset_password(
        &self,
        actor: AdminId,
        id: AdminId,
        password: &str,
    ) -> Result<(), ServiceError> {
        let hash = auth::hash_password(password)?;

        let mut tx = self.pool.begin().await?;

        let target = lock_target(&mut tx, id).await?;
        check_editable(&target)?;

        AdminRepository::set_password_hash(&mut *tx, id, &hash).await?;
        ActivityLogRepository::record(
            &mut *tx,
            Some(actor),
            ActivityAction::AdminUpdated,
            Some(id),
            json!({ "fields": ["password"] }),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(admin_id = %id, actor = %actor, "admin password reset");
        Ok(())
    }

    /// Recent activity across all admins.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn recent_activity(&self, limit: i64) -> Result<Vec<ActivityEntry>, ServiceError> {
        Ok(self.activity.list_recent(limit).await?)
    }

    /// Activity by or about one admin.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn activity_for(
        &self,
        id: AdminId,
        limit: i64,
    ) -> Result<Vec<ActivityEntry>, ServiceError> {
        Ok(self.activity.list_for_admin(id, limit).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use lucky_draw_core::{Email, PageKey, PermissionLevel};

    use super::*;

    fn admin(id: i32, role: AdminRole) -> AdminUser {
        AdminUser {
            id: AdminId::new(id),
            email: Email::parse(&format!("admin{id}@example.org")).unwrap(),
            name: format!("Admin {id}"),
            role,
            permissions: PagePermissions::defaults_for(role),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn new_admin(role: AdminRole) -> NewAdmin {
        NewAdmin::new(Email::parse("new@example.org").unwrap(), "New", role, None).unwrap()
    }

    #[test]
    fn test_create_rejects_super_admin() {
        assert!(matches!(
            check_create(&new_admin(AdminRole::SuperAdmin)),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(check_create(&new_admin(AdminRole::Admin)).is_ok());
        assert!(check_create(&new_admin(AdminRole::Moderator)).is_ok());
    }

    #[test]
    fn test_update_rejects_super_admin_target() {
        let update = AdminUpdate {
            name: Some("Renamed".to_owned()),
            ..Default::default()
        };
        assert!(matches!(
            check_update(&admin(1, AdminRole::SuperAdmin), &update),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(check_update(&admin(2, AdminRole::Moderator), &update).is_ok());
    }

    #[test]
    fn test_update_rejects_promotion_to_super_admin() {
        let update = AdminUpdate {
            role: Some(AdminRole::SuperAdmin),
            ..Default::default()
        };
        assert!(matches!(
            check_update(&admin(2, AdminRole::Admin), &update),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn test_update_rejects_empty() {
        assert!(matches!(
            check_update(&admin(2, AdminRole::Admin), &AdminUpdate::default()),
            Err(ServiceError::Invalid(_))
        ));
    }

    #[test]
    fn test_permission_only_update_is_allowed() {
        let mut permissions = PagePermissions::new();
        permissions.grant(PageKey::Winners, PermissionLevel::Read);
        let update = AdminUpdate {
            permissions: Some(permissions),
            ..Default::default()
        };
        assert!(check_update(&admin(3, AdminRole::Moderator), &update).is_ok());
    }

    #[test]
    fn test_delete_rules() {
        let actor = AdminId::new(1);
        assert!(matches!(
            check_delete(actor, &admin(1, AdminRole::Admin)),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            check_delete(actor, &admin(2, AdminRole::SuperAdmin)),
            Err(ServiceError::Forbidden(_))
        ));
        assert!(check_delete(actor, &admin(3, AdminRole::Moderator)).is_ok());
    }

    #[test]
    fn test_repository_errors_map_to_service_errors() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("email already exists".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::DataCorruption("bad".into())),
            ServiceError::Repository(_)
        ));
        assert!(matches!(
            ServiceError::from(sqlx::Error::PoolTimedOut),
            ServiceError::Repository(RepositoryError::Database(_))
        ));
    }
}
