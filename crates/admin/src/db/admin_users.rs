//! Admin repository: accounts, roles and the stored permission maps.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use lucky_draw_core::{AdminId, Email, PagePermissions};

use super::{RepositoryError, map_unique_violation};
use crate::models::admin_user::{AdminRole, AdminUser};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AdminRow {
    id: i32,
    email: String,
    name: String,
    role: AdminRole,
    permissions: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AdminRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            permissions: PagePermissions::from_json_lenient(&row.permissions.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AdminWithHashRow {
    #[sqlx(flatten)]
    admin: AdminRow,
    password_hash: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for admin database operations.
///
/// Reads go through the pool the repository was built with. Writes are
/// associated functions taking any executor so a service can group them in
/// one transaction.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all admins, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminRow>(
            r"
            SELECT id, email, name, role, permissions, created_at, updated_at
            FROM admin.admins
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get an admin by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: AdminId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            SELECT id, email, name, role, permissions, created_at, updated_at
            FROM admin.admins
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            SELECT id, email, name, role, permissions, created_at, updated_at
            FROM admin.admins
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin together with their password hash, for login.
    ///
    /// Returns `None` when there is no such admin or no password has been set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminWithHashRow>(
            r"
            SELECT id, email, name, role, permissions, created_at, updated_at, password_hash
            FROM admin.admins
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(hash) = row.password_hash else {
            return Ok(None);
        };
        Ok(Some((row.admin.try_into()?, hash)))
    }

    /// Get an admin by ID and lock the row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn lock_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: AdminId,
    ) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            SELECT id, email, name, role, permissions, created_at, updated_at
            FROM admin.admins
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(executor)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create a new admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        email: &Email,
        name: &str,
        role: AdminRole,
        permissions: &PagePermissions,
        password_hash: Option<&str>,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            INSERT INTO admin.admins (email, name, role, permissions, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, name, role, permissions, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(role)
        .bind(Json(permissions))
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, "email already exists"))?;

        row.try_into()
    }

    /// Update an admin's name and/or email. `None` keeps the current value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin doesn't exist.
    /// Returns `RepositoryError::Conflict` if the email is used by another admin.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile<'e, E: PgExecutor<'e>>(
        executor: E,
        id: AdminId,
        name: Option<&str>,
        email: Option<&Email>,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            UPDATE admin.admins
            SET name = COALESCE($2, name),
                email = COALESCE($3, email)
            WHERE id = $1
            RETURNING id, email, name, role, permissions, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(name)
        .bind(email.map(Email::as_str))
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, "email already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Update an admin's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_role<'e, E: PgExecutor<'e>>(
        executor: E,
        id: AdminId,
        role: AdminRole,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            UPDATE admin.admins
            SET role = $2
            WHERE id = $1
            RETURNING id, email, name, role, permissions, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(role)
        .fetch_optional(executor)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Overwrite an admin's permission map.
    ///
    /// The stored map is replaced as a whole; nothing from the previous map
    /// survives unless it is in `permissions`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn replace_permissions<'e, E: PgExecutor<'e>>(
        executor: E,
        id: AdminId,
        permissions: &PagePermissions,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            r"
            UPDATE admin.admins
            SET permissions = $2
            WHERE id = $1
            RETURNING id, email, name, role, permissions, created_at, updated_at
            ",
        )
        .bind(id.as_i32())
        .bind(Json(permissions))
        .fetch_optional(executor)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Set (or reset) an admin's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_password_hash<'e, E: PgExecutor<'e>>(
        executor: E,
        id: AdminId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE admin.admins SET password_hash = $2 WHERE id = $1")
            .bind(id.as_i32())
            .bind(password_hash)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete an admin.
    ///
    /// Their activity rows stay, with the actor set to NULL.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete<'e, E: PgExecutor<'e>>(
        executor: E,
        id: AdminId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.admins WHERE id = $1")
            .bind(id.as_i32())
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Count admins with the given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_role(&self, role: AdminRole) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM admin.admins WHERE role = $1",
        )
        .bind(role)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
