//! Admin account commands.
//!
//! The console never creates or edits super admins, so the first account (and
//! any later super admin) comes from here.
//!
//! # Usage
//!
//! ```bash
//! # Bootstrap a super admin
//! ld-cli admin create -e root@example.com -n "Root" -r super_admin --password '...'
//!
//! # Moderator with a custom starting map instead of the role defaults
//! ld-cli admin create -e mod@example.com -n "Mod" -r moderator \
//!     --permissions '{"contests":["read"],"winners":["read","update"]}'
//!
//! # Reset a password
//! ld-cli admin set-password -e mod@example.com --password '...'
//!
//! # Show what an admin can do
//! ld-cli admin permissions -e mod@example.com
//! ```

use sqlx::PgPool;
use thiserror::Error;

use lucky_draw_admin::db::{self, AdminRepository};
use lucky_draw_admin::models::NewAdmin;
use lucky_draw_admin::services::{AdminService, ServiceError};
use lucky_draw_core::{AdminRole, Email, EmailError, PagePermissions, Principal};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Valid roles: super_admin, admin, moderator")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid permissions JSON: {0}")]
    InvalidPermissions(#[from] serde_json::Error),

    #[error("No admin with email: {0}")]
    NotFound(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

async fn connect() -> Result<PgPool, AdminError> {
    let database_url =
        super::database_url().ok_or(AdminError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Create a new admin.
///
/// `permissions` is a JSON permission map; the role defaults apply without it.
///
/// # Errors
///
/// Returns an error for bad input, a taken email or a database failure.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    permissions: Option<&str>,
    password: Option<&str>,
) -> Result<(), AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email)?;
    let permissions = permissions
        .map(serde_json::from_str::<PagePermissions>)
        .transpose()?;

    let new = NewAdmin::new(email, name, role, permissions).map_err(ServiceError::from)?;

    let pool = connect().await?;
    let admin = AdminService::new(&pool).provision(new, password).await?;

    tracing::info!("Admin created successfully!");
    tracing::info!("  ID: {}", admin.id);
    tracing::info!("  Email: {}", admin.email);
    tracing::info!("  Name: {}", admin.name);
    tracing::info!("  Role: {}", admin.role);
    if password.is_none() {
        tracing::warn!("No password set; run `ld-cli admin set-password` before logging in");
    }

    let super_admins = AdminRepository::new(&pool)
        .count_by_role(AdminRole::SuperAdmin)
        .await
        .map_err(ServiceError::from)?;
    if super_admins == 0 {
        tracing::warn!("No super admin exists yet; create one with `-r super_admin`");
    }

    Ok(())
}

/// Set or reset an admin's password.
///
/// # Errors
///
/// Returns an error for an unknown email, a weak password or a database failure.
pub async fn set_password(email: &str, password: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let admin = AdminRepository::new(&pool)
        .get_by_email(&email)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AdminError::NotFound(email.to_string()))?;

    AdminService::new(&pool).set_password(admin.id, password).await?;

    tracing::info!("Password updated for {}", admin.email);
    Ok(())
}

/// Print an admin's effective permissions as JSON.
///
/// # Errors
///
/// Returns an error for an unknown email or a database failure.
pub async fn permissions(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    let admin = AdminRepository::new(&pool)
        .get_by_email(&email)
        .await
        .map_err(ServiceError::from)?
        .ok_or_else(|| AdminError::NotFound(email.to_string()))?;

    let output = serde_json::json!({
        "email": admin.email,
        "role": admin.role,
        "stored": admin.permissions,
        "effective": admin.effective_permissions(),
        "accessible_pages": admin.accessible_pages(),
    });

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}
