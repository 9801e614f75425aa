//! Admin authentication service.
//!
//! Email + password login. Passwords are stored as Argon2id PHC strings.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use lucky_draw_core::{AdminId, Email};

use crate::db::{ActivityLogRepository, AdminRepository};
use crate::models::{ActivityAction, AdminUser};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Argon2id PHC string that no password matches. Verified on a lookup miss so
/// an unknown email costs the same as a wrong password.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$bHVja3ktZHJhdy1kdW1teQ$Gtl04IK+w+OPFC5WevReSgIK5H8FwKIIveCs4rZhx+M";

/// Admin authentication service.
pub struct AuthService<'a> {
    pool: &'a PgPool,
    admins: AdminRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            admins: AdminRepository::new(pool),
        }
    }

    /// Login with email and password.
    ///
    /// Returns the full admin record, permissions included, so the caller can
    /// cache it in the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email)?;

        let Some((admin, password_hash)) = self.admins.get_password_hash(&email).await? else {
            // Result ignored: the dummy hash never matches
            let _ = verify_password(password, DUMMY_PASSWORD_HASH);
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash)?;

        ActivityLogRepository::record(
            self.pool,
            Some(admin.id),
            ActivityAction::Login,
            None,
            serde_json::json!({ "email": admin.email }),
        )
        .await?;

        Ok(admin)
    }

    /// Record a logout for the activity log.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the insert fails.
    pub async fn record_logout(&self, admin_id: AdminId) -> Result<(), AuthError> {
        ActivityLogRepository::record(
            self.pool,
            Some(admin_id),
            ActivityAction::Logout,
            None,
            serde_json::Value::Null,
        )
        .await?;
        Ok(())
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` when the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate and hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if validation fails, or
/// `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unparsable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("draw-day-2026").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("draw-day-2026", &hash).is_ok());
        assert!(matches!(
            verify_password("draw-day-2027", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_rejects_short_password() {
        assert!(matches!(hash_password("short"), Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_dummy_hash_parses_as_argon2id() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(parsed.hash.is_some());
        assert!(matches!(
            verify_password("draw-day-2026", DUMMY_PASSWORD_HASH),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("whatever-password", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
