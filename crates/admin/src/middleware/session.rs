//! Session layer for the admin console.
//!
//! `PostgreSQL`-backed sessions (table `admin.session`), SameSite=Strict,
//! HttpOnly, 24h inactivity expiry. The session id cookie is signed with
//! `ADMIN_SESSION_SECRET`.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for the console.
pub const SESSION_COOKIE_NAME: &str = "ld_admin_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The `admin.session` table is created by the migrations.
///
/// # Errors
///
/// Returns the store's message if the schema or table name is rejected, or
/// the key error if the session secret is too short to sign with.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<PostgresStore, SignedCookie>, String> {
    let key = signing_key(config)?;
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("admin")?
        .with_table_name("session")?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

fn signing_key(config: &AdminConfig) -> Result<Key, String> {
    Key::try_from(config.session_secret.expose_secret().as_bytes()).map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn config_with_secret(secret: String) -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/lucky_draw_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_owned(),
            session_secret: SecretString::from(secret),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    #[test]
    fn test_signing_key_needs_64_bytes() {
        assert!(signing_key(&config_with_secret("k".repeat(32))).is_err());
        assert!(signing_key(&config_with_secret("k".repeat(64))).is_ok());
    }
}
