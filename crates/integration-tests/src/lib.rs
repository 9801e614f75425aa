//! Integration tests for the Lucky Draw admin console.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate, then start the server
//! cargo run -p lucky-draw-cli -- migrate
//! cargo run -p lucky-draw-admin
//!
//! # Run the ignored integration tests against it
//! cargo test -p lucky-draw-integration-tests -- --ignored
//! ```
//!
//! Tests create their own admins directly in the database (unique emails per
//! test) and remove them afterwards, so they can run against a shared dev
//! database.
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` (or `DATABASE_URL`) - same database the server uses
//! - `ADMIN_TEST_URL` - server address, default `http://localhost:3001`

use reqwest::{Client, StatusCode, redirect};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use lucky_draw_admin::db::{self, AdminRepository};
use lucky_draw_admin::models::NewAdmin;
use lucky_draw_admin::services::AdminService;
use lucky_draw_core::{AdminId, AdminRole, Email, PagePermissions};

/// Password given to every admin the tests create.
pub const TEST_PASSWORD: &str = "integration-test-password";

/// An admin created for one test.
#[derive(Debug, Clone)]
pub struct TestAdmin {
    pub id: AdminId,
    pub email: String,
    pub role: AdminRole,
}

/// Shared handles for a test: the server address and the database.
pub struct TestContext {
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the admin database.
    ///
    /// # Panics
    ///
    /// Panics if no database URL is configured or the database is unreachable.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("ADMIN_TEST_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());
        let database_url = std::env::var("ADMIN_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("ADMIN_DATABASE_URL must be set for integration tests");

        let pool = db::create_pool(&SecretString::from(database_url))
            .await
            .expect("Failed to connect to admin database");

        Self { base_url, pool }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client with its own cookie jar that does not follow redirects.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Insert an admin with [`TEST_PASSWORD`].
    ///
    /// `permissions` of `None` gives the role defaults.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_admin(
        &self,
        role: AdminRole,
        permissions: Option<PagePermissions>,
    ) -> TestAdmin {
        let email = format!("it-{}@example.org", Uuid::new_v4().simple());
        let new = NewAdmin::new(
            Email::parse(&email).expect("valid test email"),
            "Integration Test",
            role,
            permissions,
        )
        .expect("valid test admin");

        let admin = AdminService::new(&self.pool)
            .provision(new, Some(TEST_PASSWORD))
            .await
            .expect("Failed to create test admin");

        TestAdmin {
            id: admin.id,
            email,
            role,
        }
    }

    /// Remove a test admin. Missing rows are fine.
    pub async fn remove_admin(&self, admin: &TestAdmin) {
        let _ = AdminRepository::delete(&self.pool, admin.id).await;
    }

    /// Log `client` in as `admin` through the JSON endpoint and return the body.
    ///
    /// # Panics
    ///
    /// Panics if the login does not succeed.
    pub async fn login(&self, client: &Client, admin: &TestAdmin) -> Value {
        let resp = client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": admin.email, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("Failed to send login request");

        assert_eq!(resp.status(), StatusCode::OK, "login failed for {}", admin.email);
        resp.json().await.expect("Login response was not JSON")
    }

    /// A fresh client already logged in as `admin`.
    pub async fn logged_in(&self, admin: &TestAdmin) -> Client {
        let client = self.client();
        self.login(&client, admin).await;
        client
    }
}
