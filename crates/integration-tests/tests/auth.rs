//! Integration tests for login, logout and session handling.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The admin server running (cargo run -p lucky-draw-admin)

use lucky_draw_core::AdminRole;
use lucky_draw_integration_tests::{TEST_PASSWORD, TestContext};
use reqwest::{StatusCode, header::LOCATION};
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_json_login_returns_permission_snapshot() {
    let ctx = TestContext::new().await;
    let moderator = ctx.create_admin(AdminRole::Moderator, None).await;
    let client = ctx.client();

    let body = ctx.login(&client, &moderator).await;
    assert_eq!(body["role"], "MODERATOR");
    assert_eq!(body["is_super_admin"], false);
    assert_eq!(body["permissions"]["contests"], json!(["read"]));
    assert!(body["permissions"].get("draw").is_none());

    let me: Value = client
        .get(ctx.url("/api/me"))
        .send()
        .await
        .expect("Failed to get /api/me")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(me["email"], moderator.email.as_str());

    ctx.remove_admin(&moderator).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_wrong_password_is_rejected() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_admin(AdminRole::Admin, None).await;
    let client = ctx.client();

    let resp = client
        .post(ctx.url("/auth/login"))
        .json(&json!({ "email": admin.email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to send login");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Form posts get the login page back with an error
    let resp = client
        .post(ctx.url("/auth/login"))
        .form(&[("email", admin.email.as_str()), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to send login form");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let html = resp.text().await.expect("Failed to read body");
    assert!(html.contains("Invalid email or password"));

    let resp = client
        .get(ctx.url("/api/me"))
        .send()
        .await
        .expect("Failed to get /api/me");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    ctx.remove_admin(&admin).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_form_login_redirects_home() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_admin(AdminRole::Admin, None).await;
    let client = ctx.client();

    let resp = client
        .post(ctx.url("/auth/login"))
        .form(&[("email", admin.email.as_str()), ("password", TEST_PASSWORD)])
        .send()
        .await
        .expect("Failed to send login form");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/");

    let resp = client
        .get(ctx.url("/"))
        .send()
        .await
        .expect("Failed to get dashboard");
    assert_eq!(resp.status(), StatusCode::OK);

    ctx.remove_admin(&admin).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_logout_ends_session() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_admin(AdminRole::Admin, None).await;
    let client = ctx.logged_in(&admin).await;

    let resp = client
        .post(ctx.url("/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/auth/login");

    let resp = client
        .get(ctx.url("/api/me"))
        .send()
        .await
        .expect("Failed to get /api/me");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    ctx.remove_admin(&admin).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_anonymous_requests() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let resp = client.get(ctx.url("/")).send().await.expect("Failed to get /");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()[LOCATION], "/auth/login");

    let resp = client
        .get(ctx.url("/api/admins"))
        .send()
        .await
        .expect("Failed to get /api/admins");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .get(ctx.url("/auth/login"))
        .send()
        .await
        .expect("Failed to get login page");
    assert_eq!(resp.status(), StatusCode::OK);
}
