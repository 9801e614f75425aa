//! Integration tests for the admin management API.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The admin server running (cargo run -p lucky-draw-admin)

use lucky_draw_admin::db::{ActivityLogRepository, AdminRepository};
use lucky_draw_admin::models::ActivityAction;
use lucky_draw_core::{AdminRole, PageKey, PagePermissions, PermissionLevel};
use lucky_draw_integration_tests::{TestAdmin, TestContext};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// An `ADMIN` holding every level, admin management included.
async fn manager(ctx: &TestContext) -> TestAdmin {
    ctx.create_admin(AdminRole::Admin, Some(PagePermissions::full()))
        .await
}

async fn create_via_api(ctx: &TestContext, client: &Client, body: Value) -> reqwest::Response {
    client
        .post(ctx.url("/api/admins"))
        .json(&body)
        .send()
        .await
        .expect("Failed to create admin")
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_default_admin_cannot_create_admins() {
    let ctx = TestContext::new().await;
    let admin = ctx.create_admin(AdminRole::Admin, None).await;
    let client = ctx.logged_in(&admin).await;

    // ADMIN defaults include admin_management read only
    let resp = client
        .get(ctx.url("/api/admins"))
        .send()
        .await
        .expect("Failed to list admins");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = create_via_api(
        &ctx,
        &client,
        json!({ "email": "blocked@example.org", "name": "Blocked", "role": "MODERATOR" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    ctx.remove_admin(&admin).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_create_edit_replace_and_delete() {
    let ctx = TestContext::new().await;
    let manager = manager(&ctx).await;
    let client = ctx.logged_in(&manager).await;

    let email = format!("it-{}@example.org", Uuid::new_v4().simple());
    let resp = create_via_api(
        &ctx,
        &client,
        json!({ "email": email, "name": "New Mod", "role": "MODERATOR" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("Invalid JSON");
    let id = created["id"].as_i64().expect("id");
    assert_eq!(created["permissions"]["contests"], json!(["read"]));

    // Same email again
    let resp = create_via_api(
        &ctx,
        &client,
        json!({ "email": email, "name": "Twin", "role": "MODERATOR" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .put(ctx.url(&format!("/api/admins/{id}")))
        .json(&json!({ "name": "Renamed Mod" }))
        .send()
        .await
        .expect("Failed to update admin");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(updated["name"], "Renamed Mod");

    // Permission edits replace the whole map
    let resp = client
        .put(ctx.url(&format!("/api/admins/{id}/permissions")))
        .json(&json!({ "draw": ["read"] }))
        .send()
        .await
        .expect("Failed to replace permissions");
    assert_eq!(resp.status(), StatusCode::OK);
    let replaced: Value = resp.json().await.expect("Invalid JSON");
    assert_eq!(replaced["permissions"], json!({ "draw": ["read"] }));

    let activity: Vec<Value> = client
        .get(ctx.url(&format!("/api/activity?admin_id={id}")))
        .send()
        .await
        .expect("Failed to get activity")
        .json()
        .await
        .expect("Invalid JSON");
    let actions: Vec<&str> = activity
        .iter()
        .filter_map(|row| row["action"].as_str())
        .collect();
    assert!(actions.contains(&"admin_created"));
    assert!(actions.contains(&"permissions_updated"));

    let resp = client
        .delete(ctx.url(&format!("/api/admins/{id}")))
        .send()
        .await
        .expect("Failed to delete admin");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(ctx.url(&format!("/api/admins/{id}")))
        .send()
        .await
        .expect("Failed to get admin");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    ctx.remove_admin(&manager).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_super_admin_rules() {
    let ctx = TestContext::new().await;
    let manager = manager(&ctx).await;
    let root = ctx.create_admin(AdminRole::SuperAdmin, None).await;
    let client = ctx.logged_in(&manager).await;

    let resp = create_via_api(
        &ctx,
        &client,
        json!({ "email": "root2@example.org", "name": "Root Two", "role": "SUPER_ADMIN" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .put(ctx.url(&format!("/api/admins/{}", root.id)))
        .json(&json!({ "name": "Demoted" }))
        .send()
        .await
        .expect("Failed to update super admin");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .put(ctx.url(&format!("/api/admins/{}/permissions", root.id)))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to replace super admin permissions");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .delete(ctx.url(&format!("/api/admins/{}", root.id)))
        .send()
        .await
        .expect("Failed to delete super admin");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Nobody deletes themselves
    let resp = client
        .delete(ctx.url(&format!("/api/admins/{}", manager.id)))
        .send()
        .await
        .expect("Failed to delete self");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    ctx.remove_admin(&root).await;
    ctx.remove_admin(&manager).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_self_edit_refreshes_session() {
    let ctx = TestContext::new().await;
    let manager = manager(&ctx).await;
    let client = ctx.logged_in(&manager).await;

    let resp = client
        .put(ctx.url(&format!("/api/admins/{}/permissions", manager.id)))
        .json(&json!({ "admin_management": ["read"], "dashboard": ["read"] }))
        .send()
        .await
        .expect("Failed to replace own permissions");
    assert_eq!(resp.status(), StatusCode::OK);

    let me: Value = client
        .get(ctx.url("/api/me"))
        .send()
        .await
        .expect("Failed to get /api/me")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(me["permissions"]["admin_management"], json!(["read"]));

    // The refreshed session no longer carries update
    let resp = client
        .put(ctx.url(&format!("/api/admins/{}/permissions", manager.id)))
        .json(&json!({ "admin_management": ["read", "write", "update"] }))
        .send()
        .await
        .expect("Failed to send second replace");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    ctx.remove_admin(&manager).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_edits_apply_to_other_sessions_on_next_login() {
    let ctx = TestContext::new().await;
    let manager = manager(&ctx).await;
    let moderator = ctx.create_admin(AdminRole::Moderator, None).await;
    let manager_client = ctx.logged_in(&manager).await;
    let moderator_client = ctx.logged_in(&moderator).await;

    let resp = manager_client
        .put(ctx.url(&format!("/api/admins/{}/permissions", moderator.id)))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to clear permissions");
    assert_eq!(resp.status(), StatusCode::OK);

    let is_allowed = |client: Client| {
        let url = ctx.url("/api/me/check?page=contests&level=read");
        async move {
            let body: Value = client
                .get(url)
                .send()
                .await
                .expect("Failed to call check")
                .json()
                .await
                .expect("Invalid JSON");
            body["allowed"].as_bool().expect("allowed is a bool")
        }
    };

    // Existing session keeps its login-time snapshot
    assert!(is_allowed(moderator_client.clone()).await);

    let fresh = ctx.logged_in(&moderator).await;
    assert!(!is_allowed(fresh).await);

    ctx.remove_admin(&moderator).await;
    ctx.remove_admin(&manager).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_password_reset_is_super_admin_only() {
    let ctx = TestContext::new().await;
    let manager = manager(&ctx).await;
    let root = ctx.create_admin(AdminRole::SuperAdmin, None).await;
    let target = ctx.create_admin(AdminRole::Moderator, None).await;
    let path = format!("/api/admins/{}/password", target.id);
    let body = json!({ "password": "a-brand-new-password" });

    // Full admin_management permissions are not enough
    let manager_client = ctx.logged_in(&manager).await;
    let resp = manager_client
        .put(ctx.url(&path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send reset");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let root_client = ctx.logged_in(&root).await;
    let resp = root_client
        .put(ctx.url(&path))
        .json(&body)
        .send()
        .await
        .expect("Failed to send reset");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ctx
        .client()
        .post(ctx.url("/auth/login"))
        .json(&json!({ "email": target.email, "password": "a-brand-new-password" }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), StatusCode::OK);

    ctx.remove_admin(&target).await;
    ctx.remove_admin(&root).await;
    ctx.remove_admin(&manager).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_malformed_permission_body_keeps_stored_map() {
    let ctx = TestContext::new().await;
    let manager = manager(&ctx).await;
    let moderator = ctx.create_admin(AdminRole::Moderator, None).await;
    let client = ctx.logged_in(&manager).await;
    let path = format!("/api/admins/{}/permissions", moderator.id);

    for body in [
        json!(null),
        json!("oops"),
        json!(["read"]),
        json!({ "contest": ["read"] }),
        json!({ "contests": "read" }),
    ] {
        let resp = client
            .put(ctx.url(&path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send replace");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let resp = client
        .put(ctx.url(&format!("/api/admins/{}", moderator.id)))
        .json(&json!({ "name": "Still Mod", "permissions": 42 }))
        .send()
        .await
        .expect("Failed to send update");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored: Value = client
        .get(ctx.url(&format!("/api/admins/{}", moderator.id)))
        .send()
        .await
        .expect("Failed to get admin")
        .json()
        .await
        .expect("Invalid JSON");
    assert_eq!(stored["name"], "Integration Test");
    assert_eq!(stored["permissions"]["contests"], json!(["read"]));

    ctx.remove_admin(&moderator).await;
    ctx.remove_admin(&manager).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_admin_writes_roll_back_with_their_transaction() {
    let ctx = TestContext::new().await;
    let target = ctx.create_admin(AdminRole::Moderator, None).await;

    let mut tx = ctx.pool.begin().await.expect("Failed to begin");
    AdminRepository::update_profile(&mut *tx, target.id, Some("Half Done"), None)
        .await
        .expect("Failed to update profile");
    let mut changed = PagePermissions::new();
    changed.grant(PageKey::Draw, PermissionLevel::Read);
    AdminRepository::replace_permissions(&mut *tx, target.id, &changed)
        .await
        .expect("Failed to replace permissions");
    ActivityLogRepository::record(
        &mut *tx,
        None,
        ActivityAction::AdminUpdated,
        Some(target.id),
        json!({ "fields": ["name"] }),
    )
    .await
    .expect("Failed to record activity");
    // A later failure drops the transaction without committing
    drop(tx);

    let admin = AdminRepository::new(&ctx.pool)
        .get_by_id(target.id)
        .await
        .expect("Failed to load admin")
        .expect("admin exists");
    assert_eq!(admin.name, "Integration Test");
    assert_eq!(admin.permissions, PagePermissions::defaults_for(AdminRole::Moderator));

    let activity = ActivityLogRepository::new(&ctx.pool)
        .list_for_admin(target.id, 50)
        .await
        .expect("Failed to list activity");
    assert!(activity.iter().all(|row| row.action != ActivityAction::AdminUpdated));

    ctx.remove_admin(&target).await;
}
