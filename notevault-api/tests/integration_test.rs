/// Integration tests for the NoteVault API
///
/// These drive the full router (middleware included) against a real
/// PostgreSQL database and verify the behavioral contract end to end:
/// tenant isolation, author-only mutation, the free-plan quota, toggle
/// semantics, search, and the auth surface.
///
/// They require a running Postgres and are marked `#[ignore]`; run them with
///
/// ```bash
/// DATABASE_URL=postgres://localhost/notevault_test \
/// JWT_SECRET=integration-test-secret-0123456789ab \
/// cargo test -p notevault-api -- --ignored
/// ```
mod common;

use axum::http::StatusCode;
use common::{create_note, note_id, send, TestContext};
use notevault_shared::models::tenant::TenantPlan;
use notevault_shared::models::user::UserRole;
use serde_json::json;

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_note_crud_lifecycle() {
    let ctx = TestContext::new().await.unwrap();

    // Create
    let (status, body) = create_note(&ctx.app, &ctx.token, "First note", "Hello world").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["note"]["title"], "First note");
    assert_eq!(body["note"]["category"], "General");
    assert_eq!(body["note"]["color"], "#ffffff");
    let id = note_id(&body);

    // List; author and tenant were stamped from the token, not the payload
    let (status, body) = send(&ctx.app, "GET", "/api/notes", Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["notes"][0]["id"], id.as_str());
    assert_eq!(body["notes"][0]["authorId"], ctx.user.id.to_string());
    assert_eq!(body["notes"][0]["tenantId"], ctx.tenant.id.to_string());

    // Read single
    let (status, body) = send(
        &ctx.app,
        "GET",
        &format!("/api/notes/{}", id),
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello world");

    // Update
    let (status, body) = send(
        &ctx.app,
        "PUT",
        &format!("/api/notes/{}", id),
        Some(&ctx.token),
        Some(json!({ "title": "Renamed", "content": "Hello world", "category": "Work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["note"]["title"], "Renamed");
    assert_eq!(body["note"]["category"], "Work");

    // Delete
    let (status, _) = send(
        &ctx.app,
        "DELETE",
        &format!("/api/notes/{}", id),
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &ctx.app,
        "GET",
        &format!("/api/notes/{}", id),
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_free_plan_quota_caps_active_notes() {
    let ctx = TestContext::new().await.unwrap();

    for i in 1..=3 {
        let (status, _) = create_note(&ctx.app, &ctx.token, &format!("Note {}", i), "body").await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Fourth create hits the cap and persists nothing
    let (status, body) = create_note(&ctx.app, &ctx.token, "Note 4", "body").await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "payment_required");

    let (_, body) = send(&ctx.app, "GET", "/api/notes", Some(&ctx.token), None).await;
    assert_eq!(body["pagination"]["total"], 3);

    // Archiving one frees a slot
    let id = body["notes"][0]["id"].as_str().unwrap().to_string();
    let (status, _) = send(
        &ctx.app,
        "PATCH",
        &format!("/api/notes/{}/archive", id),
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = create_note(&ctx.app, &ctx.token, "Note 4 again", "body").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_pro_plan_has_no_note_cap() {
    let ctx = TestContext::with_plan(TenantPlan::Pro).await.unwrap();

    for i in 1..=5 {
        let (status, _) = create_note(&ctx.app, &ctx.token, &format!("Note {}", i), "body").await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_cross_tenant_isolation() {
    let ctx = TestContext::new().await.unwrap();
    let (_, _other_user, other_token) = ctx.add_tenant(TenantPlan::Free).await.unwrap();

    let (_, body) = create_note(&ctx.app, &ctx.token, "Tenant A note", "secret").await;
    let id = note_id(&body);

    // The other tenant's listing never contains it, whatever the params
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?search=secret&limit=100",
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 0);

    // Direct reads, updates, and deletes all come back 404
    let (status, _) = send(
        &ctx.app,
        "GET",
        &format!("/api/notes/{}", id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/notes/{}", id),
        Some(&other_token),
        Some(json!({ "title": "Hijacked", "content": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &ctx.app,
        "DELETE",
        &format!("/api/notes/{}", id),
        Some(&other_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_non_author_in_same_tenant_sees_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let (_user2, token2) = ctx.add_user("Colleague", UserRole::Member).await.unwrap();

    let (_, body) = create_note(&ctx.app, &ctx.token, "Private", "not shared").await;
    let id = note_id(&body);

    for (method, body) in [
        ("GET", None),
        ("PUT", Some(json!({ "title": "T", "content": "C" }))),
        ("DELETE", None),
    ] {
        let (status, _) = send(
            &ctx.app,
            method,
            &format!("/api/notes/{}", id),
            Some(&token2),
            body,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} should be 404", method);
    }

    // Toggles are author-only too
    let (status, _) = send(
        &ctx.app,
        "PATCH",
        &format!("/api/notes/{}/pin", id),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_shared_note_is_readable_but_not_writable() {
    let ctx = TestContext::new().await.unwrap();
    let (user2, token2) = ctx.add_user("Recipient", UserRole::Member).await.unwrap();

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/api/notes",
        Some(&ctx.token),
        Some(json!({
            "title": "Shared",
            "content": "visible to recipient",
            "sharedWith": [{ "user": user2.id, "permission": "write" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = note_id(&body);

    // Recipient can read
    let (status, body) = send(
        &ctx.app,
        "GET",
        &format!("/api/notes/{}", id),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Shared");

    // Even "write" permission grants no mutation rights
    let (status, _) = send(
        &ctx.app,
        "PUT",
        &format!("/api/notes/{}", id),
        Some(&token2),
        Some(json!({ "title": "Edited", "content": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &ctx.app,
        "DELETE",
        &format!("/api/notes/{}", id),
        Some(&token2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_toggles_are_involutions() {
    let ctx = TestContext::new().await.unwrap();

    let (_, body) = create_note(&ctx.app, &ctx.token, "Toggle me", "body").await;
    let id = note_id(&body);
    assert_eq!(body["note"]["isPinned"], false);

    let pin_uri = format!("/api/notes/{}/pin", id);
    let (_, body) = send(&ctx.app, "PATCH", &pin_uri, Some(&ctx.token), None).await;
    assert_eq!(body["note"]["isPinned"], true);
    assert_eq!(body["message"], "Note pinned successfully");

    let (_, body) = send(&ctx.app, "PATCH", &pin_uri, Some(&ctx.token), None).await;
    assert_eq!(body["note"]["isPinned"], false);
    assert_eq!(body["message"], "Note unpinned successfully");

    let archive_uri = format!("/api/notes/{}/archive", id);
    let (_, body) = send(&ctx.app, "PATCH", &archive_uri, Some(&ctx.token), None).await;
    assert_eq!(body["note"]["isArchived"], true);
    assert_eq!(body["message"], "Note archived successfully");

    let (_, body) = send(&ctx.app, "PATCH", &archive_uri, Some(&ctx.token), None).await;
    assert_eq!(body["note"]["isArchived"], false);
    assert_eq!(body["message"], "Note unarchived successfully");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_search_is_case_insensitive_substring() {
    let ctx = TestContext::new().await.unwrap();

    create_note(&ctx.app, &ctx.token, "Standup", "Team meeting notes").await;
    create_note(&ctx.app, &ctx.token, "Groceries", "milk, eggs").await;

    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?search=meeting",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["notes"][0]["title"], "Standup");

    // Matches the title too, and ignores case
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?search=GROCER",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);

    // LIKE metacharacters in the query match literally
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?search=%25",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_listing_pagination_and_sort() {
    let ctx = TestContext::with_plan(TenantPlan::Pro).await.unwrap();

    for i in 1..=5 {
        create_note(&ctx.app, &ctx.token, &format!("Note {}", i), "body").await;
    }

    // Pin the oldest; it must sort first despite its age
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?limit=100",
        Some(&ctx.token),
        None,
    )
    .await;
    let oldest_id = body["notes"][4]["id"].as_str().unwrap().to_string();
    send(
        &ctx.app,
        "PATCH",
        &format!("/api/notes/{}/pin", oldest_id),
        Some(&ctx.token),
        None,
    )
    .await;

    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?page=1&limit=2",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(body["notes"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["current"], 1);
    assert_eq!(body["pagination"]["pages"], 3);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["notes"][0]["id"], oldest_id.as_str());
    assert_eq!(body["notes"][0]["isPinned"], true);

    // Out-of-range values are coerced to positive integers
    let (status, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?page=0&limit=-5",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["current"], 1);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_category_filter_and_listing() {
    let ctx = TestContext::new().await.unwrap();

    send(
        &ctx.app,
        "POST",
        "/api/notes",
        Some(&ctx.token),
        Some(json!({ "title": "A", "content": "a", "category": "Work" })),
    )
    .await;
    send(
        &ctx.app,
        "POST",
        "/api/notes",
        Some(&ctx.token),
        Some(json!({ "title": "B", "content": "b" })),
    )
    .await;

    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?category=Work",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);

    // "All" is a sentinel, not a category
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes?category=All",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 2);

    let (_, body) = send(
        &ctx.app,
        "GET",
        "/api/notes/categories/list",
        Some(&ctx.token),
        None,
    )
    .await;
    let categories: Vec<&str> = body["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["General", "Work"]);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_register_and_login_flow() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("fresh-{}@test.example", uuid::Uuid::new_v4().simple());

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Fresh User",
            "email": email,
            "password": "password",
            "tenantSlug": ctx.tenant.slug
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["tenant"]["slug"], ctx.tenant.slug.as_str());
    // Role requests other than "admin" collapse to member
    assert_eq!(body["user"]["role"], "member");

    // Duplicate email is a 400, not a 409
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Imposter",
            "email": email,
            "password": "password",
            "tenantSlug": ctx.tenant.slug
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Login works, wrong password does not
    let (status, body) = send(
        &ctx.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The issued token works against the authenticated surface
    let (status, body) = send(&ctx.app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], email.as_str());
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_register_with_unknown_tenant_creates_nothing() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("nobody-{}@test.example", uuid::Uuid::new_v4().simple());

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Nobody",
            "email": email,
            "password": "password",
            "tenantSlug": "unknown-slug"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // No user was created: login cannot succeed
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Missing tenantSlug entirely is also a 400
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Nobody", "email": email, "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_upgrade_is_admin_only_and_same_tenant_only() {
    let ctx = TestContext::new().await.unwrap();
    let (other_tenant, _, _) = ctx.add_tenant(TenantPlan::Free).await.unwrap();
    let (_member, member_token) = ctx.add_user("Member", UserRole::Member).await.unwrap();

    // Member of the right tenant: still forbidden
    let (status, _) = send(
        &ctx.app,
        "POST",
        &format!("/api/tenants/{}/upgrade", ctx.tenant.slug),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin of another tenant: forbidden
    let (status, _) = send(
        &ctx.app,
        "POST",
        &format!("/api/tenants/{}/upgrade", other_tenant.slug),
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin of the addressed tenant: allowed, and idempotent
    for _ in 0..2 {
        let (status, body) = send(
            &ctx.app,
            "POST",
            &format!("/api/tenants/{}/upgrade", ctx.tenant.slug),
            Some(&ctx.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tenant"]["plan"], "pro");
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_upgrade_lifts_the_quota() {
    let ctx = TestContext::new().await.unwrap();

    for i in 1..=3 {
        create_note(&ctx.app, &ctx.token, &format!("Note {}", i), "body").await;
    }
    let (status, _) = create_note(&ctx.app, &ctx.token, "Blocked", "body").await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    send(
        &ctx.app,
        "POST",
        &format!("/api/tenants/{}/upgrade", ctx.tenant.slug),
        Some(&ctx.token),
        None,
    )
    .await;

    // The plan is read per request, so the cap is gone immediately
    let (status, _) = create_note(&ctx.app, &ctx.token, "Unblocked", "body").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_invite_flow() {
    let ctx = TestContext::new().await.unwrap();
    let (_member, member_token) = ctx.add_user("Member", UserRole::Member).await.unwrap();
    let email = format!("invited-{}@test.example", uuid::Uuid::new_v4().simple());

    // Members cannot invite
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/users/invite",
        Some(&member_token),
        Some(json!({ "name": "Invitee", "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admins can; with an explicit password the invitee can log in
    let (status, body) = send(
        &ctx.app,
        "POST",
        "/api/users/invite",
        Some(&ctx.token),
        Some(json!({ "name": "Invitee", "email": email, "password": "welcome1" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], email.as_str());
    assert_eq!(body["user"]["role"], "member");

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "welcome1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Invitees land in the inviter's tenant
    assert_eq!(body["user"]["tenant"]["slug"], ctx.tenant.slug.as_str());

    // Duplicate invite is a 400
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/users/invite",
        Some(&ctx.token),
        Some(json!({ "name": "Invitee", "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_profile_update() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &ctx.app,
        "PUT",
        "/api/auth/profile",
        Some(&ctx.token),
        Some(json!({ "name": "Renamed Admin", "avatar": "https://cdn.test/a.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Renamed Admin");
    assert_eq!(body["user"]["avatar"], "https://cdn.test/a.png");

    let (_, body) = send(&ctx.app, "GET", "/api/auth/me", Some(&ctx.token), None).await;
    assert_eq!(body["user"]["name"], "Renamed Admin");
}

#[tokio::test]
#[ignore = "requires a running Postgres (set DATABASE_URL and JWT_SECRET)"]
async fn test_authentication_is_required() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(&ctx.app, "GET", "/api/notes", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&ctx.app, "GET", "/api/notes", Some("garbage-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Validation errors are 400s, before any quota or db write
    let (status, body) = send(
        &ctx.app,
        "POST",
        "/api/notes",
        Some(&ctx.token),
        Some(json!({ "title": "", "content": "body" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    // Malformed color is rejected the same way
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/api/notes",
        Some(&ctx.token),
        Some(json!({ "title": "T", "content": "C", "color": "blue" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Health stays public
    let (status, _) = send(&ctx.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&ctx.app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
