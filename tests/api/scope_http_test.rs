//! Tenant scope, role grant and self menu HTTP tests

use super::{
    build_test_router, get_json, put_json, TestAppState, OTHER_TENANT, ROLE, TENANT,
};
use crate::common::{checked_auth_ids, checked_menu_ids, node_ids};
use admin9_core::domain::MenuTreeNode;
use axum::http::StatusCode;
use serde_json::{json, Value};

fn tree_of(body: Option<Value>) -> Vec<MenuTreeNode> {
    serde_json::from_value(body.unwrap()["data"].clone()).unwrap()
}

/// Menus 1 and 2 with buttons 11 and 21
fn narrow_submission() -> Value {
    json!([
        {
            "id": 1,
            "meta": {
                "hasPermission": true,
                "authList": [
                    { "id": 11, "hasPermission": true },
                    { "id": 12, "hasPermission": false }
                ]
            },
            "children": [
                {
                    "id": 2,
                    "meta": {
                        "hasPermission": true,
                        "authList": [{ "id": 21, "hasPermission": true }]
                    }
                }
            ]
        },
        { "id": 4, "meta": { "hasPermission": false } }
    ])
}

#[tokio::test]
async fn test_admin_saves_tenant_scope_and_gets_tree_back() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let store = state.store.clone();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = put_json(
        &app,
        &format!("/api/v1/tenants/{}/menus", TENANT),
        Some(&token),
        &narrow_submission(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let tree = tree_of(body);
    assert_eq!(checked_menu_ids(&tree), vec![1, 2]);
    assert_eq!(checked_auth_ids(&tree), vec![11, 21]);
    assert_eq!(store.tenant_scope(TENANT).await, (vec![1, 2], vec![11, 21]));
}

#[tokio::test]
async fn test_tenant_scope_rejects_unknown_menu() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let store = state.store.clone();
    store.set_tenant_scope(TENANT, &[1], &[]).await;
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = put_json(
        &app,
        &format!("/api/v1/tenants/{}/menus", TENANT),
        Some(&token),
        &json!([{ "id": 77, "meta": { "hasPermission": true } }]),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "bad_request");
    assert_eq!(store.tenant_scope(TENANT).await, (vec![1], vec![]));
}

#[tokio::test]
async fn test_member_cannot_write_tenant_scope() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(TENANT);
    let app = build_test_router(state);

    let (status, _): (_, Option<Value>) = put_json(
        &app,
        &format!("/api/v1/tenants/{}/menus", TENANT),
        Some(&token),
        &narrow_submission(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_reads_own_tenant_scope_only() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(TENANT);
    state.store.set_tenant_scope(TENANT, &[1, 2], &[11]).await;
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = get_json(
        &app,
        &format!("/api/v1/tenants/{}/menus", TENANT),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tree = tree_of(body);
    assert_eq!(node_ids(&tree), vec![1, 2, 3, 4]);
    assert_eq!(checked_menu_ids(&tree), vec![1, 2]);

    let (status, _): (_, Option<Value>) = get_json(
        &app,
        &format!("/api/v1/tenants/{}/menus", OTHER_TENANT),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_grants_round_trip_over_http() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(TENANT);
    let store = state.store.clone();
    store.set_tenant_scope(TENANT, &[1, 2, 4], &[11, 21, 41]).await;
    let app = build_test_router(state);

    let path = format!("/api/v1/roles/{}/menus", ROLE);
    let (status, body): (_, Option<Value>) =
        put_json(&app, &path, Some(&token), &narrow_submission()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["message"], "Role menus updated successfully");
    assert_eq!(store.role_grants(ROLE).await, (vec![1, 2], vec![11, 21]));

    let (status, body): (_, Option<Value>) = get_json(&app, &path, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let tree = tree_of(body);
    assert_eq!(checked_menu_ids(&tree), vec![1, 2]);
    assert_eq!(checked_auth_ids(&tree), vec![11, 21]);

    let (status, _): (_, Option<Value>) = put_json(&app, &path, Some(&token), &tree).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.role_grants(ROLE).await, (vec![1, 2], vec![11, 21]));
}

#[tokio::test]
async fn test_role_grant_outside_tenant_scope_is_rejected() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(TENANT);
    let store = state.store.clone();
    store.set_tenant_scope(TENANT, &[1, 2], &[11, 21]).await;
    store.set_role_grants(ROLE, &[1], &[11]).await;
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = put_json(
        &app,
        &format!("/api/v1/roles/{}/menus", ROLE),
        Some(&token),
        &narrow_submission(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    let body = body.unwrap();
    assert_eq!(body["error"], "menu_out_of_scope");
    assert_eq!(body["details"]["ids"], json!([4]));
    assert_eq!(store.role_grants(ROLE).await, (vec![1], vec![11]));
}

#[tokio::test]
async fn test_role_of_other_tenant_is_forbidden() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(OTHER_TENANT);
    let app = build_test_router(state);

    let (status, _): (_, Option<Value>) = get_json(
        &app,
        &format!("/api/v1/roles/{}/menus", ROLE),
        Some(&token),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_my_menus_shows_enabled_scope_with_grants() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(TENANT);
    state.store.set_tenant_scope(TENANT, &[1, 2, 3], &[11, 21]).await;
    state.store.set_role_grants(ROLE, &[1, 2], &[21]).await;
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = get_json(&app, "/api/v1/me/menus", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let tree = tree_of(body);
    assert_eq!(node_ids(&tree), vec![1, 2]);
    assert_eq!(checked_menu_ids(&tree), vec![1, 2]);
    assert_eq!(checked_auth_ids(&tree), vec![21]);
}

#[tokio::test]
async fn test_my_menus_requires_tenant_context() {
    let state = TestAppState::seeded().await;
    let tenantless = state.tenantless_token();
    let admin = state.admin_token();
    let app = build_test_router(state);

    let (status, _): (_, Option<Value>) =
        get_json(&app, "/api/v1/me/menus", Some(&tenantless)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _): (_, Option<Value>) = get_json(&app, "/api/v1/me/menus", Some(&admin)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
