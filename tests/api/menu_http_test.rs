//! Menu catalog HTTP tests

use super::{
    build_test_router, delete_json, get_json, post_json, put_json, TestAppState, TENANT,
};
use axum::http::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_is_public() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (_, Option<Value>) = get_json(&app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["status"], "healthy");
}

#[tokio::test]
async fn test_catalog_requires_token() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (_, Option<Value>) = get_json(&app, "/api/v1/menus", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["error"], "unauthorized");
}

#[tokio::test]
async fn test_catalog_rejects_garbage_token() {
    let app = build_test_router(TestAppState::new());

    let (status, _): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus", Some("not.a.token")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tenant_member_cannot_touch_catalog() {
    let state = TestAppState::seeded().await;
    let token = state.member_token(TENANT);
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["error"], "forbidden");

    let (status, _): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/menus",
        Some(&token),
        &json!({ "path": "/x", "name": "X", "title": "X" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_catalog_in_display_order() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body.unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids.len(), 4);
    assert!(ids.contains(&3));
}

#[tokio::test]
async fn test_admin_creates_and_reads_menu() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/menus",
        Some(&token),
        &json!({
            "parent_id": 1,
            "path": "/system/audit",
            "name": "Audit",
            "title": "Audit Log",
            "sort": 5
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let created = body.unwrap()["data"].clone();
    assert_eq!(created["parent_id"], 1);
    assert_eq!(created["status"], "enabled");

    let id = created["id"].as_u64().unwrap();
    let (status, body): (_, Option<Value>) =
        get_json(&app, &format!("/api/v1/menus/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["title"], "Audit Log");
}

#[tokio::test]
async fn test_create_menu_validation_error() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/menus",
        Some(&token),
        &json!({ "path": "", "name": "Empty", "title": "Empty" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body.unwrap()["error"], "validation");
}

#[tokio::test]
async fn test_create_menu_under_disabled_parent() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, _): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/menus",
        Some(&token),
        &json!({ "parent_id": 3, "path": "/x", "name": "X", "title": "X" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_menu_is_not_found() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus/999", Some(&token)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["error"], "not_found");
}

#[tokio::test]
async fn test_update_menu_keeps_absent_fields() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = put_json(
        &app,
        "/api/v1/menus/4",
        Some(&token),
        &json!({ "icon": "gear" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let menu = body.unwrap()["data"].clone();
    assert_eq!(menu["icon"], "gear");
    assert_eq!(menu["parent_id"], 0);
    assert_eq!(menu["sort"], 2);
}

#[tokio::test]
async fn test_delete_menu_with_children_conflicts() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) =
        delete_json(&app, "/api/v1/menus/1", Some(&token)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["error"], "menu_has_children");
}

#[tokio::test]
async fn test_delete_leaf_menu() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) =
        delete_json(&app, "/api/v1/menus/4", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["message"], "Menu deleted successfully");

    let (status, _): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus/4", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_menu_auth_lifecycle() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) = post_json(
        &app,
        "/api/v1/menu-auths",
        Some(&token),
        &json!({ "menu_id": 4, "mark": "export", "title": "Export" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let auth_id = body.unwrap()["data"]["id"].as_u64().unwrap();

    let (status, body): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus/4/auths", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let marks: Vec<String> = body.unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["mark"].as_str().unwrap().to_string())
        .collect();
    assert!(marks.contains(&"export".to_string()));

    let (status, body): (_, Option<Value>) = put_json(
        &app,
        &format!("/api/v1/menu-auths/{}", auth_id),
        Some(&token),
        &json!({ "title": "Export CSV" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["data"]["title"], "Export CSV");

    let (status, _): (_, Option<Value>) = delete_json(
        &app,
        &format!("/api/v1/menu-auths/{}", auth_id),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_platform_tree_nests_children() {
    let state = TestAppState::seeded().await;
    let token = state.admin_token();
    let app = build_test_router(state);

    let (status, body): (_, Option<Value>) =
        get_json(&app, "/api/v1/menus/tree", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let tree = body.unwrap()["data"].clone();
    let roots: Vec<u64> = tree
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_u64().unwrap())
        .collect();
    assert_eq!(roots, vec![1, 4]);
    assert_eq!(tree[0]["children"][0]["id"], 2);
    assert_eq!(tree[0]["meta"]["authList"][0]["mark"], "user:add");
}
