//! Menu catalog API handlers (platform admin only)

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{
    CreateMenuAuthInput, CreateMenuInput, Menu, MenuAuth, MenuTreeNode, UpdateMenuAuthInput,
    UpdateMenuInput,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::policy::{enforce, PolicyAction, PolicyInput, ResourceScope};
use crate::state::HasServices;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

fn require_catalog<S: HasServices>(state: &S, auth: &AuthUser, action: PolicyAction) -> Result<()> {
    enforce(
        state.config(),
        auth,
        &PolicyInput {
            action,
            scope: ResourceScope::Global,
        },
    )
}

// ==================== Menus ====================

#[utoipa::path(
    get,
    path = "/api/v1/menus",
    tag = "Menu Catalog",
    responses(
        (status = 200, description = "Flat list of all menus", body = Vec<Menu>),
        (status = 403, description = "Platform admin required")
    )
)]
/// List every menu of the catalog
pub async fn list_menus<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogRead)?;
    let menus = state.menu_service().list_menus().await?;
    Ok(Json(SuccessResponse::new(menus)))
}

#[utoipa::path(
    get,
    path = "/api/v1/menus/tree",
    tag = "Menu Catalog",
    responses(
        (status = 200, description = "Full catalog tree, everything granted", body = Vec<MenuTreeNode>),
        (status = 403, description = "Platform admin required")
    )
)]
/// Platform menu tree
pub async fn platform_menu_tree<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogRead)?;
    let tree = state.permission_service().resolve_platform_menu_tree().await?;
    Ok(Json(SuccessResponse::new(tree)))
}

#[utoipa::path(
    get,
    path = "/api/v1/menus/{id}",
    tag = "Menu Catalog",
    params(("id" = u64, Path, description = "Menu ID")),
    responses(
        (status = 200, description = "Menu", body = Menu),
        (status = 404, description = "Menu not found")
    )
)]
pub async fn get_menu<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogRead)?;
    let menu = state.menu_service().get_menu(id).await?;
    Ok(Json(SuccessResponse::new(menu)))
}

#[utoipa::path(
    post,
    path = "/api/v1/menus",
    tag = "Menu Catalog",
    request_body = CreateMenuInput,
    responses(
        (status = 201, description = "Menu created", body = Menu),
        (status = 400, description = "Parent missing or disabled"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_menu<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Json(input): Json<CreateMenuInput>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogWrite)?;
    let menu = state.menu_service().create_menu(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(menu))))
}

#[utoipa::path(
    put,
    path = "/api/v1/menus/{id}",
    tag = "Menu Catalog",
    params(("id" = u64, Path, description = "Menu ID")),
    request_body = UpdateMenuInput,
    responses(
        (status = 200, description = "Menu updated", body = Menu),
        (status = 400, description = "Invalid parent"),
        (status = 409, description = "Menu still has enabled children")
    )
)]
pub async fn update_menu<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<UpdateMenuInput>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogWrite)?;
    let menu = state.menu_service().update_menu(id, input).await?;
    Ok(Json(SuccessResponse::new(menu)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/menus/{id}",
    tag = "Menu Catalog",
    params(("id" = u64, Path, description = "Menu ID")),
    responses(
        (status = 200, description = "Menu deleted", body = MessageResponse),
        (status = 404, description = "Menu not found"),
        (status = 409, description = "Menu has children")
    )
)]
pub async fn delete_menu<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogWrite)?;
    state.menu_service().delete_menu(id).await?;
    Ok(Json(MessageResponse::new("Menu deleted successfully")))
}

// ==================== Button permissions ====================

#[utoipa::path(
    get,
    path = "/api/v1/menus/{id}/auths",
    tag = "Menu Catalog",
    params(("id" = u64, Path, description = "Menu ID")),
    responses(
        (status = 200, description = "Button permissions of the menu", body = Vec<MenuAuth>),
        (status = 404, description = "Menu not found")
    )
)]
pub async fn list_menu_auths<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogRead)?;
    let auths = state.menu_service().list_menu_auths(id).await?;
    Ok(Json(SuccessResponse::new(auths)))
}

#[utoipa::path(
    post,
    path = "/api/v1/menu-auths",
    tag = "Menu Catalog",
    request_body = CreateMenuAuthInput,
    responses(
        (status = 201, description = "Button permission created", body = MenuAuth),
        (status = 400, description = "Menu does not exist"),
        (status = 409, description = "Mark already used on this menu")
    )
)]
pub async fn create_menu_auth<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Json(input): Json<CreateMenuAuthInput>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogWrite)?;
    let created = state.menu_service().create_menu_auth(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/menu-auths/{id}",
    tag = "Menu Catalog",
    params(("id" = u64, Path, description = "Button permission ID")),
    request_body = UpdateMenuAuthInput,
    responses(
        (status = 200, description = "Button permission updated", body = MenuAuth),
        (status = 404, description = "Button permission not found")
    )
)]
pub async fn update_menu_auth<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<u64>,
    Json(input): Json<UpdateMenuAuthInput>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogWrite)?;
    let updated = state.menu_service().update_menu_auth(id, input).await?;
    Ok(Json(SuccessResponse::new(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/menu-auths/{id}",
    tag = "Menu Catalog",
    params(("id" = u64, Path, description = "Button permission ID")),
    responses(
        (status = 200, description = "Button permission deleted", body = MessageResponse),
        (status = 404, description = "Button permission not found")
    )
)]
pub async fn delete_menu_auth<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse> {
    require_catalog(&state, &auth, PolicyAction::MenuCatalogWrite)?;
    state.menu_service().delete_menu_auth(id).await?;
    Ok(Json(MessageResponse::new(
        "Button permission deleted successfully",
    )))
}
