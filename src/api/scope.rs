//! Menu trees per tenant, role and caller

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::MenuTreeNode;
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::policy::{self, enforce, PolicyAction, PolicyInput, ResourceScope};
use crate::state::HasServices;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}/menus",
    tag = "Menu Scopes",
    params(("id" = u64, Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Full catalog flagged with the tenant scope", body = Vec<MenuTreeNode>),
        (status = 403, description = "Another tenant")
    )
)]
/// Tenant scope as a tree
pub async fn get_tenant_menus<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(tenant_id): Path<u64>,
) -> Result<impl IntoResponse> {
    enforce(
        state.config(),
        &auth,
        &PolicyInput {
            action: PolicyAction::TenantScopeRead,
            scope: ResourceScope::Tenant(tenant_id),
        },
    )?;

    let tree = state
        .permission_service()
        .resolve_tenant_menu_tree(tenant_id)
        .await?;
    Ok(Json(SuccessResponse::new(tree)))
}

#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}/menus",
    tag = "Menu Scopes",
    params(("id" = u64, Path, description = "Tenant ID")),
    request_body = Vec<MenuTreeNode>,
    responses(
        (status = 200, description = "Scope saved, tree as stored", body = Vec<MenuTreeNode>),
        (status = 400, description = "Unknown or zero ids in the tree"),
        (status = 403, description = "Platform admin required"),
        (status = 404, description = "Tenant not found")
    )
)]
/// Replace a tenant's scope and prune its roles
pub async fn update_tenant_menus<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(tenant_id): Path<u64>,
    Json(tree): Json<Vec<MenuTreeNode>>,
) -> Result<impl IntoResponse> {
    enforce(
        state.config(),
        &auth,
        &PolicyInput {
            action: PolicyAction::TenantScopeWrite,
            scope: ResourceScope::Tenant(tenant_id),
        },
    )?;

    let saved = state
        .assignment_service()
        .update_tenant_scope(tenant_id, &tree)
        .await?;
    Ok(Json(SuccessResponse::new(saved)))
}

#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}/menus",
    tag = "Menu Scopes",
    params(("id" = u64, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Tenant scope flagged with the role's grants", body = Vec<MenuTreeNode>),
        (status = 403, description = "Role belongs to another tenant"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn get_role_menus<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(role_id): Path<u64>,
) -> Result<impl IntoResponse> {
    enforce(
        state.config(),
        &auth,
        &PolicyInput {
            action: PolicyAction::RoleMenuRead,
            scope: ResourceScope::Global,
        },
    )?;

    let viewer = policy::viewer(state.config(), &auth);
    let tree = state
        .permission_service()
        .resolve_role_menu_tree(role_id, &viewer)
        .await?;
    Ok(Json(SuccessResponse::new(tree)))
}

#[utoipa::path(
    put,
    path = "/api/v1/roles/{id}/menus",
    tag = "Menu Scopes",
    params(("id" = u64, Path, description = "Role ID")),
    request_body = Vec<MenuTreeNode>,
    responses(
        (status = 200, description = "Grants replaced", body = MessageResponse),
        (status = 400, description = "Zero ids in the tree"),
        (status = 403, description = "Role of another tenant, or menus/buttons outside the tenant scope"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn update_role_menus<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(role_id): Path<u64>,
    Json(tree): Json<Vec<MenuTreeNode>>,
) -> Result<impl IntoResponse> {
    enforce(
        state.config(),
        &auth,
        &PolicyInput {
            action: PolicyAction::RoleMenuWrite,
            scope: ResourceScope::Global,
        },
    )?;

    let viewer = policy::viewer(state.config(), &auth);
    state
        .assignment_service()
        .update_role_assignment(role_id, &tree, &viewer)
        .await?;
    Ok(Json(MessageResponse::new("Role menus updated successfully")))
}

#[utoipa::path(
    get,
    path = "/api/v1/me/menus",
    tag = "Menu Scopes",
    responses(
        (status = 200, description = "Enabled menus of the caller's tenant, flagged by their role", body = Vec<MenuTreeNode>),
        (status = 403, description = "No tenant in token")
    )
)]
/// The caller's own menu tree
pub async fn get_my_menus<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
) -> Result<impl IntoResponse> {
    enforce(
        state.config(),
        &auth,
        &PolicyInput {
            action: PolicyAction::SelfMenuRead,
            scope: ResourceScope::Global,
        },
    )?;

    let tenant_id = policy::tenant_id(&auth)?;
    let tree = state
        .permission_service()
        .resolve_user_menu_tree(auth.user_id, tenant_id)
        .await?;
    Ok(Json(SuccessResponse::new(tree)))
}
