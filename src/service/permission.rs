//! Menu tree resolution for platform admins, tenants, roles and end users
//!
//! Empty-scope policy per call site:
//! - platform: every catalog id is granted, nothing is filtered
//! - tenant: full catalog shown, granted = the tenant's scope (empty => nothing checked)
//! - role: catalog narrowed to the tenant scope (empty => empty tree)
//! - user: menus narrowed to the role's grants within the tenant menu scope
//!   (a menu whose parent is not granted stays hidden); every button of a
//!   kept menu is listed, granted only if the role holds it and the tenant
//!   button scope contains it (empty => all buttons unchecked)

use crate::domain::{MenuTreeNode, Role, User, Viewer};
use crate::error::{AppError, Result};
use crate::repository::{IdentityRepository, MenuRepository, ScopeRepository};
use crate::service::tree::{build_tree, filter_menus, id_set, retain_allowed, Allowed};
use std::collections::HashSet;
use std::sync::Arc;

/// Load a role the viewer is allowed to manage.
///
/// A viewer without tenant and super-admin rights is refused before the
/// lookup; a role of another tenant is refused after it.
pub(crate) async fn load_managed_role<I: IdentityRepository>(
    identity_repo: &I,
    role_id: u64,
    viewer: &Viewer,
) -> Result<Role> {
    if !viewer.is_super_admin && viewer.tenant_id.is_none() {
        return Err(AppError::Forbidden(
            "A tenant context is required to manage roles".to_string(),
        ));
    }

    let role = identity_repo
        .find_role_by_id(role_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Role {} not found", role_id)))?;

    if !viewer.can_manage_tenant(role.tenant_id) {
        return Err(AppError::Forbidden(format!(
            "Role {} belongs to another tenant",
            role_id
        )));
    }

    Ok(role)
}

/// A tenant's saved menu and button scope as lookup sets
pub(crate) struct TenantScope {
    pub menus: HashSet<u64>,
    pub auths: HashSet<u64>,
}

pub(crate) async fn load_tenant_scope<S: ScopeRepository>(
    scope_repo: &S,
    tenant_id: u64,
) -> Result<TenantScope> {
    let menu_ids = scope_repo.find_tenant_menu_ids(tenant_id).await?;
    let auth_ids = scope_repo.find_tenant_auth_ids(tenant_id).await?;
    Ok(TenantScope {
        menus: id_set(&menu_ids),
        auths: id_set(&auth_ids),
    })
}

fn record_resolution(viewer: &'static str) {
    metrics::counter!("admin9_menu_tree_resolutions_total", "viewer" => viewer).increment(1);
}

pub struct MenuPermissionService<M: MenuRepository, S: ScopeRepository, I: IdentityRepository> {
    menu_repo: Arc<M>,
    scope_repo: Arc<S>,
    identity_repo: Arc<I>,
}

impl<M: MenuRepository, S: ScopeRepository, I: IdentityRepository> MenuPermissionService<M, S, I> {
    pub fn new(menu_repo: Arc<M>, scope_repo: Arc<S>, identity_repo: Arc<I>) -> Self {
        Self {
            menu_repo,
            scope_repo,
            identity_repo,
        }
    }

    /// The whole catalog, disabled menus included, everything checked
    pub async fn resolve_platform_menu_tree(&self) -> Result<Vec<MenuTreeNode>> {
        let menus = self.menu_repo.list_menus().await?;
        let auths = self.menu_repo.list_auths().await?;

        let all_menus: HashSet<u64> = menus.iter().map(|menu| menu.id).collect();
        let all_auths: HashSet<u64> = auths.iter().map(|auth| auth.id).collect();

        record_resolution("platform");
        Ok(build_tree(&menus, &auths, &all_menus, &all_auths, true))
    }

    /// The whole catalog with the tenant's current scope checked
    pub async fn resolve_tenant_menu_tree(&self, tenant_id: u64) -> Result<Vec<MenuTreeNode>> {
        self.identity_repo
            .find_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;

        let scope = load_tenant_scope(self.scope_repo.as_ref(), tenant_id).await?;
        let menus = self.menu_repo.list_menus().await?;
        let auths = self.menu_repo.list_auths().await?;

        record_resolution("tenant");
        Ok(build_tree(&menus, &auths, &scope.menus, &scope.auths, true))
    }

    /// The tenant's scope as a tree, with the role's grants checked.
    ///
    /// Grants are re-filtered through the scope so stale rows never show
    /// up as checked. Disabled menus stay visible for assignment.
    pub async fn resolve_role_menu_tree(
        &self,
        role_id: u64,
        viewer: &Viewer,
    ) -> Result<Vec<MenuTreeNode>> {
        let role = load_managed_role(self.identity_repo.as_ref(), role_id, viewer).await?;
        let scope = load_tenant_scope(self.scope_repo.as_ref(), role.tenant_id).await?;

        let menus = self.menu_repo.list_menus().await?;
        let auths = self.menu_repo.list_auths().await?;
        let (menus, auths) = filter_menus(
            &menus,
            &auths,
            Allowed::Only(&scope.menus),
            Allowed::Only(&scope.auths),
        );

        let grants = self.scope_repo.find_role_grants(role.id).await?;
        let granted_menus = id_set(&retain_allowed(&grants.menu_ids, Allowed::Only(&scope.menus)));
        let granted_auths = id_set(&retain_allowed(&grants.auth_ids, Allowed::Only(&scope.auths)));

        tracing::debug!(
            role_id,
            tenant_id = role.tenant_id,
            menus = menus.len(),
            granted_menus = granted_menus.len(),
            "Resolved role menu tree"
        );
        record_resolution("role");
        Ok(build_tree(&menus, &auths, &granted_menus, &granted_auths, true))
    }

    /// What an end user sees: the enabled menus their role holds within the
    /// tenant scope.
    pub async fn resolve_user_menu_tree(
        &self,
        user_id: u64,
        tenant_id: u64,
    ) -> Result<Vec<MenuTreeNode>> {
        let user = self.load_tenant_user(user_id, tenant_id).await?;
        let scope = load_tenant_scope(self.scope_repo.as_ref(), tenant_id).await?;

        let grants = self.scope_repo.find_role_grants(user.role_id).await?;
        let granted_menus = id_set(&retain_allowed(&grants.menu_ids, Allowed::Only(&scope.menus)));
        let granted_auths = id_set(&retain_allowed(&grants.auth_ids, Allowed::Only(&scope.auths)));

        let menus = self.menu_repo.list_menus().await?;
        let auths = self.menu_repo.list_auths().await?;
        let (menus, auths) = filter_menus(
            &menus,
            &auths,
            Allowed::Only(&granted_menus),
            Allowed::Everything,
        );

        record_resolution("user");
        Ok(build_tree(&menus, &auths, &granted_menus, &granted_auths, false))
    }

    async fn load_tenant_user(&self, user_id: u64, tenant_id: u64) -> Result<User> {
        let user = self
            .identity_repo
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        if user.tenant_id != tenant_id {
            return Err(AppError::Forbidden(format!(
                "User {} does not belong to tenant {}",
                user_id, tenant_id
            )));
        }

        self.identity_repo
            .find_role_by_id(user.role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Role {} not found", user.role_id)))?;

        Ok(user)
    }
}
