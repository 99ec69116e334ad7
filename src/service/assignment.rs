//! Saving tenant scopes and role grants from submitted menu trees

use crate::domain::{GrantedIds, MenuTreeNode, Viewer};
use crate::error::{AppError, Result};
use crate::repository::{IdentityRepository, MenuRepository, ScopeRepository};
use crate::service::permission::{load_managed_role, load_tenant_scope};
use crate::service::tree::{
    auths_outside_menus, build_tree, collect_menu_ids, extract_checked_auth_ids,
    extract_checked_menu_ids, id_set, menus_missing_parent, misplaced_auths,
    validate_submitted_tree,
};
use std::collections::HashSet;
use std::sync::Arc;

fn record_scope_update<T>(target: &'static str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(AppError::Database(_)) | Err(AppError::Internal(_)) => "error",
        Err(_) => "rejected",
    };
    metrics::counter!("admin9_scope_updates_total", "target" => target, "outcome" => outcome)
        .increment(1);
}

/// Ids of `ids` missing from `allowed`, in submission order
fn outside(ids: &[u64], allowed: &HashSet<u64>) -> Vec<u64> {
    ids.iter()
        .copied()
        .filter(|id| !allowed.contains(id))
        .collect()
}

pub struct ScopeAssignmentService<M: MenuRepository, S: ScopeRepository, I: IdentityRepository> {
    menu_repo: Arc<M>,
    scope_repo: Arc<S>,
    identity_repo: Arc<I>,
}

impl<M: MenuRepository, S: ScopeRepository, I: IdentityRepository> ScopeAssignmentService<M, S, I> {
    pub fn new(menu_repo: Arc<M>, scope_repo: Arc<S>, identity_repo: Arc<I>) -> Self {
        Self {
            menu_repo,
            scope_repo,
            identity_repo,
        }
    }

    /// Replace a tenant's scope with the checked entries of `tree` and prune
    /// the tenant's roles down to it. Returns the tenant tree as saved.
    ///
    /// A checked menu needs its parent checked too, and a checked button
    /// needs to sit under its own, checked, menu.
    ///
    /// Callers must have checked that the caller is a super admin.
    pub async fn update_tenant_scope(
        &self,
        tenant_id: u64,
        tree: &[MenuTreeNode],
    ) -> Result<Vec<MenuTreeNode>> {
        let result = self.save_tenant_scope(tenant_id, tree).await;
        record_scope_update("tenant", &result);
        result
    }

    async fn save_tenant_scope(
        &self,
        tenant_id: u64,
        tree: &[MenuTreeNode],
    ) -> Result<Vec<MenuTreeNode>> {
        self.identity_repo
            .find_tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;
        validate_submitted_tree(tree)?;

        let scope = GrantedIds {
            menu_ids: extract_checked_menu_ids(tree),
            auth_ids: extract_checked_auth_ids(tree),
        };

        let menus = self.menu_repo.list_menus().await?;
        let auths = self.menu_repo.list_auths().await?;

        let catalog_menus: HashSet<u64> = menus.iter().map(|menu| menu.id).collect();
        let unknown_menus = outside(&scope.menu_ids, &catalog_menus);
        if !unknown_menus.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Unknown menu ids: {:?}",
                unknown_menus
            )));
        }

        let catalog_auths: HashSet<u64> = auths.iter().map(|auth| auth.id).collect();
        let unknown_auths = outside(&scope.auth_ids, &catalog_auths);
        if !unknown_auths.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Unknown button permission ids: {:?}",
                unknown_auths
            )));
        }

        // Every checked menu must be reachable from the root through checked menus
        let orphans = menus_missing_parent(&scope.menu_ids, &menus);
        if !orphans.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Menus checked without their parent menu: {:?}",
                orphans
            )));
        }

        let misplaced = misplaced_auths(tree, &auths);
        if !misplaced.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Button permissions listed under a menu that does not own them: {:?}",
                misplaced
            )));
        }

        let unowned = auths_outside_menus(&scope.auth_ids, &auths, &id_set(&scope.menu_ids));
        if !unowned.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Button permissions checked without their menu: {:?}",
                unowned
            )));
        }

        self.scope_repo
            .replace_tenant_scope(tenant_id, &scope)
            .await?;

        tracing::info!(
            tenant_id,
            menus = scope.menu_ids.len(),
            auths = scope.auth_ids.len(),
            "Saved tenant menu scope"
        );

        Ok(build_tree(
            &menus,
            &auths,
            &id_set(&scope.menu_ids),
            &id_set(&scope.auth_ids),
            true,
        ))
    }

    /// Replace a role's grants with the checked entries of `tree`.
    ///
    /// Every node of the tree must lie in the tenant's menu scope, checked
    /// or not, since clients submit back the full tree they were given.
    /// Every checked button must lie in the tenant's button scope; an empty
    /// button scope therefore admits no checked button at all. A checked
    /// button must sit under the menu owning it.
    pub async fn update_role_assignment(
        &self,
        role_id: u64,
        tree: &[MenuTreeNode],
        viewer: &Viewer,
    ) -> Result<()> {
        let result = self.save_role_assignment(role_id, tree, viewer).await;
        record_scope_update("role", &result);
        result
    }

    async fn save_role_assignment(
        &self,
        role_id: u64,
        tree: &[MenuTreeNode],
        viewer: &Viewer,
    ) -> Result<()> {
        let role = load_managed_role(self.identity_repo.as_ref(), role_id, viewer).await?;
        validate_submitted_tree(tree)?;
        let scope = load_tenant_scope(self.scope_repo.as_ref(), role.tenant_id).await?;

        let stray_menus = outside(&collect_menu_ids(tree), &scope.menus);
        if !stray_menus.is_empty() {
            tracing::warn!(
                role_id,
                tenant_id = role.tenant_id,
                ids = ?stray_menus,
                "Rejected role assignment with menus outside tenant scope"
            );
            return Err(AppError::MenuOutOfScope(stray_menus));
        }

        let auth_ids = extract_checked_auth_ids(tree);
        let stray_auths = outside(&auth_ids, &scope.auths);
        if !stray_auths.is_empty() {
            tracing::warn!(
                role_id,
                tenant_id = role.tenant_id,
                ids = ?stray_auths,
                "Rejected role assignment with buttons outside tenant scope"
            );
            return Err(AppError::AuthOutOfScope(stray_auths));
        }

        if !auth_ids.is_empty() {
            let auths = self.menu_repo.list_auths().await?;
            let misplaced = misplaced_auths(tree, &auths);
            if !misplaced.is_empty() {
                return Err(AppError::BadRequest(format!(
                    "Button permissions listed under a menu that does not own them: {:?}",
                    misplaced
                )));
            }
        }

        let grants = GrantedIds {
            menu_ids: extract_checked_menu_ids(tree),
            auth_ids,
        };
        self.scope_repo.replace_role_grants(role.id, &grants).await?;

        tracing::info!(
            role_id,
            tenant_id = role.tenant_id,
            menus = grants.menu_ids.len(),
            auths = grants.auth_ids.len(),
            "Saved role menu grants"
        );
        Ok(())
    }
}
