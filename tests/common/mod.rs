//! Common test utilities
//!
//! `InMemoryStore` implements every repository trait over plain collections
//! behind one `RwLock`, so a scope replace and its role prune are atomic the
//! same way the MySQL transaction is.

#![allow(dead_code)]

use admin9_core::domain::{
    CreateMenuAuthInput, CreateMenuInput, GrantedIds, Menu, MenuAuth, MenuStatus, MenuTreeNode,
    Role, Tenant, UpdateMenuAuthInput, User,
};
use admin9_core::error::{AppError, Result};
use admin9_core::repository::{IdentityRepository, MenuRepository, ScopeRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreData {
    next_menu_id: u64,
    next_auth_id: u64,
    menus: BTreeMap<u64, Menu>,
    auths: BTreeMap<u64, MenuAuth>,
    tenants: BTreeMap<u64, Tenant>,
    roles: BTreeMap<u64, Role>,
    users: BTreeMap<u64, User>,
    tenant_menus: BTreeMap<u64, BTreeSet<u64>>,
    tenant_auths: BTreeMap<u64, BTreeSet<u64>>,
    role_menus: BTreeMap<u64, BTreeSet<u64>>,
    role_auths: BTreeMap<u64, BTreeSet<u64>>,
}

impl StoreData {
    fn forget_menu(&mut self, menu_id: u64) {
        for ids in self.tenant_menus.values_mut() {
            ids.remove(&menu_id);
        }
        for ids in self.role_menus.values_mut() {
            ids.remove(&menu_id);
        }
    }

    fn forget_auth(&mut self, auth_id: u64) {
        for ids in self.tenant_auths.values_mut() {
            ids.remove(&auth_id);
        }
        for ids in self.role_auths.values_mut() {
            ids.remove(&auth_id);
        }
    }
}

/// In-memory backing store for all three repositories
#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<StoreData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a menu with an explicit id
    pub async fn add_menu(&self, menu: Menu) {
        let mut data = self.data.write().await;
        data.next_menu_id = data.next_menu_id.max(menu.id);
        data.menus.insert(menu.id, menu);
    }

    /// Insert a button permission with an explicit id
    pub async fn add_auth(&self, auth: MenuAuth) {
        let mut data = self.data.write().await;
        data.next_auth_id = data.next_auth_id.max(auth.id);
        data.auths.insert(auth.id, auth);
    }

    pub async fn add_tenant(&self, id: u64, name: &str) {
        self.data.write().await.tenants.insert(
            id,
            Tenant {
                id,
                name: name.to_string(),
            },
        );
    }

    pub async fn add_role(&self, id: u64, tenant_id: u64) {
        self.data.write().await.roles.insert(
            id,
            Role {
                id,
                tenant_id,
                name: format!("role-{}", id),
            },
        );
    }

    pub async fn add_user(&self, id: u64, tenant_id: u64, role_id: u64) {
        self.data.write().await.users.insert(
            id,
            User {
                id,
                tenant_id,
                role_id,
                username: format!("user-{}", id),
            },
        );
    }

    /// Seed a tenant scope directly, bypassing validation
    pub async fn set_tenant_scope(&self, tenant_id: u64, menu_ids: &[u64], auth_ids: &[u64]) {
        let mut data = self.data.write().await;
        data.tenant_menus
            .insert(tenant_id, menu_ids.iter().copied().collect());
        data.tenant_auths
            .insert(tenant_id, auth_ids.iter().copied().collect());
    }

    /// Seed role grants directly, bypassing validation
    pub async fn set_role_grants(&self, role_id: u64, menu_ids: &[u64], auth_ids: &[u64]) {
        let mut data = self.data.write().await;
        data.role_menus
            .insert(role_id, menu_ids.iter().copied().collect());
        data.role_auths
            .insert(role_id, auth_ids.iter().copied().collect());
    }

    pub async fn tenant_scope(&self, tenant_id: u64) -> (Vec<u64>, Vec<u64>) {
        let data = self.data.read().await;
        (
            ids_of(data.tenant_menus.get(&tenant_id)),
            ids_of(data.tenant_auths.get(&tenant_id)),
        )
    }

    pub async fn role_grants(&self, role_id: u64) -> (Vec<u64>, Vec<u64>) {
        let data = self.data.read().await;
        (
            ids_of(data.role_menus.get(&role_id)),
            ids_of(data.role_auths.get(&role_id)),
        )
    }
}

fn ids_of(ids: Option<&BTreeSet<u64>>) -> Vec<u64> {
    ids.map(|ids| ids.iter().copied().collect())
        .unwrap_or_default()
}

#[async_trait]
impl MenuRepository for InMemoryStore {
    async fn list_menus(&self) -> Result<Vec<Menu>> {
        Ok(self.data.read().await.menus.values().cloned().collect())
    }

    async fn find_menu_by_id(&self, id: u64) -> Result<Option<Menu>> {
        Ok(self.data.read().await.menus.get(&id).cloned())
    }

    async fn find_child_menus(&self, parent_id: u64) -> Result<Vec<Menu>> {
        Ok(self
            .data
            .read()
            .await
            .menus
            .values()
            .filter(|menu| menu.parent_id == parent_id && menu.id != parent_id)
            .cloned()
            .collect())
    }

    async fn create_menu(&self, input: &CreateMenuInput) -> Result<Menu> {
        let mut data = self.data.write().await;
        data.next_menu_id += 1;
        let menu = Menu {
            id: data.next_menu_id,
            parent_id: input.parent_id,
            path: input.path.clone(),
            name: input.name.clone(),
            component: input.component.clone(),
            title: input.title.clone(),
            icon: input.icon.clone(),
            hidden: input.hidden,
            hide_tab: input.hide_tab,
            is_iframe: input.is_iframe,
            keep_alive: input.keep_alive,
            is_first_level: input.is_first_level,
            status: input.status,
            sort: input.sort,
            updated_at: Utc::now(),
        };
        data.menus.insert(menu.id, menu.clone());
        Ok(menu)
    }

    async fn update_menu(&self, menu: &Menu) -> Result<Menu> {
        let mut data = self.data.write().await;
        let stored = data
            .menus
            .get_mut(&menu.id)
            .ok_or_else(|| AppError::NotFound(format!("Menu {} not found", menu.id)))?;
        *stored = Menu {
            updated_at: Utc::now(),
            ..menu.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_menu(&self, id: u64) -> Result<()> {
        let mut data = self.data.write().await;
        if data.menus.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Menu {} not found", id)));
        }
        let auth_ids: Vec<u64> = data
            .auths
            .values()
            .filter(|auth| auth.menu_id == id)
            .map(|auth| auth.id)
            .collect();
        for auth_id in auth_ids {
            data.auths.remove(&auth_id);
            data.forget_auth(auth_id);
        }
        data.forget_menu(id);
        Ok(())
    }

    async fn list_auths(&self) -> Result<Vec<MenuAuth>> {
        Ok(self.data.read().await.auths.values().cloned().collect())
    }

    async fn find_auth_by_id(&self, id: u64) -> Result<Option<MenuAuth>> {
        Ok(self.data.read().await.auths.get(&id).cloned())
    }

    async fn find_auths_by_menu(&self, menu_id: u64) -> Result<Vec<MenuAuth>> {
        Ok(self
            .data
            .read()
            .await
            .auths
            .values()
            .filter(|auth| auth.menu_id == menu_id)
            .cloned()
            .collect())
    }

    async fn create_auth(&self, input: &CreateMenuAuthInput) -> Result<MenuAuth> {
        let mut data = self.data.write().await;
        data.next_auth_id += 1;
        let auth = MenuAuth {
            id: data.next_auth_id,
            menu_id: input.menu_id,
            mark: input.mark.clone(),
            title: input.title.clone(),
        };
        data.auths.insert(auth.id, auth.clone());
        Ok(auth)
    }

    async fn update_auth(&self, id: u64, input: &UpdateMenuAuthInput) -> Result<MenuAuth> {
        let mut data = self.data.write().await;
        let auth = data
            .auths
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Menu auth {} not found", id)))?;
        if let Some(mark) = &input.mark {
            auth.mark = mark.clone();
        }
        if let Some(title) = &input.title {
            auth.title = title.clone();
        }
        Ok(auth.clone())
    }

    async fn delete_auth(&self, id: u64) -> Result<()> {
        let mut data = self.data.write().await;
        if data.auths.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Menu auth {} not found", id)));
        }
        data.forget_auth(id);
        Ok(())
    }
}

#[async_trait]
impl ScopeRepository for InMemoryStore {
    async fn find_tenant_menu_ids(&self, tenant_id: u64) -> Result<Vec<u64>> {
        Ok(ids_of(self.data.read().await.tenant_menus.get(&tenant_id)))
    }

    async fn find_tenant_auth_ids(&self, tenant_id: u64) -> Result<Vec<u64>> {
        Ok(ids_of(self.data.read().await.tenant_auths.get(&tenant_id)))
    }

    async fn find_role_grants(&self, role_id: u64) -> Result<GrantedIds> {
        let data = self.data.read().await;
        Ok(GrantedIds {
            menu_ids: ids_of(data.role_menus.get(&role_id)),
            auth_ids: ids_of(data.role_auths.get(&role_id)),
        })
    }

    async fn replace_tenant_scope(&self, tenant_id: u64, scope: &GrantedIds) -> Result<()> {
        let mut data = self.data.write().await;
        let menus: BTreeSet<u64> = scope.menu_ids.iter().copied().collect();
        let auths: BTreeSet<u64> = scope.auth_ids.iter().copied().collect();

        let role_ids: Vec<u64> = data
            .roles
            .values()
            .filter(|role| role.tenant_id == tenant_id)
            .map(|role| role.id)
            .collect();

        let owning_menu: BTreeMap<u64, u64> = data
            .auths
            .values()
            .map(|auth| (auth.id, auth.menu_id))
            .collect();

        for role_id in role_ids {
            if let Some(granted) = data.role_menus.get_mut(&role_id) {
                granted.retain(|id| menus.contains(id));
            }
            if let Some(granted) = data.role_auths.get_mut(&role_id) {
                granted.retain(|id| {
                    auths.contains(id)
                        && owning_menu
                            .get(id)
                            .is_some_and(|menu_id| menus.contains(menu_id))
                });
            }
        }

        data.tenant_menus.insert(tenant_id, menus);
        data.tenant_auths.insert(tenant_id, auths);
        Ok(())
    }

    async fn replace_role_grants(&self, role_id: u64, grants: &GrantedIds) -> Result<()> {
        let mut data = self.data.write().await;
        data.role_menus
            .insert(role_id, grants.menu_ids.iter().copied().collect());
        data.role_auths
            .insert(role_id, grants.auth_ids.iter().copied().collect());
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn find_tenant_by_id(&self, id: u64) -> Result<Option<Tenant>> {
        Ok(self.data.read().await.tenants.get(&id).cloned())
    }

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>> {
        Ok(self.data.read().await.roles.get(&id).cloned())
    }

    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn menu(id: u64, parent_id: u64, sort: i32) -> Menu {
    Menu {
        id,
        parent_id,
        path: format!("menu-{}", id),
        name: format!("Menu{}", id),
        title: format!("Menu {}", id),
        sort,
        ..Default::default()
    }
}

pub fn disabled_menu(id: u64, parent_id: u64) -> Menu {
    Menu {
        status: MenuStatus::Disabled,
        ..menu(id, parent_id, 0)
    }
}

pub fn auth(id: u64, menu_id: u64, mark: &str) -> MenuAuth {
    MenuAuth {
        id,
        menu_id,
        mark: mark.to_string(),
        title: mark.to_string(),
    }
}

/// Catalog used across the integration tests:
///
/// ```text
/// 1 System            auths 11 user:add, 12 user:delete
/// ├── 2 Users         auth  21 user:export
/// └── 3 Roles (disabled)
/// 4 Reports           auth  41 report:view
/// ```
pub async fn seed_catalog(store: &InMemoryStore) {
    store.add_menu(menu(1, 0, 1)).await;
    store.add_menu(menu(2, 1, 1)).await;
    store.add_menu(disabled_menu(3, 1)).await;
    store.add_menu(menu(4, 0, 2)).await;

    store.add_auth(auth(11, 1, "user:add")).await;
    store.add_auth(auth(12, 1, "user:delete")).await;
    store.add_auth(auth(21, 2, "user:export")).await;
    store.add_auth(auth(41, 4, "report:view")).await;
}

/// Pre-order walk of a rendered tree
pub fn walk(tree: &[MenuTreeNode]) -> Vec<&MenuTreeNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&MenuTreeNode> = tree.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }
    out
}

pub fn find_node(tree: &[MenuTreeNode], id: u64) -> Option<&MenuTreeNode> {
    walk(tree).into_iter().find(|node| node.id == id)
}

pub fn node_ids(tree: &[MenuTreeNode]) -> Vec<u64> {
    walk(tree).into_iter().map(|node| node.id).collect()
}

/// Ids of nodes flagged `hasPermission`, pre-order
pub fn checked_menu_ids(tree: &[MenuTreeNode]) -> Vec<u64> {
    walk(tree)
        .into_iter()
        .filter(|node| node.meta.has_permission)
        .map(|node| node.id)
        .collect()
}

pub fn checked_auth_ids(tree: &[MenuTreeNode]) -> Vec<u64> {
    walk(tree)
        .into_iter()
        .flat_map(|node| node.meta.auth_list.iter())
        .filter(|auth| auth.has_permission)
        .map(|auth| auth.id)
        .collect()
}

/// Flip `hasPermission` on the given menus and buttons, clear everything else
pub fn check_only(tree: &mut [MenuTreeNode], menus: &[u64], auths: &[u64]) {
    for node in tree.iter_mut() {
        node.meta.has_permission = menus.contains(&node.id);
        for auth in node.meta.auth_list.iter_mut() {
            auth.has_permission = auths.contains(&auth.id);
        }
        check_only(&mut node.children, menus, auths);
    }
}
