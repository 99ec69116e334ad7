//! Menu catalog business logic

use crate::domain::{
    CreateMenuAuthInput, CreateMenuInput, Menu, MenuAuth, UpdateMenuAuthInput, UpdateMenuInput,
    ROOT_MENU_ID,
};
use crate::error::{AppError, Result};
use crate::repository::MenuRepository;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

pub struct MenuService<M: MenuRepository> {
    repo: Arc<M>,
}

impl<M: MenuRepository> MenuService<M> {
    pub fn new(repo: Arc<M>) -> Self {
        Self { repo }
    }

    // ==================== Menus ====================

    pub async fn list_menus(&self) -> Result<Vec<Menu>> {
        self.repo.list_menus().await
    }

    pub async fn get_menu(&self, id: u64) -> Result<Menu> {
        self.repo
            .find_menu_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Menu {} not found", id)))
    }

    pub async fn create_menu(&self, input: CreateMenuInput) -> Result<Menu> {
        input.validate()?;
        if input.parent_id != ROOT_MENU_ID {
            self.require_enabled_parent(input.parent_id).await?;
        }

        let menu = self.repo.create_menu(&input).await?;
        tracing::info!(menu_id = menu.id, parent_id = menu.parent_id, "Created menu");
        Ok(menu)
    }

    pub async fn update_menu(&self, id: u64, input: UpdateMenuInput) -> Result<Menu> {
        input.validate()?;
        let existing = self.get_menu(id).await?;
        let merged = input.apply_to(&existing);

        if !merged.is_root() {
            self.check_circular_parent(id, merged.parent_id).await?;
            self.require_enabled_parent(merged.parent_id).await?;
        }

        if existing.is_enabled() && !merged.is_enabled() {
            let children = self.repo.find_child_menus(id).await?;
            if let Some(child) = children.iter().find(|child| child.is_enabled()) {
                return Err(AppError::Conflict(format!(
                    "Menu {} has enabled child menu {} and cannot be disabled",
                    id, child.id
                )));
            }
        }

        self.repo.update_menu(&merged).await
    }

    /// Delete a menu together with its button permissions.
    ///
    /// Refused while the menu has any child, enabled or not. Scope and role
    /// rows pointing at the menu or its buttons go in the same transaction.
    pub async fn delete_menu(&self, id: u64) -> Result<()> {
        let _ = self.get_menu(id).await?;

        if !self.repo.find_child_menus(id).await?.is_empty() {
            return Err(AppError::MenuHasChildren(id));
        }

        self.repo.delete_menu(id).await?;
        tracing::info!(menu_id = id, "Deleted menu");
        Ok(())
    }

    async fn require_enabled_parent(&self, parent_id: u64) -> Result<()> {
        match self.repo.find_menu_by_id(parent_id).await? {
            Some(parent) if parent.is_enabled() => Ok(()),
            Some(_) => Err(AppError::BadRequest(format!(
                "Parent menu {} is disabled",
                parent_id
            ))),
            None => Err(AppError::BadRequest(format!(
                "Parent menu {} does not exist",
                parent_id
            ))),
        }
    }

    /// Walk up from `new_parent_id`; reaching `menu_id` means the move would
    /// create a cycle.
    async fn check_circular_parent(&self, menu_id: u64, new_parent_id: u64) -> Result<()> {
        if menu_id == new_parent_id {
            return Err(AppError::BadRequest(
                "A menu cannot be its own parent".to_string(),
            ));
        }

        let mut visited = HashSet::from([menu_id]);
        let mut current_id = new_parent_id;

        while current_id != ROOT_MENU_ID {
            if !visited.insert(current_id) {
                return Err(AppError::BadRequest(
                    "Circular parent detected: this would create a cycle in the menu tree"
                        .to_string(),
                ));
            }

            current_id = match self.repo.find_menu_by_id(current_id).await? {
                Some(parent) => parent.parent_id,
                None => {
                    return Err(AppError::BadRequest(format!(
                        "Parent menu {} does not exist",
                        current_id
                    )))
                }
            };
        }

        Ok(())
    }

    // ==================== Button permissions ====================

    pub async fn list_menu_auths(&self, menu_id: u64) -> Result<Vec<MenuAuth>> {
        let _ = self.get_menu(menu_id).await?;
        self.repo.find_auths_by_menu(menu_id).await
    }

    pub async fn get_menu_auth(&self, id: u64) -> Result<MenuAuth> {
        self.repo
            .find_auth_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Menu auth {} not found", id)))
    }

    pub async fn create_menu_auth(&self, input: CreateMenuAuthInput) -> Result<MenuAuth> {
        input.validate()?;
        if self.repo.find_menu_by_id(input.menu_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Menu {} does not exist",
                input.menu_id
            )));
        }
        self.ensure_unique_mark(input.menu_id, &input.mark, None)
            .await?;

        let auth = self.repo.create_auth(&input).await?;
        tracing::info!(auth_id = auth.id, menu_id = auth.menu_id, "Created menu auth");
        Ok(auth)
    }

    pub async fn update_menu_auth(&self, id: u64, input: UpdateMenuAuthInput) -> Result<MenuAuth> {
        input.validate()?;
        let existing = self.get_menu_auth(id).await?;
        if let Some(mark) = &input.mark {
            if *mark != existing.mark {
                self.ensure_unique_mark(existing.menu_id, mark, Some(id))
                    .await?;
            }
        }

        self.repo.update_auth(id, &input).await
    }

    /// Delete a button permission. Tenant scopes and role grants holding it
    /// are cleared in the same transaction; they do not block the delete.
    pub async fn delete_menu_auth(&self, id: u64) -> Result<()> {
        let _ = self.get_menu_auth(id).await?;
        self.repo.delete_auth(id).await?;
        tracing::info!(auth_id = id, "Deleted menu auth");
        Ok(())
    }

    async fn ensure_unique_mark(&self, menu_id: u64, mark: &str, except: Option<u64>) -> Result<()> {
        let taken = self
            .repo
            .find_auths_by_menu(menu_id)
            .await?
            .into_iter()
            .any(|auth| auth.mark == mark && Some(auth.id) != except);

        if taken {
            return Err(AppError::Conflict(format!(
                "Menu {} already has a button permission '{}'",
                menu_id, mark
            )));
        }
        Ok(())
    }
}
