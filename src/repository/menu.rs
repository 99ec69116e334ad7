//! Menu catalog repository (menus and button permissions)

use crate::domain::{CreateMenuAuthInput, CreateMenuInput, Menu, MenuAuth, UpdateMenuAuthInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

const MENU_COLUMNS: &str = "id, parent_id, path, name, component, title, icon, hidden, hide_tab, \
     is_iframe, keep_alive, is_first_level, status, sort, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MenuRepository: Send + Sync {
    // Menus
    async fn list_menus(&self) -> Result<Vec<Menu>>;
    async fn find_menu_by_id(&self, id: u64) -> Result<Option<Menu>>;
    async fn find_child_menus(&self, parent_id: u64) -> Result<Vec<Menu>>;
    async fn create_menu(&self, input: &CreateMenuInput) -> Result<Menu>;
    async fn update_menu(&self, menu: &Menu) -> Result<Menu>;
    /// Removes the menu, its button permissions and every scope/role row pointing at them
    async fn delete_menu(&self, id: u64) -> Result<()>;

    // Button permissions
    async fn list_auths(&self) -> Result<Vec<MenuAuth>>;
    async fn find_auth_by_id(&self, id: u64) -> Result<Option<MenuAuth>>;
    async fn find_auths_by_menu(&self, menu_id: u64) -> Result<Vec<MenuAuth>>;
    async fn create_auth(&self, input: &CreateMenuAuthInput) -> Result<MenuAuth>;
    async fn update_auth(&self, id: u64, input: &UpdateMenuAuthInput) -> Result<MenuAuth>;
    /// Removes the button permission and every scope/role row pointing at it
    async fn delete_auth(&self, id: u64) -> Result<()>;
}

pub struct MenuRepositoryImpl {
    pool: MySqlPool,
}

impl MenuRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MenuRepository for MenuRepositoryImpl {
    async fn list_menus(&self) -> Result<Vec<Menu>> {
        let menus = sqlx::query_as::<_, Menu>(&format!(
            "SELECT {} FROM menus ORDER BY id",
            MENU_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(menus)
    }

    async fn find_menu_by_id(&self, id: u64) -> Result<Option<Menu>> {
        let menu = sqlx::query_as::<_, Menu>(&format!(
            "SELECT {} FROM menus WHERE id = ?",
            MENU_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(menu)
    }

    async fn find_child_menus(&self, parent_id: u64) -> Result<Vec<Menu>> {
        let menus = sqlx::query_as::<_, Menu>(&format!(
            "SELECT {} FROM menus WHERE parent_id = ? ORDER BY id",
            MENU_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(menus)
    }

    async fn create_menu(&self, input: &CreateMenuInput) -> Result<Menu> {
        let result = sqlx::query(
            r#"
            INSERT INTO menus (parent_id, path, name, component, title, icon, hidden, hide_tab,
                               is_iframe, keep_alive, is_first_level, status, sort, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW())
            "#,
        )
        .bind(input.parent_id)
        .bind(&input.path)
        .bind(&input.name)
        .bind(&input.component)
        .bind(&input.title)
        .bind(&input.icon)
        .bind(input.hidden)
        .bind(input.hide_tab)
        .bind(input.is_iframe)
        .bind(input.keep_alive)
        .bind(input.is_first_level)
        .bind(input.status)
        .bind(input.sort)
        .execute(&self.pool)
        .await?;

        self.find_menu_by_id(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create menu")))
    }

    async fn update_menu(&self, menu: &Menu) -> Result<Menu> {
        let result = sqlx::query(
            r#"
            UPDATE menus
            SET parent_id = ?, path = ?, name = ?, component = ?, title = ?, icon = ?,
                hidden = ?, hide_tab = ?, is_iframe = ?, keep_alive = ?, is_first_level = ?,
                status = ?, sort = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(menu.parent_id)
        .bind(&menu.path)
        .bind(&menu.name)
        .bind(&menu.component)
        .bind(&menu.title)
        .bind(&menu.icon)
        .bind(menu.hidden)
        .bind(menu.hide_tab)
        .bind(menu.is_iframe)
        .bind(menu.keep_alive)
        .bind(menu.is_first_level)
        .bind(menu.status)
        .bind(menu.sort)
        .bind(menu.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 && self.find_menu_by_id(menu.id).await?.is_none() {
            return Err(AppError::NotFound(format!("Menu {} not found", menu.id)));
        }

        self.find_menu_by_id(menu.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update menu")))
    }

    async fn delete_menu(&self, id: u64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE ra FROM role_auths ra \
             INNER JOIN menu_auths ma ON ra.auth_id = ma.id \
             WHERE ma.menu_id = ?",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE ta FROM tenant_auths ta \
             INNER JOIN menu_auths ma ON ta.auth_id = ma.id \
             WHERE ma.menu_id = ?",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM menu_auths WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM role_menus WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tenant_menus WHERE menu_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM menus WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls back the association deletes
            return Err(AppError::NotFound(format!("Menu {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_auths(&self) -> Result<Vec<MenuAuth>> {
        let auths = sqlx::query_as::<_, MenuAuth>(
            "SELECT id, menu_id, mark, title FROM menu_auths ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(auths)
    }

    async fn find_auth_by_id(&self, id: u64) -> Result<Option<MenuAuth>> {
        let auth = sqlx::query_as::<_, MenuAuth>(
            "SELECT id, menu_id, mark, title FROM menu_auths WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(auth)
    }

    async fn find_auths_by_menu(&self, menu_id: u64) -> Result<Vec<MenuAuth>> {
        let auths = sqlx::query_as::<_, MenuAuth>(
            "SELECT id, menu_id, mark, title FROM menu_auths WHERE menu_id = ? ORDER BY id",
        )
        .bind(menu_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(auths)
    }

    async fn create_auth(&self, input: &CreateMenuAuthInput) -> Result<MenuAuth> {
        let result = sqlx::query("INSERT INTO menu_auths (menu_id, mark, title) VALUES (?, ?, ?)")
            .bind(input.menu_id)
            .bind(&input.mark)
            .bind(&input.title)
            .execute(&self.pool)
            .await?;

        self.find_auth_by_id(result.last_insert_id())
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create menu auth")))
    }

    async fn update_auth(&self, id: u64, input: &UpdateMenuAuthInput) -> Result<MenuAuth> {
        let existing = self
            .find_auth_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Menu auth {} not found", id)))?;

        let mark = input.mark.as_ref().unwrap_or(&existing.mark);
        let title = input.title.as_ref().unwrap_or(&existing.title);

        sqlx::query("UPDATE menu_auths SET mark = ?, title = ? WHERE id = ?")
            .bind(mark)
            .bind(title)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.find_auth_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update menu auth")))
    }

    async fn delete_auth(&self, id: u64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_auths WHERE auth_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM tenant_auths WHERE auth_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM menu_auths WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Menu auth {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
