//! Scope repository: tenant scopes and role grants over the menu catalog
//!
//! Every save replaces the whole set (delete, then bulk insert) inside a
//! single transaction; sets are never patched incrementally.

use crate::domain::GrantedIds;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};

/// Rows per INSERT statement, well below MySQL's placeholder limit
const INSERT_CHUNK_SIZE: usize = 1000;

/// A (owner, item) join table with a unique key on the pair
struct JoinTable {
    name: &'static str,
    owner_column: &'static str,
    item_column: &'static str,
}

const TENANT_MENUS: JoinTable = JoinTable {
    name: "tenant_menus",
    owner_column: "tenant_id",
    item_column: "menu_id",
};

const TENANT_AUTHS: JoinTable = JoinTable {
    name: "tenant_auths",
    owner_column: "tenant_id",
    item_column: "auth_id",
};

const ROLE_MENUS: JoinTable = JoinTable {
    name: "role_menus",
    owner_column: "role_id",
    item_column: "menu_id",
};

const ROLE_AUTHS: JoinTable = JoinTable {
    name: "role_auths",
    owner_column: "role_id",
    item_column: "auth_id",
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScopeRepository: Send + Sync {
    async fn find_tenant_menu_ids(&self, tenant_id: u64) -> Result<Vec<u64>>;
    async fn find_tenant_auth_ids(&self, tenant_id: u64) -> Result<Vec<u64>>;
    async fn find_role_grants(&self, role_id: u64) -> Result<GrantedIds>;

    /// Replace the tenant's menu and button scope, then prune every role of
    /// the tenant down to the new scope. All of it commits or none of it does.
    async fn replace_tenant_scope(&self, tenant_id: u64, scope: &GrantedIds) -> Result<()>;

    /// Replace the role's menu and button grants in one transaction
    async fn replace_role_grants(&self, role_id: u64, grants: &GrantedIds) -> Result<()>;
}

pub struct ScopeRepositoryImpl {
    pool: MySqlPool,
}

impl ScopeRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn find_item_ids(&self, table: &JoinTable, owner_id: u64) -> Result<Vec<u64>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
            table.item_column, table.name, table.owner_column, table.item_column
        );
        let rows: Vec<(u64,)> = sqlx::query_as(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

async fn replace_items(
    conn: &mut MySqlConnection,
    table: &JoinTable,
    owner_id: u64,
    item_ids: &[u64],
) -> Result<()> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = ?",
        table.name, table.owner_column
    ))
    .bind(owner_id)
    .execute(&mut *conn)
    .await?;

    for chunk in item_ids.chunks(INSERT_CHUNK_SIZE) {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}, {}) ",
            table.name, table.owner_column, table.item_column
        ));
        builder.push_values(chunk, |mut row, item_id| {
            row.push_bind(owner_id).push_bind(*item_id);
        });
        builder.build().execute(&mut *conn).await?;
    }

    Ok(())
}

/// Drop role grants of `tenant_id` that fall outside the tenant's saved scope.
///
/// A button grant is also dropped when its owning menu left the menu scope,
/// even if the button itself is still in the button scope.
async fn prune_tenant_role_grants(conn: &mut MySqlConnection, tenant_id: u64) -> Result<()> {
    let menus = sqlx::query(
        "DELETE rm FROM role_menus rm \
         INNER JOIN roles r ON rm.role_id = r.id \
         LEFT JOIN tenant_menus tm ON tm.tenant_id = r.tenant_id AND tm.menu_id = rm.menu_id \
         WHERE r.tenant_id = ? AND tm.menu_id IS NULL",
    )
    .bind(tenant_id)
    .execute(&mut *conn)
    .await?;

    let auths = sqlx::query(
        "DELETE ra FROM role_auths ra \
         INNER JOIN roles r ON ra.role_id = r.id \
         LEFT JOIN tenant_auths ta ON ta.tenant_id = r.tenant_id AND ta.auth_id = ra.auth_id \
         LEFT JOIN menu_auths ma ON ma.id = ra.auth_id \
         LEFT JOIN tenant_menus tm ON tm.tenant_id = r.tenant_id AND tm.menu_id = ma.menu_id \
         WHERE r.tenant_id = ? AND (ta.auth_id IS NULL OR tm.menu_id IS NULL)",
    )
    .bind(tenant_id)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        tenant_id,
        pruned_menus = menus.rows_affected(),
        pruned_auths = auths.rows_affected(),
        "Pruned role grants outside tenant scope"
    );
    Ok(())
}

#[async_trait]
impl ScopeRepository for ScopeRepositoryImpl {
    async fn find_tenant_menu_ids(&self, tenant_id: u64) -> Result<Vec<u64>> {
        self.find_item_ids(&TENANT_MENUS, tenant_id).await
    }

    async fn find_tenant_auth_ids(&self, tenant_id: u64) -> Result<Vec<u64>> {
        self.find_item_ids(&TENANT_AUTHS, tenant_id).await
    }

    async fn find_role_grants(&self, role_id: u64) -> Result<GrantedIds> {
        Ok(GrantedIds {
            menu_ids: self.find_item_ids(&ROLE_MENUS, role_id).await?,
            auth_ids: self.find_item_ids(&ROLE_AUTHS, role_id).await?,
        })
    }

    async fn replace_tenant_scope(&self, tenant_id: u64, scope: &GrantedIds) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        replace_items(&mut *tx, &TENANT_MENUS, tenant_id, &scope.menu_ids).await?;
        replace_items(&mut *tx, &TENANT_AUTHS, tenant_id, &scope.auth_ids).await?;
        prune_tenant_role_grants(&mut *tx, tenant_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn replace_role_grants(&self, role_id: u64, grants: &GrantedIds) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        replace_items(&mut *tx, &ROLE_MENUS, role_id, &grants.menu_ids).await?;
        replace_items(&mut *tx, &ROLE_AUTHS, role_id, &grants.auth_ids).await?;

        tx.commit().await?;
        Ok(())
    }
}
