//! Read-only lookups of tenants, roles and users

use crate::domain::{Role, Tenant, User};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_tenant_by_id(&self, id: u64) -> Result<Option<Tenant>>;
    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>>;
    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>>;
}

pub struct IdentityRepositoryImpl {
    pool: MySqlPool,
}

impl IdentityRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for IdentityRepositoryImpl {
    async fn find_tenant_by_id(&self, id: u64) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT id, name FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, tenant_id, name FROM roles WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }

    async fn find_user_by_id(&self, id: u64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, tenant_id, role_id, username FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
