//! Tenant, role and user records as seen by the permission engine
//!
//! These entities are owned by the identity CRUD endpoints; only the columns
//! needed to resolve whose scope applies are modelled here.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tenant {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Role {
    pub id: u64,
    pub tenant_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: u64,
    pub tenant_id: u64,
    /// Every user holds exactly one role
    pub role_id: u64,
    pub username: String,
}

/// Who is asking: the two caller facts the engine needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewer {
    pub tenant_id: Option<u64>,
    pub is_super_admin: bool,
}

impl Viewer {
    pub fn super_admin() -> Self {
        Self {
            tenant_id: None,
            is_super_admin: true,
        }
    }

    pub fn tenant_member(tenant_id: u64) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            is_super_admin: false,
        }
    }

    /// Super admins manage every tenant; everyone else only their own
    pub fn can_manage_tenant(&self, tenant_id: u64) -> bool {
        self.is_super_admin || self.tenant_id == Some(tenant_id)
    }
}

/// Menu and button ids held by a tenant scope or a role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantedIds {
    pub menu_ids: Vec<u64>,
    pub auth_ids: Vec<u64>,
}
