//! Centralized authorization policy for HTTP handlers.
//!
//! Super admins are the platform operators listed in `PLATFORM_ADMIN_EMAILS`;
//! everybody else acts within the tenant carried by their access token.

use crate::config::Config;
use crate::domain::Viewer;
use crate::error::AppError;
use crate::middleware::auth::AuthUser;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    /// Read the menu catalog and the platform tree
    MenuCatalogRead,
    /// Create, update or delete menus and button permissions
    MenuCatalogWrite,
    TenantScopeRead,
    TenantScopeWrite,
    /// Role trees; the role's tenant is checked once the role is loaded
    RoleMenuRead,
    RoleMenuWrite,
    /// The caller's own menu tree
    SelfMenuRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceScope {
    Global,
    Tenant(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyInput {
    pub action: PolicyAction,
    pub scope: ResourceScope,
}

pub fn is_super_admin(config: &Config, auth: &AuthUser) -> bool {
    config.is_platform_admin_email(&auth.email)
}

/// Tenant of the caller's token
pub fn tenant_id(auth: &AuthUser) -> PolicyResult<u64> {
    auth.tenant_id
        .ok_or_else(|| AppError::Forbidden("No tenant context in token".to_string()))
}

pub fn viewer(config: &Config, auth: &AuthUser) -> Viewer {
    Viewer {
        tenant_id: auth.tenant_id,
        is_super_admin: is_super_admin(config, auth),
    }
}

pub fn enforce(config: &Config, auth: &AuthUser, input: &PolicyInput) -> PolicyResult<()> {
    // A user's own tree needs a tenant even for platform operators
    if input.action != PolicyAction::SelfMenuRead && is_super_admin(config, auth) {
        return Ok(());
    }

    match input.action {
        PolicyAction::MenuCatalogRead
        | PolicyAction::MenuCatalogWrite
        | PolicyAction::TenantScopeWrite => {
            Err(AppError::Forbidden("Platform admin required".to_string()))
        }
        PolicyAction::TenantScopeRead => {
            let tenant = require_tenant_scope(&input.scope)?;
            require_tenant_match(auth, tenant)
        }
        PolicyAction::RoleMenuRead | PolicyAction::RoleMenuWrite | PolicyAction::SelfMenuRead => {
            tenant_id(auth).map(|_| ())
        }
    }
}

fn require_tenant_scope(scope: &ResourceScope) -> PolicyResult<u64> {
    match scope {
        ResourceScope::Tenant(id) => Ok(*id),
        ResourceScope::Global => Err(AppError::Forbidden(
            "Tenant scope required for this operation".to_string(),
        )),
    }
}

fn require_tenant_match(auth: &AuthUser, tenant: u64) -> PolicyResult<()> {
    if tenant_id(auth)? == tenant {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Cannot access another tenant".to_string(),
        ))
    }
}
