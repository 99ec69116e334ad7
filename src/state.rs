//! Application state traits for dependency injection
//!
//! Handlers are generic over `HasServices`, so the same router runs on the
//! MySQL-backed `AppState` in production and on in-memory repositories in
//! the integration tests.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{IdentityRepository, MenuRepository, ScopeRepository};
use crate::service::{MenuPermissionService, MenuService, ScopeAssignmentService};

/// Trait for application state that provides access to all services.
pub trait HasServices: Clone + Send + Sync + 'static {
    /// The menu catalog repository type
    type MenuRepo: MenuRepository;
    /// The tenant scope / role grant repository type
    type ScopeRepo: ScopeRepository;
    /// The tenant, role and user lookup repository type
    type IdentityRepo: IdentityRepository;

    /// Get the application configuration
    fn config(&self) -> &Config;

    /// Get the menu catalog service
    fn menu_service(&self) -> &MenuService<Self::MenuRepo>;

    /// Get the menu tree resolution service
    fn permission_service(
        &self,
    ) -> &MenuPermissionService<Self::MenuRepo, Self::ScopeRepo, Self::IdentityRepo>;

    /// Get the scope assignment service
    fn assignment_service(
        &self,
    ) -> &ScopeAssignmentService<Self::MenuRepo, Self::ScopeRepo, Self::IdentityRepo>;

    /// Get the JWT manager
    fn jwt_manager(&self) -> &JwtManager;

    /// Check if the backing store is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
