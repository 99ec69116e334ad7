//! Business logic layer

pub mod assignment;
pub mod menu;
pub mod permission;
pub mod tree;

pub use assignment::ScopeAssignmentService;
pub use menu::MenuService;
pub use permission::MenuPermissionService;
