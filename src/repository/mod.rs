//! Data access layer (Repository pattern)

pub mod identity;
pub mod menu;
pub mod scope;

pub use identity::{IdentityRepository, IdentityRepositoryImpl};
pub use menu::{MenuRepository, MenuRepositoryImpl};
pub use scope::{ScopeRepository, ScopeRepositoryImpl};
