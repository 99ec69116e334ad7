//! Domain models for Admin9 Core

pub mod identity;
pub mod menu;
pub mod tree;

pub use identity::*;
pub use menu::*;
pub use tree::*;
