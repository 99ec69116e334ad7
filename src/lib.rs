//! Admin9 Core - menu permission engine for a multi-tenant admin backend
//!
//! Platform operators maintain a catalog of menus and button permissions,
//! grant each tenant a scope of that catalog, and tenant administrators
//! grant their roles a subset of the scope. This crate resolves those
//! layers into menu trees and validates submitted trees on the way back.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
