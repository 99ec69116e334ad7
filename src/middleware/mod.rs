//! HTTP middleware for Admin9 Core
//!
//! - JWT `AuthUser` extractor
//! - Request metrics layer

pub mod auth;
pub mod metrics;

pub use auth::AuthUser;
pub use metrics::MetricsLayer;
