//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::MetricsLayer;
use crate::openapi::ApiDoc;
use crate::repository::{IdentityRepositoryImpl, MenuRepositoryImpl, ScopeRepositoryImpl};
use crate::service::{MenuPermissionService, MenuService, ScopeAssignmentService};
use crate::state::HasServices;
use anyhow::Result;
use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

type PermissionService =
    MenuPermissionService<MenuRepositoryImpl, ScopeRepositoryImpl, IdentityRepositoryImpl>;
type AssignmentService =
    ScopeAssignmentService<MenuRepositoryImpl, ScopeRepositoryImpl, IdentityRepositoryImpl>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub menu_service: Arc<MenuService<MenuRepositoryImpl>>,
    pub permission_service: Arc<PermissionService>,
    pub assignment_service: Arc<AssignmentService>,
    pub jwt_manager: JwtManager,
}

impl AppState {
    pub fn new(config: Config, db_pool: MySqlPool) -> Result<Self> {
        let menu_repo = Arc::new(MenuRepositoryImpl::new(db_pool.clone()));
        let scope_repo = Arc::new(ScopeRepositoryImpl::new(db_pool.clone()));
        let identity_repo = Arc::new(IdentityRepositoryImpl::new(db_pool.clone()));

        let jwt_manager = JwtManager::new(config.jwt.clone())?;

        Ok(Self {
            menu_service: Arc::new(MenuService::new(menu_repo.clone())),
            permission_service: Arc::new(MenuPermissionService::new(
                menu_repo.clone(),
                scope_repo.clone(),
                identity_repo.clone(),
            )),
            assignment_service: Arc::new(ScopeAssignmentService::new(
                menu_repo,
                scope_repo,
                identity_repo,
            )),
            config: Arc::new(config),
            db_pool,
            jwt_manager,
        })
    }
}

/// Implement HasServices trait for production AppState
impl HasServices for AppState {
    type MenuRepo = MenuRepositoryImpl;
    type ScopeRepo = ScopeRepositoryImpl;
    type IdentityRepo = IdentityRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn menu_service(&self) -> &MenuService<Self::MenuRepo> {
        &self.menu_service
    }

    fn permission_service(&self) -> &PermissionService {
        &self.permission_service
    }

    fn assignment_service(&self) -> &AssignmentService {
        &self.assignment_service
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok()
    }
}

/// Run the server
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    info!("Connected to database");

    let http_addr = config.http_addr();
    let is_production = config.is_production();
    let request_timeout = Duration::from_secs(config.request_timeout_secs);

    let state = AppState::new(config, db_pool)?;

    let mut app = build_router(state)
        .merge(metrics_router(prometheus_handle))
        .layer(request_timeout_layer(request_timeout));

    if !is_production {
        app = app
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::build()))
            .merge(Redoc::with_url("/redoc", ApiDoc::build()));
        info!("API docs available at /swagger-ui and /redoc");
    }

    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Requests running past `timeout` are answered with 408
fn request_timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// `/metrics` lives outside the bearer-protected API and carries its own state
fn metrics_router(handle: Option<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(handle))
}

/// Build the HTTP router with generic state type
///
/// This function is generic over the state type, allowing it to work with
/// both production `AppState` and test implementations that implement `HasServices`.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        // Menu catalog
        .route(
            "/api/v1/menus",
            get(api::menu::list_menus::<S>).post(api::menu::create_menu::<S>),
        )
        .route("/api/v1/menus/tree", get(api::menu::platform_menu_tree::<S>))
        .route(
            "/api/v1/menus/{id}",
            get(api::menu::get_menu::<S>)
                .put(api::menu::update_menu::<S>)
                .delete(api::menu::delete_menu::<S>),
        )
        .route(
            "/api/v1/menus/{id}/auths",
            get(api::menu::list_menu_auths::<S>),
        )
        .route("/api/v1/menu-auths", post(api::menu::create_menu_auth::<S>))
        .route(
            "/api/v1/menu-auths/{id}",
            put(api::menu::update_menu_auth::<S>).delete(api::menu::delete_menu_auth::<S>),
        )
        // Tenant scopes and role grants
        .route(
            "/api/v1/tenants/{id}/menus",
            get(api::scope::get_tenant_menus::<S>).put(api::scope::update_tenant_menus::<S>),
        )
        .route(
            "/api/v1/roles/{id}/menus",
            get(api::scope::get_role_menus::<S>).put(api::scope::update_role_menus::<S>),
        )
        .route("/api/v1/me/menus", get(api::scope::get_my_menus::<S>))
        // Add middleware
        .layer(MetricsLayer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
