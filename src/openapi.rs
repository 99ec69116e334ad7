//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates the handler path annotations and domain schemas into a single
//! document. Swagger UI and ReDoc are served outside production.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Admin9 Core API",
        version = "0.3.0",
        description = "Menu catalog and tenant/role permission scoping for the Admin9 console",
        license(name = "Proprietary"),
        contact(name = "Admin9 Team")
    ),
    tags(
        (name = "System", description = "Health checks and readiness"),
        (name = "Menu Catalog", description = "Platform menus and button permissions"),
        (name = "Menu Scopes", description = "Tenant scopes, role grants and the caller's own menu tree"),
    ),
    security(
        ("bearer_jwt" = [])
    ),
    components(
        schemas(
            // ── Shared response types ──────────────────────────────────
            crate::api::MessageResponse,
            crate::api::health::HealthResponse,

            // ── Menu catalog ───────────────────────────────────────────
            crate::domain::Menu,
            crate::domain::MenuStatus,
            crate::domain::MenuAuth,
            crate::domain::CreateMenuInput,
            crate::domain::UpdateMenuInput,
            crate::domain::CreateMenuAuthInput,
            crate::domain::UpdateMenuAuthInput,

            // ── Menu trees ─────────────────────────────────────────────
            crate::domain::MenuTreeNode,
            crate::domain::MenuMeta,
            crate::domain::AuthTreeNode,
        )
    ),
    paths(
        // ── System ─────────────────────────────────────────────────
        crate::api::health::health,
        crate::api::health::ready,

        // ── Menu Catalog ───────────────────────────────────────────
        crate::api::menu::list_menus,
        crate::api::menu::platform_menu_tree,
        crate::api::menu::get_menu,
        crate::api::menu::create_menu,
        crate::api::menu::update_menu,
        crate::api::menu::delete_menu,
        crate::api::menu::list_menu_auths,
        crate::api::menu::create_menu_auth,
        crate::api::menu::update_menu_auth,
        crate::api::menu::delete_menu_auth,

        // ── Menu Scopes ────────────────────────────────────────────
        crate::api::scope::get_tenant_menus,
        crate::api::scope::update_tenant_menus,
        crate::api::scope::get_role_menus,
        crate::api::scope::update_role_menus,
        crate::api::scope::get_my_menus,
    ),
)]
pub struct ApiDoc;

/// Security scheme definition added via modify
impl ApiDoc {
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(c) = doc.components.as_mut() {
            c.security_schemes.insert(
                "bearer_jwt".to_string(),
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
        doc
    }
}
