use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{config, SecurityConfig};
use crate::services::ProjectService;

/// Shared state handed to every handler.
///
/// Holds the single [`ProjectService`] instance; everything mutable lives
/// behind it, so cloning the state is cheap and the router stays `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProjectService>,
}

impl AppState {
    pub fn new(service: Arc<ProjectService>) -> Self {
        Self { service }
    }
}

/// Builds the full application router over the given state.
pub fn app(state: AppState) -> Router {
    let config = config();

    let mut router = Router::new()
        // Service endpoints
        .route("/", get(root))
        .route("/health", get(health))
        // Project API
        .merge(project_routes())
        .merge(item_routes())
        .merge(action_routes())
        .merge(checklist_routes())
        .merge(permission_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

fn project_routes() -> Router<AppState> {
    use crate::handlers::projects;

    Router::new()
        // Collection operations
        .route(
            "/gerenciamento",
            get(projects::list_projects).post(projects::create_project),
        )
        // Individual project operations
        .route(
            "/gerenciamento/:id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
}

fn item_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use crate::handlers::items;

    Router::new()
        .route("/gerenciamento/:id/itens", post(items::create_item))
        .route(
            "/gerenciamento/:id/itens/:item_id",
            put(items::update_item).delete(items::delete_item),
        )
}

fn action_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use crate::handlers::actions;

    Router::new()
        .route("/gerenciamento/:id/acoes", post(actions::create_action))
        .route(
            "/gerenciamento/:id/acoes/:acao_id",
            put(actions::update_action).delete(actions::delete_action),
        )
}

fn checklist_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use crate::handlers::checklists;

    Router::new()
        // POST toggles a cell by coordinates, PUT sets a cell by id
        .route(
            "/gerenciamento/:id/checklists",
            post(checklists::toggle_checklist),
        )
        .route(
            "/gerenciamento/:id/checklists/:checklist_id",
            put(checklists::update_checklist),
        )
}

fn permission_routes() -> Router<AppState> {
    use axum::routing::{delete, post};
    use crate::handlers::permissions;

    Router::new()
        .route(
            "/gerenciamento/:id/permissoes",
            post(permissions::grant_permission),
        )
        .route(
            "/gerenciamento/:id/permissoes/:usuario_id",
            delete(permissions::revoke_permission),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Gerenciamento API",
        "version": version,
        "description": "Project checklist tracking over an itens x acoes matrix with derived progress",
        "endpoints": {
            "projects": "/gerenciamento [GET, POST], /gerenciamento/:id [GET, PUT, DELETE]",
            "items": "/gerenciamento/:id/itens [POST], /gerenciamento/:id/itens/:item_id [PUT, DELETE]",
            "actions": "/gerenciamento/:id/acoes [POST], /gerenciamento/:id/acoes/:acao_id [PUT, DELETE]",
            "checklists": "/gerenciamento/:id/checklists [POST], /gerenciamento/:id/checklists/:checklist_id [PUT]",
            "permissions": "/gerenciamento/:id/permissoes [POST], /gerenciamento/:id/permissoes/:usuario_id [DELETE]",
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}
