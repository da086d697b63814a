use axum::{
    extract::{DefaultBodyLimit, FromRef, State},
    http::{HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::IdentityProvider;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::resource::ResourceRegistry;

/// Composition root shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ResourceRegistry>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(registry: Arc<ResourceRegistry>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { registry, identity }
    }
}

impl FromRef<AppState> for Arc<ResourceRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.registry.clone()
    }
}

impl FromRef<AppState> for Arc<dyn IdentityProvider> {
    fn from_ref(state: &AppState) -> Self {
        state.identity.clone()
    }
}

/// Routes only, without transport layers
pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root).fallback(method_not_allowed))
        .route("/health", get(health).fallback(method_not_allowed))
        .merge(public_data_routes())
        .merge(protected_data_routes())
        .fallback(route_not_found)
        .with_state(state)
}

/// Full application: routes plus CORS, tracing and body limit from config
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut app = router(state).layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

fn public_data_routes() -> Router<AppState> {
    use handlers::public::data;

    Router::new()
        .route(
            "/api/v1/:resource",
            get(data::list).post(data::create).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/:resource/:id",
            get(data::get)
                .put(data::update)
                .delete(data::delete)
                .fallback(method_not_allowed),
        )
}

fn protected_data_routes() -> Router<AppState> {
    use handlers::protected::data;

    Router::new()
        .route(
            "/api/v2/:resource",
            get(data::list).post(data::create).fallback(method_not_allowed),
        )
        .route(
            "/api/v2/:resource/:id",
            get(data::get)
                .put(data::update)
                .delete(data::delete)
                .fallback(method_not_allowed),
        )
}

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::method_not_allowed(format!("Method {} not allowed on {}", method, uri.path()))
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Resource Proxy",
        "version": version,
        "resources": state.registry.resource_types(),
        "loaded": state.registry.loaded().await,
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "v1": "/api/v1/:resource[/:id] (public)",
            "v2": "/api/v2/:resource[/:id] (bearer token, permission checked on create/update/delete)",
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let store = state.registry.store();

    match store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "store": store.backend(),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "store": store.backend(),
                    "error": "database unavailable",
                })),
            )
        }
    }
}
