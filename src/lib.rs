pub mod config;
pub mod error;
pub mod handlers;
pub mod integrity;
pub mod middleware;
pub mod schema;
pub mod store;

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use config::SecurityConfig;
use store::DocumentStore;

/// Shared application state. The store handle and security settings are
/// injected here rather than living in a process-wide global, so "store
/// not ready" is a construction-time concern and tests can swap in their
/// own backend or toggle the write gate.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub security: SecurityConfig,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/:entity", get(handlers::list).post(handlers::create))
        .route(
            "/:entity/:id",
            get(handlers::get_by_id)
                .put(handlers::replace)
                .delete(handlers::remove),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_gate,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<Value> {
    let endpoints: Vec<String> = schema::entities::ENTITIES
        .iter()
        .map(|e| format!("/{}", e.path))
        .collect();

    Json(json!({
        "name": "Pantry API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "store": "ok" })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "timestamp": now, "store_error": e.to_string() })),
        ),
    }
}
