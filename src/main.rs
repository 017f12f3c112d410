use std::sync::Arc;

use pantry_api::{app, config, store::mongo::MongoStore, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up MONGODB_URI, DB_NAME, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::config();
    tracing::info!("Starting Pantry API in {:?} mode", config.environment);

    // A store that cannot be reached at startup is fatal: the service
    // must not accept traffic without it.
    let store = match MongoStore::connect(
        &config.store.uri,
        &config.store.db_name,
        config.store.op_timeout_ms,
    )
    .await
    {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("store connection failed: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        store: Arc::new(store),
        security: config.security.clone(),
    };
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Pantry API listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
