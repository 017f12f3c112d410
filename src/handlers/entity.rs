//! Generic entity handlers. One implementation serves every registered
//! entity type; the path segment selects the registry entry carrying
//! the collection name, schema, foreign keys and guards.
//!
//! Pipeline per request: identifier parse (path params) -> schema
//! validation (body) -> uniqueness and reference checks -> repository
//! call -> status mapping.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::integrity::check_references;
use crate::schema::entities::{self, EntityConfig};
use crate::store::{EntityId, JsonDocument, Repository};
use crate::AppState;

fn resolve(entity: &str) -> Result<&'static EntityConfig, ApiError> {
    entities::lookup(entity)
        .ok_or_else(|| ApiError::not_found(format!("Unknown resource: {entity}")))
}

fn parse_id(cfg: &EntityConfig, raw: &str) -> Result<EntityId, ApiError> {
    EntityId::parse(raw)
        .map_err(|_| ApiError::InvalidIdentifier(format!("Invalid {} ID format", cfg.label)))
}

fn repository(state: &AppState, collection: &'static str) -> Repository {
    Repository::new(state.store.clone(), collection)
}

fn title(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn not_found(cfg: &EntityConfig) -> ApiError {
    ApiError::not_found(format!("{} not found", title(cfg.label)))
}

/// Uniqueness pre-write lookup for fields like `users.email`. A
/// check-then-act race remains between this lookup and the write; the
/// store-level unique index is the final arbiter where available.
async fn enforce_unique(
    state: &AppState,
    cfg: &EntityConfig,
    value: &JsonDocument,
    exclude: Option<EntityId>,
) -> Result<(), ApiError> {
    let repo = repository(state, cfg.collection);
    for field in cfg.unique_fields {
        if let Some(v) = value.get(*field) {
            if repo.find_by_unique_field(field, v, exclude).await?.is_some() {
                return Err(ApiError::conflict(format!("{} already in use", title(field)), None));
            }
        }
    }
    Ok(())
}

/// GET /{entity}
pub async fn list(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let cfg = resolve(&entity)?;
    let docs = repository(&state, cfg.collection).list().await?;
    Ok(Json(Value::Array(docs.into_iter().map(Value::Object).collect())))
}

/// GET /{entity}/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cfg = resolve(&entity)?;
    let id = parse_id(cfg, &id)?;
    match repository(&state, cfg.collection).get_by_id(id).await? {
        Some(doc) => Ok(Json(Value::Object(doc))),
        None => Err(not_found(cfg)),
    }
}

/// POST /{entity}
pub async fn create(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let cfg = resolve(&entity)?;
    let value = cfg.schema.validate(&payload).map_err(ApiError::from)?;
    enforce_unique(&state, cfg, &value, None).await?;
    check_references(&state.store, &value, &cfg.foreign_keys).await?;

    let id = repository(&state, cfg.collection).insert(value).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id.to_hex() }))))
}

/// PUT /{entity}/{id} - full-document replace with a validated payload
pub async fn replace(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let cfg = resolve(&entity)?;
    let id = parse_id(cfg, &id)?;
    let value = cfg.schema.validate(&payload).map_err(ApiError::from)?;
    enforce_unique(&state, cfg, &value, Some(id)).await?;
    check_references(&state.store, &value, &cfg.foreign_keys).await?;

    let matched = repository(&state, cfg.collection).replace(id, value).await?;
    if matched {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(cfg))
    }
}

/// DELETE /{entity}/{id}
pub async fn remove(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let cfg = resolve(&entity)?;
    let id = parse_id(cfg, &id)?;

    for guard in &cfg.delete_guards {
        let dependents = repository(&state, guard.collection)
            .count_referencing(guard.field, id)
            .await?;
        if dependents > 0 {
            return Err(ApiError::conflict(
                format!("Cannot delete {} with existing {}s", cfg.label, guard.label),
                Some(format!(
                    "{} has {} {}(s). Delete {}s first.",
                    title(cfg.label),
                    dependents,
                    guard.label,
                    guard.label
                )),
            ));
        }
    }

    let deleted = repository(&state, cfg.collection).delete(id).await?;
    if deleted {
        Ok(Json(json!({ "message": format!("{} deleted successfully", title(cfg.label)) })))
    } else {
        Err(not_found(cfg))
    }
}
