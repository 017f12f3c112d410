#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use pantry_api::config::SecurityConfig;
use pantry_api::store::memory::MemoryStore;
use pantry_api::store::DocumentStore;
use pantry_api::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-session-secret";

fn security(require_auth: bool) -> SecurityConfig {
    SecurityConfig {
        require_auth,
        session_secret: TEST_SECRET.to_string(),
    }
}

/// Router over an arbitrary store backend, write gate off.
pub fn app_over(store: Arc<dyn DocumentStore>) -> Router {
    app(AppState { store, security: security(false) })
}

/// Router backed by a fresh in-memory store. The store handle is
/// returned alongside so tests can inspect operation counters.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (app_over(store.clone()), store)
}

/// Same, but with the bearer-token gate enabled on write methods.
pub fn gated_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone() as Arc<dyn DocumentStore>,
        security: security(true),
    };
    (app(state), store)
}

pub async fn request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    request_with_token(app, method, path, body, None).await
}

pub async fn request_with_token(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// POST a payload and return the created identifier, asserting 201.
pub async fn create(app: &Router, path: &str, payload: Value) -> String {
    let (status, body) = request(app, "POST", path, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create at {path} failed: {body}");
    body["id"].as_str().expect("create response carries an id").to_string()
}

pub fn valid_user(email: &str) -> Value {
    json!({
        "email": email,
        "displayName": "Ada Lovelace",
        "dietaryPreferences": ["vegetarian"]
    })
}

pub fn valid_recipe(author_id: &str) -> Value {
    json!({
        "title": "Minestrone",
        "description": "A hearty vegetable soup.",
        "ingredients": ["beans", "tomatoes", "pasta"],
        "instructions": ["Chop everything.", "Simmer for an hour."],
        "prepTime": 20,
        "cookTime": 60,
        "servingSize": 4,
        "difficulty": "Easy",
        "cuisine": "Italian",
        "tags": ["soup"],
        "authorId": author_id
    })
}

pub fn valid_meal_plan(user_id: &str, recipe_id: &str) -> Value {
    json!({
        "userId": user_id,
        "name": "Week of soups",
        "startDate": "2026-03-02",
        "endDate": "2026-03-08",
        "meals": [
            { "day": "Monday", "mealType": "Dinner", "recipeId": recipe_id }
        ],
        "notes": "Batch cook on Sunday"
    })
}

pub fn valid_grocery_list(user_id: &str) -> Value {
    json!({
        "userId": user_id,
        "name": "Weekly shop",
        "items": [
            { "name": "Beans", "quantity": "2 cans", "category": "Pantry" },
            { "name": "Tomatoes", "quantity": "1 kg", "category": "Produce", "checked": false }
        ]
    })
}

pub fn valid_author() -> Value {
    json!({
        "firstName": "Ursula",
        "lastName": "Le Guin",
        "email": "ursula@example.com",
        "country": "United States",
        "birthDate": "1929-10-21"
    })
}

pub fn valid_book(author_id: &str) -> Value {
    json!({
        "title": "The Dispossessed",
        "isbn": "9780061054884",
        "authorId": author_id,
        "publishedYear": 1974,
        "genres": ["Sci-Fi"],
        "pages": 387,
        "language": "English",
        "inPrint": true
    })
}

pub fn valid_contact() -> Value {
    json!({
        "firstName": "Grace",
        "lastName": "Hopper",
        "email": "grace@example.com",
        "favoriteColor": "Navy",
        "birthday": "1906-12-09"
    })
}
