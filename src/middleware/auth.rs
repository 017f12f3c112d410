use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

/// Authenticated principal extracted from a session token. The token is
/// minted by the identity provider; this service only verifies it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

/// Session gate for write endpoints. Reads pass through untouched; when
/// the injected security config requires auth, POST/PUT/DELETE must
/// carry a valid bearer session token.
pub async fn session_gate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let security = &state.security;
    if !security.require_auth || !is_write(request.method()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Authentication required. Please log in."))?;
    let claims = validate_session_token(&token, &security.session_secret)
        .map_err(ApiError::unauthorized)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn is_write(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE | Method::PATCH)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionClaims, String> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid session token: {e}"))
}
