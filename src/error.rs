// HTTP API error types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::schema::FieldError;
use crate::store::StoreError;

/// HTTP API error with the uniform status mapping shared by every
/// entity type. Conflict maps to 400 rather than 409 to preserve the
/// reference API contract.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    InvalidIdentifier(String),
    ValidationFailed { message: String, details: Vec<String> },
    MissingReference { field: String, collection: String, id: String },
    Conflict { message: String, details: Option<String> },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    StoreUnavailable(String),
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
            ApiError::MissingReference { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::MissingReference { .. } => "MISSING_REFERENCE",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::InvalidIdentifier(msg) => msg.clone(),
            ApiError::ValidationFailed { message, .. } => message.clone(),
            ApiError::MissingReference { field, collection, id } => {
                format!("{field} does not reference an existing document in {collection}: {id}")
            }
            ApiError::Conflict { message, .. } => message.clone(),
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::StoreUnavailable(msg) => msg.clone(),
            ApiError::Internal(msg) => msg.clone(),
        }
    }

    /// Response body: `{ "error": ..., "code": ..., "details": [...] }`
    /// with `details` present only when there is something to list.
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.message(),
            "code": self.error_code(),
        });
        match self {
            ApiError::ValidationFailed { details, .. } if !details.is_empty() => {
                body["details"] = json!(details);
            }
            ApiError::Conflict { details: Some(detail), .. } => {
                body["details"] = json!([detail]);
            }
            _ => {}
        }
        body
    }

    pub fn missing_reference(
        field: impl Into<String>,
        collection: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        ApiError::MissingReference {
            field: field.into(),
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>, details: Option<String>) -> Self {
        ApiError::Conflict { message: message.into(), details }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }
}

impl From<Vec<FieldError>> for ApiError {
    fn from(errors: Vec<FieldError>) -> Self {
        ApiError::ValidationFailed {
            message: "Validation failed".to_string(),
            details: errors.into_iter().map(|e| e.message).collect(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => {
                tracing::error!("store unavailable: {}", msg);
                ApiError::StoreUnavailable("Document store unavailable".to_string())
            }
            StoreError::Timeout(ms) => {
                tracing::error!("store operation timed out after {}ms", ms);
                ApiError::Internal("Request processing timed out".to_string())
            }
            StoreError::Query(msg) => {
                // Full detail stays server-side outside development mode
                tracing::error!("store query error: {}", msg);
                if crate::config::config().environment.is_development() {
                    ApiError::Internal(msg)
                } else {
                    ApiError::Internal(
                        "An error occurred while processing your request".to_string(),
                    )
                }
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_400_for_compatibility() {
        let err = ApiError::conflict("Email already in use", None);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "CONFLICT");
    }

    #[test]
    fn validation_body_carries_every_detail() {
        let err = ApiError::from(vec![
            FieldError::new("email", "email is required"),
            FieldError::new("displayName", "displayName is required"),
        ]);
        let body = err.to_json();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn store_unavailable_is_distinguishable_from_not_found() {
        let unavailable = ApiError::from(StoreError::Unavailable("refused".into()));
        assert_eq!(unavailable.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(unavailable.error_code(), "STORE_UNAVAILABLE");

        let not_found = ApiError::not_found("User not found");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
    }
}
