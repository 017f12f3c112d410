mod common;

use anyhow::Result;
use axum::http::StatusCode;
use jsonwebtoken::{encode, EncodingKey, Header};
use pantry_api::middleware::auth::SessionClaims;
use serde_json::json;

fn mint(secret: &str) -> String {
    let claims = SessionClaims {
        sub: "65f1a2b3c4d5e6f708192a3b".to_string(),
        email: "ada@example.com".to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn reads_pass_the_gate_without_a_token() -> Result<()> {
    let (app, _) = common::gated_app();

    let (status, body) = common::request(&app, "GET", "/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = common::request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn writes_without_a_token_are_401_and_never_reach_the_store() -> Result<()> {
    let (app, store) = common::gated_app();

    let (status, body) = common::request(
        &app,
        "POST",
        "/users",
        Some(common::valid_user("ada@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["error"], "Authentication required. Please log in.");

    let (status, _) = common::request(
        &app,
        "DELETE",
        "/users/65f1a2b3c4d5e6f708192a3b",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(store.ops(), 0, "rejected writes must not touch the store");
    Ok(())
}

#[tokio::test]
async fn writes_with_a_bad_token_are_401() -> Result<()> {
    let (app, _) = common::gated_app();

    let (status, body) = common::request_with_token(
        &app,
        "POST",
        "/users",
        Some(common::valid_user("ada@example.com")),
        Some("not-a-jwt"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    // signed with the wrong secret
    let (status, _) = common::request_with_token(
        &app,
        "POST",
        "/users",
        Some(common::valid_user("ada@example.com")),
        Some(&mint("some-other-secret")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn writes_with_a_valid_token_go_through() -> Result<()> {
    let (app, _) = common::gated_app();
    let token = mint(common::TEST_SECRET);

    let (status, body) = common::request_with_token(
        &app,
        "POST",
        "/users",
        Some(common::valid_user("ada@example.com")),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = common::request_with_token(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(common::valid_user("ada@example.com")),
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::request_with_token(
        &app,
        "DELETE",
        &format!("/users/{id}"),
        None,
        Some(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
