//! Auth middleware behavior over a real router, no live infrastructure.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tours_service::middleware::auth_middleware;
use tours_service::services::{MockBlacklist, TokenBlacklist};
use tower::util::ServiceExt;

use common::test_state_with_blacklist;

fn protected_app(state: tours_service::AppState) -> Router {
    Router::new()
        .route("/protected", get(|| async { "protected" }))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

#[tokio::test]
async fn missing_authorization_header_is_rejected() {
    let app = protected_app(test_state_with_blacklist(Arc::new(MockBlacklist::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let app = protected_app(test_state_with_blacklist(Arc::new(MockBlacklist::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_passes() {
    let state = test_state_with_blacklist(Arc::new(MockBlacklist::new()));
    let token = state
        .jwt
        .generate_access_token("11111111-2222-3333-4444-555555555555", "ops@example.com", "admin")
        .unwrap();
    let app = protected_app(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn revoked_token_is_rejected_even_before_expiry() {
    let blacklist = Arc::new(MockBlacklist::new());
    let state = test_state_with_blacklist(blacklist.clone());

    let token = state
        .jwt
        .generate_access_token("11111111-2222-3333-4444-555555555555", "ops@example.com", "admin")
        .unwrap();
    let claims = state.jwt.validate_access_token(&token).unwrap();

    // Works before revocation...
    let app = protected_app(state.clone());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // ...and is dead immediately after.
    blacklist.blacklist_token(&claims.jti, 900).await.unwrap();

    let app = protected_app(state);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
