//! Access guard: authentication composed with the permission matrix.

mod common;

use std::sync::Arc;

use service_core::error::AppError;
use tours_service::models::{Action, Capability, Module};
use tours_service::services::{MockBlacklist, TokenBlacklist};

use common::test_state_with_blacklist;

const USER_ID: &str = "11111111-2222-3333-4444-555555555555";

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let state = test_state_with_blacklist(Arc::new(MockBlacklist::new()));

    let result = state
        .guard
        .authorize(None, Capability::new(Module::Clients, Action::View))
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn garbage_token_is_unauthenticated() {
    let state = test_state_with_blacklist(Arc::new(MockBlacklist::new()));

    let result = state
        .guard
        .authorize(
            Some("definitely.not.ajwt"),
            Capability::new(Module::Clients, Action::View),
        )
        .await;

    assert!(matches!(result, Err(AppError::AuthError(_))));
}

#[tokio::test]
async fn viewer_reads_pass_and_writes_fail() {
    let state = test_state_with_blacklist(Arc::new(MockBlacklist::new()));
    let token = state
        .jwt
        .generate_access_token(USER_ID, "viewer@example.com", "viewer")
        .unwrap();

    // A read capability the viewer owns succeeds
    let claims = state
        .guard
        .authorize(
            Some(&token),
            Capability::new(Module::Clients, Action::View),
        )
        .await
        .expect("viewer should read clients");
    assert_eq!(claims.role, "viewer");

    // The same principal is forbidden from a write capability
    let result = state
        .guard
        .authorize(
            Some(&token),
            Capability::new(Module::Clients, Action::Edit),
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn unknown_role_claim_is_denied_by_default() {
    let state = test_state_with_blacklist(Arc::new(MockBlacklist::new()));
    let token = state
        .jwt
        .generate_access_token(USER_ID, "ops@example.com", "warlord")
        .unwrap();

    let result = state
        .guard
        .authorize(
            Some(&token),
            Capability::new(Module::Clients, Action::View),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn revoked_token_is_unauthenticated_not_forbidden() {
    let blacklist = Arc::new(MockBlacklist::new());
    let state = test_state_with_blacklist(blacklist.clone());

    let token = state
        .jwt
        .generate_access_token(USER_ID, "admin@example.com", "super_admin")
        .unwrap();
    let claims = state.jwt.validate_access_token(&token).unwrap();
    blacklist.blacklist_token(&claims.jti, 900).await.unwrap();

    let result = state
        .guard
        .authorize(
            Some(&token),
            Capability::new(Module::Clients, Action::View),
        )
        .await;

    assert!(matches!(result, Err(AppError::AuthError(_))));
}

#[tokio::test]
async fn super_admin_passes_every_capability() {
    let state = test_state_with_blacklist(Arc::new(MockBlacklist::new()));
    let token = state
        .jwt
        .generate_access_token(USER_ID, "root@example.com", "super_admin")
        .unwrap();

    for capability in tours_service::services::permissions::ALL_CAPABILITIES {
        state
            .guard
            .authorize(Some(&token), *capability)
            .await
            .unwrap_or_else(|e| panic!("super_admin denied {}: {}", capability, e));
    }
}
