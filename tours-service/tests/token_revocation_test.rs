//! Revocation semantics of the token service + blacklist pair.

mod common;

use std::sync::Arc;

use tours_service::services::{MockBlacklist, TokenBlacklist};

use common::test_state_with_blacklist;

const USER_ID: &str = "11111111-2222-3333-4444-555555555555";

#[tokio::test]
async fn token_verifies_until_revoked_then_never_again() {
    let blacklist = Arc::new(MockBlacklist::new());
    let state = test_state_with_blacklist(blacklist.clone());

    let token = state
        .jwt
        .generate_access_token(USER_ID, "ops@example.com", "admin")
        .unwrap();
    let jti = state.jwt.validate_access_token(&token).unwrap().jti;

    assert!(state.guard.authenticate(Some(&token)).await.is_ok());

    blacklist.blacklist_token(&jti, 900).await.unwrap();

    // Every subsequent verification fails, well before natural expiry.
    for _ in 0..3 {
        assert!(state.guard.authenticate(Some(&token)).await.is_err());
    }
}

#[tokio::test]
async fn revoke_is_idempotent() {
    let blacklist = MockBlacklist::new();

    blacklist.blacklist_token("token-1", 900).await.unwrap();
    blacklist.blacklist_token("token-1", 900).await.unwrap();

    assert!(blacklist.is_blacklisted("token-1").await.unwrap());
    assert!(!blacklist.is_blacklisted("token-2").await.unwrap());
}

#[tokio::test]
async fn revoking_one_token_leaves_others_valid() {
    let blacklist = Arc::new(MockBlacklist::new());
    let state = test_state_with_blacklist(blacklist.clone());

    let first = state
        .jwt
        .generate_access_token(USER_ID, "ops@example.com", "admin")
        .unwrap();
    let second = state
        .jwt
        .generate_access_token(USER_ID, "ops@example.com", "admin")
        .unwrap();

    let first_jti = state.jwt.validate_access_token(&first).unwrap().jti;
    blacklist.blacklist_token(&first_jti, 900).await.unwrap();

    assert!(state.guard.authenticate(Some(&first)).await.is_err());
    assert!(state.guard.authenticate(Some(&second)).await.is_ok());
}

#[tokio::test]
async fn introspect_reports_revocation() {
    let blacklist = Arc::new(MockBlacklist::new());
    let state = test_state_with_blacklist(blacklist.clone());

    let token = state
        .jwt
        .generate_access_token(USER_ID, "ops@example.com", "editor")
        .unwrap();

    let before = state.auth.introspect(token.clone()).await;
    assert!(before.active);
    assert_eq!(before.role.as_deref(), Some("editor"));

    let jti = state.jwt.validate_access_token(&token).unwrap().jti;
    blacklist.blacklist_token(&jti, 900).await.unwrap();

    let after = state.auth.introspect(token).await;
    assert!(!after.active);
    assert!(after.sub.is_none());
}
