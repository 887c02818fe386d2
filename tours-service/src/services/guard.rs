//! Access guard - authentication + capability authorization in one step.
//!
//! A request either fully passes or is rejected before business logic runs:
//! missing/expired/malformed/revoked tokens are 401, a valid principal whose
//! role lacks the capability is 403. Revocation is re-checked against the
//! shared blacklist on every call and fails closed when the blacklist is
//! unreachable.

use std::sync::Arc;

use service_core::error::AppError;

use crate::models::{Capability, Role};
use crate::services::permissions::role_has;
use crate::services::{AccessTokenClaims, JwtService, TokenBlacklist};

#[derive(Clone)]
pub struct AccessGuard {
    jwt: JwtService,
    blacklist: Arc<dyn TokenBlacklist>,
}

impl AccessGuard {
    pub fn new(jwt: JwtService, blacklist: Arc<dyn TokenBlacklist>) -> Self {
        Self { jwt, blacklist }
    }

    /// Verify a bearer token (signature, expiry, revocation) without any
    /// capability check. Used by the auth middleware.
    pub async fn authenticate(
        &self,
        bearer: Option<&str>,
    ) -> Result<AccessTokenClaims, AppError> {
        let token = bearer.ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
        })?;

        let claims = self
            .jwt
            .validate_access_token(token)
            .map_err(|_| AppError::AuthError(anyhow::anyhow!("Invalid or expired token")))?;

        let is_blacklisted = self.blacklist.is_blacklisted(&claims.jti).await.map_err(|e| {
            tracing::error!(error = %e, "Blacklist check failed");
            // Fail closed: an unreachable revocation set must not let
            // possibly-revoked tokens through.
            AppError::InternalError(anyhow::anyhow!("Failed to check token revocation"))
        })?;

        if is_blacklisted {
            return Err(AppError::AuthError(anyhow::anyhow!(
                "Token has been revoked"
            )));
        }

        Ok(claims)
    }

    /// Full authorization: authenticate, then check the capability.
    pub async fn authorize(
        &self,
        bearer: Option<&str>,
        capability: Capability,
    ) -> Result<AccessTokenClaims, AppError> {
        let claims = self.authenticate(bearer).await?;
        self.require(&claims, capability)?;
        Ok(claims)
    }

    /// Capability check against already-verified claims. Unknown role codes
    /// hold no capabilities.
    pub fn require(
        &self,
        claims: &AccessTokenClaims,
        capability: Capability,
    ) -> Result<(), AppError> {
        let allowed = Role::parse(&claims.role)
            .map(|role| role_has(role, capability))
            .unwrap_or(false);

        if !allowed {
            tracing::warn!(
                user_id = %claims.sub,
                role = %claims.role,
                capability = %capability,
                "Capability denied"
            );
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Insufficient permissions: {} required",
                capability
            )));
        }

        Ok(())
    }
}
