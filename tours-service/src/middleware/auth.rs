use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{services::AccessTokenClaims, AppState};

/// Middleware that requires a verified, unrevoked access token. Claims are
/// stored in request extensions for the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let claims = state.guard.authenticate(bearer).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor handing verified claims to handlers behind `auth_middleware`.
pub struct AuthUser(pub AccessTokenClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<AccessTokenClaims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}

impl AuthUser {
    /// The actor's user id, parsed from the subject claim.
    pub fn user_id(&self) -> Result<uuid::Uuid, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::AuthError(anyhow::anyhow!("Malformed subject claim")))
    }
}
