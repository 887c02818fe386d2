use std::sync::Arc;

use service_core::error::AppError;

use crate::models::{
    AdminUser, AuditLog, AuthResponse, IntrospectResponse, LoginRequest, RefreshSession,
};
use crate::services::{Database, JwtService, ServiceError, TokenBlacklist, TokenResponse};
use crate::utils::{verify_password, Password, PasswordHashString};

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtService,
    blacklist: Arc<dyn TokenBlacklist>,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtService, blacklist: Arc<dyn TokenBlacklist>) -> Self {
        Self { db, jwt, blacklist }
    }

    /// Login with email and password. A successful login persists the
    /// refresh session and its audit entry atomically.
    pub async fn login(
        &self,
        req: LoginRequest,
        ip_address: Option<String>,
    ) -> Result<AuthResponse, AppError> {
        let user = self
            .db
            .find_user_by_email(&req.email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        verify_password(
            &Password::new(req.password),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        if !user.is_active {
            return Err(ServiceError::AccountDisabled.into());
        }

        let (access_token, refresh_token, refresh_token_id) = self
            .jwt
            .generate_token_pair(&user.user_id.to_string(), &user.email, &user.role_code)
            .map_err(ServiceError::Internal)?;

        let session = RefreshSession::new(
            refresh_token_id,
            user.user_id,
            self.jwt_refresh_expiry_days(),
        );
        let audit = AuditLog::new(Some(user.user_id), "login", "auth", None, ip_address);

        self.db.insert_refresh_session(&session, &audit).await?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(AuthResponse {
            user: user.sanitized(),
            tokens: TokenResponse::new(
                access_token,
                refresh_token,
                self.jwt.access_token_expiry_seconds(),
            ),
        })
    }

    /// Logout: revoke the presented access token until its natural expiry
    /// and mark the refresh session revoked.
    pub async fn logout(
        &self,
        refresh_token: String,
        access_token_jti: String,
        access_token_exp: i64,
        ip_address: Option<String>,
    ) -> Result<(), AppError> {
        let remaining = access_token_exp - chrono::Utc::now().timestamp();
        if remaining > 0 {
            self.blacklist
                .blacklist_token(&access_token_jti, remaining)
                .await
                .map_err(ServiceError::Internal)?;
        }

        let claims = self
            .jwt
            .validate_refresh_token(&refresh_token)
            .map_err(|_| ServiceError::InvalidToken)?;

        let token_id = claims
            .jti
            .parse::<uuid::Uuid>()
            .map_err(|_| ServiceError::InvalidToken)?;
        let user_id = claims
            .sub
            .parse::<uuid::Uuid>()
            .map_err(|_| ServiceError::InvalidToken)?;

        let audit = AuditLog::new(Some(user_id), "logout", "auth", None, ip_address);
        let revoked = self
            .db
            .revoke_refresh_session(token_id, user_id, &audit)
            .await?;

        if !revoked {
            return Err(ServiceError::InvalidToken.into());
        }

        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Issue a new access token from a refresh token. The persisted session
    /// must still be live.
    pub async fn refresh(&self, refresh_token: String) -> Result<TokenResponse, AppError> {
        let claims = self
            .jwt
            .validate_refresh_token(&refresh_token)
            .map_err(|_| ServiceError::InvalidToken)?;

        let token_id = claims
            .jti
            .parse::<uuid::Uuid>()
            .map_err(|_| ServiceError::InvalidToken)?;

        let session = self
            .db
            .find_refresh_session(token_id)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if !session.is_usable() {
            return Err(ServiceError::TokenRevoked.into());
        }

        let user = self
            .db
            .find_user_by_id(session.user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !user.is_active {
            return Err(ServiceError::AccountDisabled.into());
        }

        let access_token = self
            .jwt
            .generate_access_token(&user.user_id.to_string(), &user.email, &user.role_code)
            .map_err(ServiceError::Internal)?;

        Ok(TokenResponse::new(
            access_token,
            refresh_token,
            self.jwt.access_token_expiry_seconds(),
        ))
    }

    /// Report whether an access token would currently authenticate.
    pub async fn introspect(&self, token: String) -> IntrospectResponse {
        let claims = match self.jwt.validate_access_token(&token) {
            Ok(claims) => claims,
            Err(_) => return IntrospectResponse::inactive(),
        };

        match self.blacklist.is_blacklisted(&claims.jti).await {
            Ok(false) => IntrospectResponse {
                active: true,
                sub: Some(claims.sub),
                email: Some(claims.email),
                role: Some(claims.role),
                exp: Some(claims.exp),
            },
            // Revoked, or the revocation set is unreachable: fail closed.
            _ => IntrospectResponse::inactive(),
        }
    }

    /// Load the current user for `/auth/me`.
    pub async fn current_user(&self, user_id: uuid::Uuid) -> Result<AdminUser, AppError> {
        self.db
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound.into())
    }

    fn jwt_refresh_expiry_days(&self) -> i64 {
        // The session row mirrors the JWT expiry window.
        self.jwt.refresh_token_expiry_days()
    }
}
