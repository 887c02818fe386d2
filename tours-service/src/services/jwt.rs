use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::JwtConfig;

/// JWT service for token generation and validation.
///
/// Tokens are signed HS256 with the shared secret from configuration; the
/// token format (claim names included) is a compatibility contract with the
/// frontend.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

/// Claims for access tokens (short-lived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject (admin user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Role code
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID (for revocation)
    pub jti: String,
}

/// Claims for refresh tokens (long-lived)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// Subject (admin user ID)
    pub sub: String,
    /// Token ID (matches the refresh_sessions row)
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Token response returned to the client
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Result<Self, anyhow::Error> {
        if config.secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT secret must be at least 32 bytes, got {}",
                config.secret.len()
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        })
    }

    /// Generate an access token for an admin user
    pub fn generate_access_token(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.access_token_expiry_minutes);

        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(token)
    }

    /// Generate a refresh token bound to a persisted session id
    pub fn generate_refresh_token(
        &self,
        user_id: &str,
        token_id: &str,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::days(self.refresh_token_expiry_days);

        let claims = RefreshTokenClaims {
            sub: user_id.to_string(),
            jti: token_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode refresh token: {}", e))?;

        Ok(token)
    }

    /// Generate both tokens; returns the refresh session id as well
    pub fn generate_token_pair(
        &self,
        user_id: &str,
        email: &str,
        role: &str,
    ) -> Result<(String, String, Uuid), anyhow::Error> {
        let access_token = self.generate_access_token(user_id, email, role)?;
        let refresh_token_id = Uuid::new_v4();
        let refresh_token =
            self.generate_refresh_token(user_id, &refresh_token_id.to_string())?;

        Ok((access_token, refresh_token, refresh_token_id))
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid access token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<RefreshTokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid refresh token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Access token expiry in seconds (for client info)
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }

    /// Refresh token expiry window in days
    pub fn refresh_token_expiry_days(&self) -> i64 {
        self.refresh_token_expiry_days
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "a-test-secret-that-is-long-enough-0123456789".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        }
    }

    #[test]
    fn rejects_short_secret() {
        let config = JwtConfig {
            secret: "too-short".to_string(),
            ..test_config()
        };
        assert!(JwtService::new(&config).is_err());
    }

    #[test]
    fn access_token_round_trips_claims() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;
        let token = service.generate_access_token("user_123", "ops@example.com", "admin")?;

        let claims = service.validate_access_token(&token)?;
        assert_eq!(claims.sub, "user_123");
        assert_eq!(claims.email, "ops@example.com");
        assert_eq!(claims.role, "admin");
        assert!(!claims.jti.is_empty());
        Ok(())
    }

    #[test]
    fn refresh_token_carries_session_id() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;
        let (access, refresh, session_id) =
            service.generate_token_pair("user_123", "ops@example.com", "viewer")?;

        assert!(!access.is_empty());
        let claims = service.validate_refresh_token(&refresh)?;
        assert_eq!(claims.jti, session_id.to_string());
        assert_eq!(claims.sub, "user_123");
        Ok(())
    }

    #[test]
    fn tampered_token_fails_validation() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;
        let token = service.generate_access_token("user_123", "ops@example.com", "viewer")?;

        let mut tampered = token.clone();
        tampered.pop();
        assert!(service.validate_access_token(&tampered).is_err());

        let other = JwtService::new(&JwtConfig {
            secret: "another-secret-that-is-also-long-enough!!".to_string(),
            ..test_config()
        })?;
        assert!(other.validate_access_token(&token).is_err());
        Ok(())
    }

    #[test]
    fn access_and_refresh_tokens_are_not_interchangeable() -> Result<(), anyhow::Error> {
        let service = JwtService::new(&test_config())?;
        let token = service.generate_refresh_token("user_123", "session_1")?;

        // An access-claims decode of a refresh token must fail: no email/role.
        assert!(service.validate_access_token(&token).is_err());
        Ok(())
    }
}
