//! Admin user model.
//!
//! Admin accounts are never hard-deleted, only deactivated, so audit entries
//! always have a resolvable actor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::Role;

/// Admin user entity.
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role_code: String,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl AdminUser {
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash,
            first_name,
            last_name,
            role_code: role.as_str().to_string(),
            is_active: true,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// The parsed role, or None for a code this build no longer knows.
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role_code)
    }

    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// Login request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Logout request (the refresh token to revoke).
#[derive(Debug, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Refresh request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Introspection request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntrospectRequest {
    pub token: String,
}

/// Introspection response.
#[derive(Debug, Serialize, ToSchema)]
pub struct IntrospectResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl IntrospectResponse {
    pub fn inactive() -> Self {
        Self {
            active: false,
            sub: None,
            email: None,
            role: None,
            exp: None,
        }
    }
}

/// Request to create an admin user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub role: String,
}

/// Request to update an admin user. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long"))]
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Admin user response (no credential hash).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<AdminUser> for UserResponse {
    fn from(u: AdminUser) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            role: u.role_code,
            is_active: u.is_active,
            created_utc: u.created_utc,
            updated_utc: u.updated_utc,
        }
    }
}

/// Auth response with user info and tokens.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub tokens: crate::services::TokenResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_active_with_role_code() {
        let user = AdminUser::new(
            "ops@example.com".to_string(),
            "$argon2id$stub".to_string(),
            "Ada".to_string(),
            "Ops".to_string(),
            Role::Editor,
        );
        assert!(user.is_active);
        assert_eq!(user.role(), Some(Role::Editor));
    }

    #[test]
    fn sanitized_response_has_no_hash() {
        let user = AdminUser::new(
            "ops@example.com".to_string(),
            "$argon2id$stub".to_string(),
            "Ada".to_string(),
            "Ops".to_string(),
            Role::Viewer,
        );
        let json = serde_json::to_value(user.sanitized()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "viewer");
    }
}
