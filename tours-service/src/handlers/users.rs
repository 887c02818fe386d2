//! Admin account management, plus the role/permission listings.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::{PageQuery, Pagination};
use crate::middleware::AuthUser;
use crate::models::{
    Action, AuditLog, Capability, CreateUserRequest, Module, Role, RoleResponse,
    UpdateUserRequest, UserResponse,
};
use crate::services::permissions::{capabilities_for, ALL_CAPABILITIES};
use crate::services::ServiceError;
use crate::utils::{client_ip, hash_password, Password, ValidatedJson};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UsersListResponse {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Users, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (users, total) = state.db.list_users(limit, offset).await?;

    Ok(Json(UsersListResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Users, Action::Create))?;

    let role = Role::parse(&req.role).ok_or(ServiceError::UnknownRole(req.role.clone()))?;

    if state.db.find_user_by_email(&req.email).await?.is_some() {
        return Err(ServiceError::EmailAlreadyRegistered.into());
    }

    let password_hash = hash_password(&Password::new(req.password))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Password hashing error: {}", e)))?;

    let new_user = crate::models::AdminUser::new(
        req.email.to_lowercase(),
        password_hash.into_string(),
        req.first_name,
        req.last_name,
        role,
    );

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "create_user",
        "user",
        Some(new_user.user_id.to_string()),
        client_ip(&headers),
    );
    state.db.insert_user(&new_user, &audit).await?;

    tracing::info!(user_id = %new_user.user_id, role = %new_user.role_code, "Admin user created");

    Ok((StatusCode::CREATED, Json(new_user.sanitized())))
}

pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Users, Action::Edit))?;

    let mut target = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or(ServiceError::UserNotFound)?;

    if let Some(email) = req.email {
        let email = email.to_lowercase();
        if let Some(existing) = state.db.find_user_by_email(&email).await? {
            if existing.user_id != target.user_id {
                return Err(ServiceError::EmailAlreadyRegistered.into());
            }
        }
        target.email = email;
    }
    if let Some(password) = req.password {
        target.password_hash = hash_password(&Password::new(password))
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Password hashing error: {}", e))
            })?
            .into_string();
    }
    if let Some(first_name) = req.first_name {
        target.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        target.last_name = last_name;
    }
    if let Some(role) = req.role {
        let role = Role::parse(&role).ok_or(ServiceError::UnknownRole(role))?;
        target.role_code = role.as_str().to_string();
    }
    if let Some(is_active) = req.is_active {
        target.is_active = is_active;
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_user",
        "user",
        Some(target.user_id.to_string()),
        client_ip(&headers),
    );
    state.db.update_user(&target, &audit).await?;

    Ok(Json(target.sanitized()))
}

/// Deactivate an admin account. Accounts are never hard-deleted.
pub async fn deactivate_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Users, Action::Delete))?;

    let actor_id = user.user_id()?;
    if actor_id == user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Cannot deactivate your own account"
        )));
    }

    let audit = AuditLog::new(
        Some(actor_id),
        "deactivate_user",
        "user",
        Some(user_id.to_string()),
        client_ip(&headers),
    );
    state.db.set_user_active(user_id, false, &audit).await?;

    Ok(Json(serde_json::json!({
        "message": "User deactivated successfully"
    })))
}

/// The fixed role set with each role's capability keys.
pub async fn list_roles(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Users, Action::View))?;

    let roles: Vec<RoleResponse> = Role::ALL
        .into_iter()
        .map(|role| RoleResponse {
            code: role.as_str(),
            label: role.label(),
            capabilities: capabilities_for(role).iter().map(|c| c.key()).collect(),
        })
        .collect();

    Ok(Json(serde_json::json!({ "roles": roles })))
}

/// Every known capability, grouped by module.
pub async fn list_permissions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Users, Action::View))?;

    let mut grouped = std::collections::BTreeMap::<&str, Vec<String>>::new();
    for capability in ALL_CAPABILITIES {
        grouped
            .entry(capability.module.as_str())
            .or_default()
            .push(capability.key());
    }

    Ok(Json(serde_json::json!({ "permissions": grouped })))
}
