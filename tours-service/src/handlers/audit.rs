//! Audit log query endpoint for compliance review.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use service_core::error::AppError;

use crate::middleware::AuthUser;
use crate::models::{Action, AuditLogResponse, Capability, Module};
use crate::services::AuditQuery;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuditLogsResponse {
    pub logs: Vec<AuditLogResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// List audit entries, newest first, with filtering and pagination.
#[tracing::instrument(
    skip(state, user),
    fields(
        action = ?query.action,
        resource_type = ?query.resource_type,
        limit = query.limit,
        offset = query.offset
    )
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Audit, Action::View))?;

    let limit = query.limit.clamp(1, 1000);
    let offset = query.offset.max(0);
    let (logs, total) = state.audit.query(&query).await?;

    Ok(Json(AuditLogsResponse {
        logs,
        total,
        limit,
        offset,
    }))
}
