//! Application handlers: admin listing/processing plus the public tracking
//! endpoint.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::{PageQuery, Pagination};
use crate::middleware::AuthUser;
use crate::models::{
    Action, ApplicationResponse, ApplicationStatus, AuditLog, Capability, Module,
    StatusHistoryResponse, TransitionRequest, UpdateApplicationRequest,
};
use crate::utils::{client_ip, ValidatedJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<String>,
    pub application_type: Option<String>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ApplicationsListResponse {
    pub applications: Vec<ApplicationResponse>,
    pub pagination: Pagination,
}

pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Applications, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (applications, total) = state
        .db
        .list_applications(
            query.status.as_deref(),
            query.application_type.as_deref(),
            query.client_id,
            limit,
            offset,
        )
        .await?;

    Ok(Json(ApplicationsListResponse {
        applications: applications
            .into_iter()
            .map(ApplicationResponse::from)
            .collect(),
        pagination: Pagination::new(&page, total),
    }))
}

/// One application with its full status history.
pub async fn get_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Applications, Action::View))?;

    let application = state
        .db
        .find_application_by_id(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Application not found")))?;

    let history = state.db.list_application_history(application_id).await?;

    Ok(Json(serde_json::json!({
        "application": ApplicationResponse::from(application),
        "status_history": history
            .into_iter()
            .map(StatusHistoryResponse::from)
            .collect::<Vec<_>>(),
    })))
}

/// Move an application through its lifecycle. Which capability is required
/// depends on the edge: cancellation and client resubmission are deployment
/// policy, everything else needs `applications.process`.
pub async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(application_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<TransitionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let target = ApplicationStatus::parse(&req.status).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Unknown status: {}", req.status))
    })?;

    let application = state
        .db
        .find_application_by_id(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Application not found")))?;
    let current = application.current_status();

    let default_capability = Capability::new(Module::Applications, Action::Process);
    let required = if target == ApplicationStatus::Cancelled {
        state
            .config
            .lifecycle
            .cancel_capability()
            .unwrap_or(default_capability)
    } else if current == Some(ApplicationStatus::InfoRequested)
        && target == ApplicationStatus::UnderReview
    {
        state
            .config
            .lifecycle
            .resubmit_capability()
            .unwrap_or(default_capability)
    } else {
        default_capability
    };
    state.guard.require(&user.0, required)?;

    let updated = state
        .lifecycle
        .transition(
            application_id,
            target,
            user.user_id()?,
            req.notes,
            client_ip(&headers),
        )
        .await?;

    Ok(Json(ApplicationResponse::from(updated)))
}

/// Change assignment or priority without touching the status.
pub async fn update_assignment(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(application_id): Path<Uuid>,
    Json(req): Json<UpdateApplicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Applications, Action::Edit))?;

    if let Some(priority) = req.priority.as_deref() {
        if crate::models::Priority::parse(priority).is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown priority: {}",
                priority
            )));
        }
    }

    if let Some(assignee) = req.assigned_to {
        state
            .db
            .find_user_by_id(assignee)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Assignee not found")))?;
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_application",
        "application",
        Some(application_id.to_string()),
        client_ip(&headers),
    );
    let updated = state
        .db
        .update_application_assignment(
            application_id,
            req.assigned_to,
            req.priority.as_deref(),
            &audit,
        )
        .await?;

    Ok(Json(ApplicationResponse::from(updated)))
}

/// Track an application by tracking id
///
/// Public: requires no token and returns only non-sensitive fields.
#[utoipa::path(
    get,
    path = "/api/applications/track/{tracking_id}",
    params(
        ("tracking_id" = String, Path, description = "Externally shareable tracking id")
    ),
    responses(
        (status = 200, description = "Application status", body = PublicApplicationView),
        (status = 404, description = "Unknown tracking id"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Tracking"
)]
pub async fn track(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let view = state.lifecycle.track(&tracking_id).await?;
    Ok(Json(view))
}
