//! Admin dashboard statistics.

use axum::{
    extract::State,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use service_core::error::AppError;

use crate::middleware::AuthUser;
use crate::models::{Action, ApplicationResponse, Capability, Module};
use crate::services::DashboardStats;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub recent_applications: Vec<ApplicationResponse>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Dashboard, Action::View))?;

    let stats = state.db.dashboard_stats().await?;
    let (recent, _) = state.db.list_applications(None, None, None, 5, 0).await?;

    Ok(Json(DashboardResponse {
        stats,
        recent_applications: recent.into_iter().map(ApplicationResponse::from).collect(),
    }))
}
