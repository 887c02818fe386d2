//! Client CRM handlers.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::handlers::{PageQuery, Pagination};
use crate::middleware::AuthUser;
use crate::models::{
    Action, ApplicationResponse, AuditLog, Capability, Client, ClientResponse,
    CreateApplicationRequest, CreateClientRequest, Module, UpdateClientRequest,
};
use crate::utils::{client_ip, ValidatedJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListClientsQuery {
    pub search: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientsListResponse {
    pub clients: Vec<ClientResponse>,
    pub pagination: Pagination,
}

pub async fn list_clients(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
    Query(query): Query<ListClientsQuery>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Clients, Action::View))?;

    let (limit, offset) = page.limit_offset();
    let (clients, total) = state
        .db
        .list_clients(
            query.search.as_deref(),
            query.country.as_deref(),
            limit,
            offset,
        )
        .await?;

    Ok(Json(ClientsListResponse {
        clients: clients.into_iter().map(ClientResponse::from).collect(),
        pagination: Pagination::new(&page, total),
    }))
}

/// A client plus their applications, newest first.
pub async fn get_client(
    State(state): State<AppState>,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Clients, Action::View))?;

    let client = state
        .db
        .find_client_by_id(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    let (applications, _) = state
        .db
        .list_applications(None, None, Some(client_id), 100, 0)
        .await?;

    Ok(Json(serde_json::json!({
        "client": ClientResponse::from(client),
        "applications": applications
            .into_iter()
            .map(ApplicationResponse::from)
            .collect::<Vec<_>>(),
    })))
}

pub async fn create_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Clients, Action::Create))?;

    if state.db.find_client_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Client with this email already exists"
        )));
    }

    let client = Client::from_request(req);
    let audit = AuditLog::new(
        Some(user.user_id()?),
        "create_client",
        "client",
        Some(client.client_id.to_string()),
        client_ip(&headers),
    );
    state.db.insert_client(&client, &audit).await?;

    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}

pub async fn update_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Clients, Action::Edit))?;

    let mut client = state
        .db
        .find_client_by_id(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    if let Some(email) = req.email {
        let email = email.to_lowercase();
        if let Some(existing) = state.db.find_client_by_email(&email).await? {
            if existing.client_id != client.client_id {
                return Err(AppError::Conflict(anyhow::anyhow!("Email already exists")));
            }
        }
        client.email = email;
    }
    if let Some(v) = req.first_name {
        client.first_name = v;
    }
    if let Some(v) = req.last_name {
        client.last_name = v;
    }
    if let Some(v) = req.phone {
        client.phone = Some(v);
    }
    if let Some(v) = req.country {
        client.country = Some(v);
    }
    if let Some(v) = req.passport_number {
        client.passport_number = Some(v);
    }
    if let Some(v) = req.date_of_birth {
        client.date_of_birth = Some(v);
    }
    if let Some(v) = req.nationality {
        client.nationality = Some(v);
    }
    if let Some(v) = req.address {
        client.address = Some(v);
    }
    if let Some(v) = req.emergency_contact_name {
        client.emergency_contact_name = Some(v);
    }
    if let Some(v) = req.emergency_contact_phone {
        client.emergency_contact_phone = Some(v);
    }
    if let Some(v) = req.notes {
        client.notes = Some(v);
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "update_client",
        "client",
        Some(client.client_id.to_string()),
        client_ip(&headers),
    );
    state.db.update_client(&client, &audit).await?;

    Ok(Json(ClientResponse::from(client)))
}

/// Delete a client. Refused while the client still has open applications.
pub async fn delete_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state
        .guard
        .require(&user.0, Capability::new(Module::Clients, Action::Delete))?;

    state
        .db
        .find_client_by_id(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

    let open = state.db.count_open_applications(client_id).await?;
    if open > 0 {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Cannot delete client with {} open application(s)",
            open
        )));
    }

    let audit = AuditLog::new(
        Some(user.user_id()?),
        "delete_client",
        "client",
        Some(client_id.to_string()),
        client_ip(&headers),
    );
    state.db.delete_client(client_id, &audit).await?;

    Ok(Json(serde_json::json!({
        "message": "Client deleted successfully"
    })))
}

/// Open an application for a client.
pub async fn create_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    user: AuthUser,
    Path(client_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateApplicationRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.guard.require(
        &user.0,
        Capability::new(Module::Applications, Action::Create),
    )?;

    let application = state
        .lifecycle
        .create(client_id, req, user.user_id()?, client_ip(&headers))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::from(application)),
    ))
}
