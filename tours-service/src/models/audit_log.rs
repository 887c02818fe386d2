//! Audit log model - append-only record of mutating admin actions.
//!
//! Rows are never updated or deleted by the application.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Audit log entry.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLog {
    pub audit_id: Uuid,
    pub actor_user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        actor_user_id: Option<Uuid>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: Option<String>,
        ip_address: Option<String>,
    ) -> Self {
        Self {
            audit_id: Uuid::new_v4(),
            actor_user_id,
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id,
            details: None,
            ip_address,
            created_utc: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Audit log entry as exposed to the compliance endpoint.
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub audit_id: Uuid,
    pub actor_user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl From<AuditLog> for AuditLogResponse {
    fn from(a: AuditLog) -> Self {
        Self {
            audit_id: a.audit_id,
            actor_user_id: a.actor_user_id,
            action: a.action,
            resource_type: a.resource_type,
            resource_id: a.resource_id,
            details: a.details,
            ip_address: a.ip_address,
            created_utc: a.created_utc,
        }
    }
}
