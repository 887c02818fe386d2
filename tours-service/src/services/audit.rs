//! Audit recorder - append-only write path plus the compliance query path.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{AuditLog, AuditLogResponse};
use crate::services::database::{AuditLogFilter, Database};

/// Query parameters accepted by the audit endpoint.
#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub actor_user_id: Option<Uuid>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub from_utc: Option<DateTime<Utc>>,
    pub to_utc: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

#[derive(Clone)]
pub struct AuditRecorder {
    db: Database,
}

impl AuditRecorder {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one entry. A failure here fails the caller; a mutation must
    /// not outlive a lost audit record.
    pub async fn record(&self, entry: &AuditLog) -> Result<(), AppError> {
        self.db.insert_audit_log(entry).await
    }

    /// Filtered, paginated read path, newest first.
    pub async fn query(
        &self,
        query: &AuditQuery,
    ) -> Result<(Vec<AuditLogResponse>, i64), AppError> {
        let filter = AuditLogFilter {
            actor_user_id: query.actor_user_id,
            action: query.action.clone(),
            resource_type: query.resource_type.clone(),
            resource_id: query.resource_id.clone(),
            from_utc: query.from_utc,
            to_utc: query.to_utc,
            limit: query.limit.clamp(1, 1000),
            offset: query.offset.max(0),
        };

        let (logs, total) = self.db.query_audit_logs(&filter).await?;
        Ok((logs.into_iter().map(AuditLogResponse::from).collect(), total))
    }
}
