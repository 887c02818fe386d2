//! Application lifecycle manager.
//!
//! Owns tracking-id generation, transition validation and the public
//! tracking lookup. A transition that is not a direct successor of the
//! current state fails without touching stored state; a successful one
//! commits the status change, the history row and the audit entry as one
//! transaction.

use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Application, ApplicationStatus, ApplicationStatusHistory, ApplicationType, AuditLog,
    CreateApplicationRequest, Priority, PublicApplicationView,
};
use crate::services::Database;

#[derive(Clone)]
pub struct ApplicationLifecycle {
    db: Database,
}

impl ApplicationLifecycle {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open an application for a client. Retries once on a tracking-id
    /// collision; the id space makes a second collision unrealistic.
    #[tracing::instrument(skip(self, req), fields(client_id = %client_id))]
    pub async fn create(
        &self,
        client_id: Uuid,
        req: CreateApplicationRequest,
        actor: Uuid,
        ip_address: Option<String>,
    ) -> Result<Application, AppError> {
        let application_type = ApplicationType::parse(&req.application_type).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!(
                "Unknown application type: {}",
                req.application_type
            ))
        })?;

        let priority = match req.priority.as_deref() {
            None => Priority::Normal,
            Some(p) => Priority::parse(p).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("Unknown priority: {}", p))
            })?,
        };

        self.db
            .find_client_by_id(client_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Client not found")))?;

        let data = req.application_data.unwrap_or_else(|| serde_json::json!({}));

        for attempt in 0..2 {
            let application = Application::new(
                generate_tracking_id(),
                client_id,
                application_type,
                priority,
                data.clone(),
            );
            let history = ApplicationStatusHistory::new(
                application.application_id,
                None,
                ApplicationStatus::Submitted,
                Some(actor),
                req.notes.clone().or_else(|| Some("Application submitted".to_string())),
            );
            let audit = AuditLog::new(
                Some(actor),
                "create_application",
                "application",
                Some(application.tracking_id.clone()),
                ip_address.clone(),
            );

            match self.db.create_application(&application, &history, &audit).await {
                Ok(()) => {
                    tracing::info!(
                        tracking_id = %application.tracking_id,
                        "Application created"
                    );
                    return Ok(application);
                }
                Err(AppError::Conflict(_)) if attempt == 0 => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(anyhow::anyhow!(
            "Could not allocate a unique tracking id"
        )))
    }

    /// Move an application to `target`. Only the edges of the state machine
    /// are accepted; everything else is an invalid transition.
    #[tracing::instrument(skip(self, notes), fields(application_id = %application_id, to_status = target.as_str()))]
    pub async fn transition(
        &self,
        application_id: Uuid,
        target: ApplicationStatus,
        actor: Uuid,
        notes: Option<String>,
        ip_address: Option<String>,
    ) -> Result<Application, AppError> {
        let application = self
            .db
            .find_application_by_id(application_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Application not found")))?;

        let current = application.current_status().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Application {} has unknown status {}",
                application.tracking_id,
                application.status
            ))
        })?;

        if !current.can_transition_to(target) {
            return Err(AppError::InvalidTransition(anyhow::anyhow!(
                "Cannot move application from {} to {}",
                current.as_str(),
                target.as_str()
            )));
        }

        let history = ApplicationStatusHistory::new(
            application_id,
            Some(current),
            target,
            Some(actor),
            notes,
        );
        let audit = AuditLog::new(
            Some(actor),
            "transition",
            "application",
            Some(application.tracking_id.clone()),
            ip_address,
        )
        .with_details(format!(
            "Status changed from {} to {}",
            current.as_str(),
            target.as_str()
        ));

        self.db
            .transition_application(
                application_id,
                current.as_str(),
                target.as_str(),
                &history,
                &audit,
            )
            .await
    }

    /// Public tracking lookup. The one read path intentionally exempt from
    /// the access guard; exposes non-sensitive fields only.
    pub async fn track(&self, tracking_id: &str) -> Result<PublicApplicationView, AppError> {
        let application = self
            .db
            .find_application_by_tracking_id(tracking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Application not found")))?;

        let history = self
            .db
            .list_application_history(application.application_id)
            .await?;

        Ok(PublicApplicationView::from_parts(application, history))
    }
}

/// Tracking ids look like `TR20250807A1B2C3D4`: shareable, unique, and not
/// guessable from a previous one.
pub fn generate_tracking_id() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let suffix: String = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
    format!("TR{}{}", date, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_ids_have_the_documented_shape() {
        let id = generate_tracking_id();
        assert!(id.starts_with("TR"));
        assert_eq!(id.len(), 2 + 8 + 8);
        assert!(id[2..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn tracking_ids_do_not_repeat() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate_tracking_id()));
        }
    }
}
