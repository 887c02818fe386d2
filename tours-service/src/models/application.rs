//! Application model and status lifecycle.
//!
//! An application moves through a fixed set of states:
//!
//! ```text
//! Submitted -> UnderReview -> Approved | Rejected | InfoRequested
//! InfoRequested -> UnderReview
//! <any non-terminal> -> Cancelled
//! ```
//!
//! `Approved`, `Rejected` and `Cancelled` are terminal. Every other edge is
//! rejected without touching stored state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Application kinds offered by the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationType {
    Visa,
    DrivingLicense,
    BusinessIncorporation,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::Visa => "visa",
            ApplicationType::DrivingLicense => "driving_license",
            ApplicationType::BusinessIncorporation => "business_incorporation",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationType> {
        match s {
            "visa" => Some(ApplicationType::Visa),
            "driving_license" => Some(ApplicationType::DrivingLicense),
            "business_incorporation" => Some(ApplicationType::BusinessIncorporation),
            _ => None,
        }
    }
}

/// Application processing priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "low" => Some(Priority::Low),
            "normal" => Some(Priority::Normal),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Application lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    UnderReview,
    InfoRequested,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::InfoRequested => "info_requested",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s {
            "submitted" => Some(ApplicationStatus::Submitted),
            "under_review" => Some(ApplicationStatus::UnderReview),
            "info_requested" => Some(ApplicationStatus::InfoRequested),
            "approved" => Some(ApplicationStatus::Approved),
            "rejected" => Some(ApplicationStatus::Rejected),
            "cancelled" => Some(ApplicationStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Cancelled
        )
    }

    /// Whether `target` is a legal direct successor of this state.
    pub fn can_transition_to(&self, target: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, target) {
            (Submitted, UnderReview) => true,
            (UnderReview, Approved) | (UnderReview, Rejected) | (UnderReview, InfoRequested) => {
                true
            }
            (InfoRequested, UnderReview) => true,
            (state, Cancelled) => !state.is_terminal(),
            _ => false,
        }
    }
}

/// Application entity.
#[derive(Debug, Clone, FromRow)]
pub struct Application {
    pub application_id: Uuid,
    pub tracking_id: String,
    pub client_id: Uuid,
    pub application_type: String,
    pub status: String,
    pub priority: String,
    pub application_data: serde_json::Value,
    pub assigned_to: Option<Uuid>,
    pub submitted_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Application {
    pub fn new(
        tracking_id: String,
        client_id: Uuid,
        application_type: ApplicationType,
        priority: Priority,
        application_data: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            application_id: Uuid::new_v4(),
            tracking_id,
            client_id,
            application_type: application_type.as_str().to_string(),
            status: ApplicationStatus::Submitted.as_str().to_string(),
            priority: priority.as_str().to_string(),
            application_data,
            assigned_to: None,
            submitted_utc: now,
            updated_utc: now,
        }
    }

    pub fn current_status(&self) -> Option<ApplicationStatus> {
        ApplicationStatus::parse(&self.status)
    }
}

/// One row per status change, including the initial submission.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationStatusHistory {
    pub history_id: Uuid,
    pub application_id: Uuid,
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub changed_utc: DateTime<Utc>,
}

impl ApplicationStatusHistory {
    pub fn new(
        application_id: Uuid,
        old_status: Option<ApplicationStatus>,
        new_status: ApplicationStatus,
        changed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Self {
        Self {
            history_id: Uuid::new_v4(),
            application_id,
            old_status: old_status.map(|s| s.as_str().to_string()),
            new_status: new_status.as_str().to_string(),
            changed_by,
            notes,
            changed_utc: Utc::now(),
        }
    }
}

/// Request to open an application for a client.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    #[validate(length(min = 1))]
    pub application_type: String,
    pub priority: Option<String>,
    pub application_data: Option<serde_json::Value>,
    pub notes: Option<String>,
}

/// Request to move an application to a new status.
#[derive(Debug, Deserialize, Validate)]
pub struct TransitionRequest {
    #[validate(length(min = 1))]
    pub status: String,
    pub notes: Option<String>,
}

/// Request to change assignment/priority without touching the status.
#[derive(Debug, Deserialize)]
pub struct UpdateApplicationRequest {
    pub assigned_to: Option<Uuid>,
    pub priority: Option<String>,
}

/// Full application response for the admin API.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub application_id: Uuid,
    pub tracking_id: String,
    pub client_id: Uuid,
    pub application_type: String,
    pub status: String,
    pub priority: String,
    pub application_data: serde_json::Value,
    pub assigned_to: Option<Uuid>,
    pub submitted_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Application> for ApplicationResponse {
    fn from(a: Application) -> Self {
        Self {
            application_id: a.application_id,
            tracking_id: a.tracking_id,
            client_id: a.client_id,
            application_type: a.application_type,
            status: a.status,
            priority: a.priority,
            application_data: a.application_data,
            assigned_to: a.assigned_to,
            submitted_utc: a.submitted_utc,
            updated_utc: a.updated_utc,
        }
    }
}

/// Status history entry as exposed to admins.
#[derive(Debug, Serialize)]
pub struct StatusHistoryResponse {
    pub old_status: Option<String>,
    pub new_status: String,
    pub changed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub changed_utc: DateTime<Utc>,
}

impl From<ApplicationStatusHistory> for StatusHistoryResponse {
    fn from(h: ApplicationStatusHistory) -> Self {
        Self {
            old_status: h.old_status,
            new_status: h.new_status,
            changed_by: h.changed_by,
            notes: h.notes,
            changed_utc: h.changed_utc,
        }
    }
}

/// One step of the public tracking timeline. Carries no actor or notes.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicStatusChange {
    pub status: String,
    pub changed_utc: DateTime<Utc>,
}

/// Public tracking view. Intentionally excludes every client-identifying
/// field, the processing notes and the acting admins.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicApplicationView {
    pub tracking_id: String,
    pub application_type: String,
    pub status: String,
    pub submitted_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub timeline: Vec<PublicStatusChange>,
}

impl PublicApplicationView {
    pub fn from_parts(application: Application, history: Vec<ApplicationStatusHistory>) -> Self {
        Self {
            tracking_id: application.tracking_id,
            application_type: application.application_type,
            status: application.status,
            submitted_utc: application.submitted_utc,
            updated_utc: application.updated_utc,
            timeline: history
                .into_iter()
                .map(|h| PublicStatusChange {
                    status: h.new_status,
                    changed_utc: h.changed_utc,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    const ALL: [ApplicationStatus; 6] = [
        Submitted,
        UnderReview,
        InfoRequested,
        Approved,
        Rejected,
        Cancelled,
    ];

    #[test]
    fn legal_edges_are_exactly_the_documented_ones() {
        let legal: &[(ApplicationStatus, ApplicationStatus)] = &[
            (Submitted, UnderReview),
            (Submitted, Cancelled),
            (UnderReview, Approved),
            (UnderReview, Rejected),
            (UnderReview, InfoRequested),
            (UnderReview, Cancelled),
            (InfoRequested, UnderReview),
            (InfoRequested, Cancelled),
        ];

        for from in ALL {
            for to in ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for terminal in [Approved, Rejected, Cancelled] {
            assert!(terminal.is_terminal());
            for to in ALL {
                assert!(!terminal.can_transition_to(to));
            }
        }
    }

    #[test]
    fn submitted_cannot_skip_review() {
        assert!(!Submitted.can_transition_to(Approved));
        assert!(!Submitted.can_transition_to(Rejected));
        assert!(!Submitted.can_transition_to(InfoRequested));
    }

    #[test]
    fn resubmission_loop_is_legal() {
        assert!(UnderReview.can_transition_to(InfoRequested));
        assert!(InfoRequested.can_transition_to(UnderReview));
    }

    #[test]
    fn visa_review_walkthrough() {
        // Submitted -> UnderReview -> Approved is a legal walk; once
        // approved, the application can never reopen.
        assert!(Submitted.can_transition_to(UnderReview));
        assert!(UnderReview.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(UnderReview));
        assert!(!Approved.can_transition_to(Cancelled));
    }

    #[test]
    fn status_codes_round_trip() {
        for status in ALL {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ApplicationStatus::parse("pending"), None);
    }

    #[test]
    fn public_view_excludes_client_fields() {
        let app = Application::new(
            "TR20250101DEADBEEF".to_string(),
            Uuid::new_v4(),
            ApplicationType::Visa,
            Priority::Normal,
            serde_json::json!({"passport_number": "X123"}),
        );
        let history = vec![ApplicationStatusHistory::new(
            app.application_id,
            None,
            Submitted,
            Some(Uuid::new_v4()),
            Some("internal note".to_string()),
        )];

        let json = serde_json::to_value(PublicApplicationView::from_parts(app, history)).unwrap();
        assert_eq!(json["application_type"], "visa");
        assert_eq!(json["status"], "submitted");
        assert!(json.get("client_id").is_none());
        assert!(json.get("application_data").is_none());
        assert!(json.get("assigned_to").is_none());
        assert!(json["timeline"][0].get("changed_by").is_none());
        assert!(json["timeline"][0].get("notes").is_none());
    }
}
