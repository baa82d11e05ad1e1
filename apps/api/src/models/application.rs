use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

/// Lifecycle tag of a job application.
///
/// Nominal order is draft → scheduled → sent → delivered → opened → replied,
/// with bounced reachable from sent/delivered. Transitions are not enforced:
/// whichever caller updates the row sets the value directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Scheduled,
    Sent,
    Delivered,
    Opened,
    Replied,
    Bounced,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Scheduled => "scheduled",
            ApplicationStatus::Sent => "sent",
            ApplicationStatus::Delivered => "delivered",
            ApplicationStatus::Opened => "opened",
            ApplicationStatus::Replied => "replied",
            ApplicationStatus::Bounced => "bounced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(ApplicationStatus::Draft),
            "scheduled" => Some(ApplicationStatus::Scheduled),
            "sent" => Some(ApplicationStatus::Sent),
            "delivered" => Some(ApplicationStatus::Delivered),
            "opened" => Some(ApplicationStatus::Opened),
            "replied" => Some(ApplicationStatus::Replied),
            "bounced" => Some(ApplicationStatus::Bounced),
            _ => None,
        }
    }

    /// The message left the mailbox and did not bounce.
    pub fn counts_as_sent(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Sent
                | ApplicationStatus::Delivered
                | ApplicationStatus::Opened
                | ApplicationStatus::Replied
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub position: String,
    pub job_description: String,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_title: Option<String>,
    pub status: String,
    pub email_subject: Option<String>,
    pub email_content: Option<String>,
    pub cover_letter: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl JobApplicationRow {
    /// Unknown stored values read as draft.
    pub fn status(&self) -> ApplicationStatus {
        ApplicationStatus::parse(&self.status).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub company: String,
    pub position: String,
    pub job_description: String,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_title: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    pub email_subject: Option<String>,
    pub email_content: Option<String>,
    pub cover_letter: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl NewApplication {
    pub fn validate(&self) -> Result<(), AppError> {
        let missing: Vec<&str> = [
            ("company", &self.company),
            ("position", &self.position),
            ("jobDescription", &self.job_description),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Invalid application data: {} required",
                missing.join(", ")
            )))
        }
    }
}

/// Partial update. Any field may be overwritten, including `status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    pub company: Option<String>,
    pub position: Option<String>,
    pub job_description: Option<String>,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_title: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub email_subject: Option<String>,
    pub email_content: Option<String>,
    pub cover_letter: Option<String>,
    pub location: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl ApplicationUpdate {
    pub fn mark_sent(at: DateTime<Utc>) -> Self {
        Self {
            status: Some(ApplicationStatus::Sent),
            sent_at: Some(at),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ApplicationStatus::Draft,
            ApplicationStatus::Scheduled,
            ApplicationStatus::Sent,
            ApplicationStatus::Delivered,
            ApplicationStatus::Opened,
            ApplicationStatus::Replied,
            ApplicationStatus::Bounced,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_bounced_and_draft_do_not_count_as_sent() {
        assert!(!ApplicationStatus::Bounced.counts_as_sent());
        assert!(!ApplicationStatus::Draft.counts_as_sent());
        assert!(ApplicationStatus::Opened.counts_as_sent());
    }

    #[test]
    fn test_unknown_status_rejected_by_serde() {
        let res: Result<ApplicationUpdate, _> = serde_json::from_str(r#"{"status": "archived"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_new_application_defaults_to_draft() {
        let app: NewApplication = serde_json::from_str(
            r#"{"company": "Acme", "position": "SRE", "jobDescription": "Keep it up"}"#,
        )
        .unwrap();
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert!(app.validate().is_ok());
    }

    #[test]
    fn test_blank_required_fields_listed() {
        let app: NewApplication = serde_json::from_str(
            r#"{"company": " ", "position": "SRE", "jobDescription": ""}"#,
        )
        .unwrap();
        match app.validate() {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("company"));
                assert!(msg.contains("jobDescription"));
                assert!(!msg.contains("position"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
