use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Delivery lifecycle events. Only `Sent` is produced by this service;
/// the rest exist for rows written by hand or by a future tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailEvent {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Replied,
    Bounced,
}

impl EmailEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailEvent::Sent => "sent",
            EmailEvent::Delivered => "delivered",
            EmailEvent::Opened => "opened",
            EmailEvent::Clicked => "clicked",
            EmailEvent::Replied => "replied",
            EmailEvent::Bounced => "bounced",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailEventRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub event: String,
    pub metadata: Option<Value>,
    pub occurred_at: DateTime<Utc>,
}

pub struct NewEmailEvent {
    pub application_id: Uuid,
    pub event: EmailEvent,
    pub metadata: Option<Value>,
}
