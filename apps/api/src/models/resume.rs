use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    /// Location of the stored file under the upload directory.
    #[serde(skip_serializing)]
    pub file_path: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NewResume {
    pub file_name: String,
    pub file_path: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUpdate {
    pub is_default: bool,
}
