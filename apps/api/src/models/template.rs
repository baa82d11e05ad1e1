use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailTemplateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub subject: String,
    pub content: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub is_default: bool,
}

impl NewTemplate {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() || self.subject.trim().is_empty() {
            return Err(AppError::Validation(
                "Invalid template data: name and subject are required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub content: Option<String>,
    pub is_default: Option<bool>,
}
