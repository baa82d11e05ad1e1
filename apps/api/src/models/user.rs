use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Full user row. Never serialized directly: it carries the password hash
/// and mailbox tokens.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub name: String,
    pub gmail_connected: bool,
    pub gmail_access_token: Option<String>,
    pub gmail_refresh_token: Option<String>,
    pub apollo_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// What the UI gets back for the current user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub name: String,
    pub gmail_connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apollo_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    /// Public fields only; used right after register/login.
    pub fn basic(user: &UserRow) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            gmail_connected: user.gmail_connected,
            apollo_api_key: None,
            gemini_api_key: None,
            created_at: user.created_at,
        }
    }

    /// Includes the user's own stored API keys for the settings page.
    pub fn with_keys(user: &UserRow) -> Self {
        Self {
            apollo_api_key: user.apollo_api_key.clone(),
            gemini_api_key: user.gemini_api_key.clone(),
            ..Self::basic(user)
        }
    }
}

pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub name: String,
}

/// Partial user update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "apollioApiKey")]
    pub apollo_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gmail_access_token: Option<String>,
    pub gmail_refresh_token: Option<String>,
    /// Server-controlled; derived from the token fields.
    #[serde(skip)]
    pub gmail_connected: Option<bool>,
}

impl UserUpdate {
    /// Supplying both mailbox tokens marks the mailbox as connected.
    pub fn derive_mailbox_flag(mut self) -> Self {
        let present = |t: &Option<String>| t.as_deref().is_some_and(|s| !s.trim().is_empty());
        if present(&self.gmail_access_token) && present(&self.gmail_refresh_token) {
            self.gmail_connected = Some(true);
        }
        self
    }
}
