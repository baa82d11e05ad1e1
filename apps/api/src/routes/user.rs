//! Account settings: profile fields, API keys, mailbox tokens.

use axum::{extract::State, Json};
use email_address::EmailAddress;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{UserUpdate, UserView};
use crate::state::AppState;

async fn apply_update(
    state: &AppState,
    auth: AuthUser,
    update: UserUpdate,
) -> Result<UserView, AppError> {
    let user = state
        .storage
        .update_user(auth.user_id, update)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(UserView::with_keys(&user))
}

/// PATCH /api/user
///
/// Supplying both mailbox tokens marks the mailbox connected.
pub async fn handle_update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserView>, AppError> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("Name cannot be empty".to_string()));
    }
    if let Some(email) = update.email.as_deref() {
        if !EmailAddress::is_valid(email.trim()) {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        if let Some(other) = state.storage.find_user_by_email(email.trim()).await? {
            if other.id != auth.user_id {
                return Err(AppError::Validation("Email already exists".to_string()));
            }
        }
    }

    let view = apply_update(&state, auth, update.derive_mailbox_flag()).await?;
    info!("Updated settings for user {}", auth.user_id);
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTokenRequest {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

/// POST /api/add/token
pub async fn handle_add_token(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<AddTokenRequest>,
) -> Result<Json<UserView>, AppError> {
    let access_token = request.access_token.trim();
    let refresh_token = request.refresh_token.trim();
    if access_token.is_empty() || refresh_token.is_empty() {
        return Err(AppError::Validation(
            "accessToken and refreshToken are required".to_string(),
        ));
    }

    let update = UserUpdate {
        gmail_access_token: Some(access_token.to_string()),
        gmail_refresh_token: Some(refresh_token.to_string()),
        ..Default::default()
    }
    .derive_mailbox_flag();

    let view = apply_update(&state, auth, update).await?;
    info!("Mailbox connected for user {}", auth.user_id);
    Ok(Json(view))
}
