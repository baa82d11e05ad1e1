use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::template::{EmailTemplateRow, NewTemplate, TemplateUpdate};
use crate::state::AppState;

/// GET /api/templates
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<EmailTemplateRow>>, AppError> {
    Ok(Json(state.storage.list_templates(auth.user_id).await?))
}

/// POST /api/templates
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(template): Json<NewTemplate>,
) -> Result<(StatusCode, Json<EmailTemplateRow>), AppError> {
    template.validate()?;
    let row = state.storage.create_template(auth.user_id, template).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PATCH /api/templates/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<TemplateUpdate>,
) -> Result<Json<EmailTemplateRow>, AppError> {
    state
        .storage
        .update_template(auth.user_id, id, update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))
}

/// DELETE /api/templates/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.storage.delete_template(auth.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Template {id} not found")))
    }
}
