use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::analytics::EmailEventRow;
use crate::models::application::{ApplicationUpdate, JobApplicationRow, NewApplication};
use crate::state::AppState;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}

/// GET /api/applications
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<JobApplicationRow>>, AppError> {
    Ok(Json(state.storage.list_applications(auth.user_id).await?))
}

/// POST /api/applications
pub async fn handle_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(application): Json<NewApplication>,
) -> Result<(StatusCode, Json<JobApplicationRow>), AppError> {
    application.validate()?;
    let row = state
        .storage
        .create_application(auth.user_id, application)
        .await?;
    info!("Created application {} ({} at {})", row.id, row.position, row.company);
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobApplicationRow>, AppError> {
    state
        .storage
        .get_application(auth.user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// PATCH /api/applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ApplicationUpdate>,
) -> Result<Json<JobApplicationRow>, AppError> {
    state
        .storage
        .update_application(auth.user_id, id, update)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /api/applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.storage.delete_application(auth.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// GET /api/applications/:id/events
pub async fn handle_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<EmailEventRow>>, AppError> {
    if state.storage.get_application(auth.user_id, id).await?.is_none() {
        return Err(not_found(id));
    }
    Ok(Json(state.storage.list_events(auth.user_id, id).await?))
}
