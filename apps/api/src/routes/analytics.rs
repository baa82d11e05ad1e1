use axum::{extract::State, Json};

use crate::analytics::{summarize, AnalyticsSummary};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/analytics
pub async fn handle_summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let applications = state.storage.list_applications(auth.user_id).await?;
    Ok(Json(summarize(&applications)))
}
