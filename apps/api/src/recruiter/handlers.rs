use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::recruiter::{find_recruiters, Contact};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FindRecruiterRequest {
    #[serde(default)]
    pub company: String,
}

#[derive(Debug, Serialize)]
pub struct FindRecruiterResponse {
    pub contacts: Vec<Contact>,
}

/// POST /api/find-recruiter
pub async fn handle_find_recruiter(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<FindRecruiterRequest>,
) -> Result<Json<FindRecruiterResponse>, AppError> {
    let user = auth.load(&state).await?;
    let contacts = find_recruiters(
        state.contacts.as_ref(),
        user.apollo_api_key.as_deref(),
        &request.company,
    )
    .await?;
    Ok(Json(FindRecruiterResponse { contacts }))
}
