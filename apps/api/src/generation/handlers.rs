//! Axum route handlers for the drafting API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::generation::cover_letter::{generate_cover_letter, CoverLetterDraft, CoverLetterRequest};
use crate::generation::job_parser::{parse_job, ParsedJob};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseJobRequest {
    #[serde(default)]
    pub job_description: String,
}

/// POST /api/parse-job
///
/// Extracts a structured job from pasted text with the caller's Gemini key.
pub async fn handle_parse_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ParseJobRequest>,
) -> Result<Json<ParsedJob>, AppError> {
    let user = auth.load(&state).await?;
    let parsed = parse_job(
        state.llm.as_ref(),
        user.gemini_api_key.as_deref(),
        &request.job_description,
    )
    .await?;
    Ok(Json(parsed))
}

/// POST /api/generate-cover-letter
///
/// Returns the letter, its analysis (possibly `{}`) and a subject line.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterDraft>, AppError> {
    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "jobDescription cannot be empty".to_string(),
        ));
    }

    let user = auth.load(&state).await?;
    let draft = generate_cover_letter(
        state.llm.as_ref(),
        user.gemini_api_key.as_deref(),
        &user.name,
        &request,
    )
    .await?;
    Ok(Json(draft))
}
