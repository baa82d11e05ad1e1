//! Stored resumes. Files live under `<UPLOAD_DIR>/resumes`; rows point at them.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::resume::{NewResume, ResumeRow, ResumeUpdate};
use crate::state::AppState;

const RESUME_SUBDIR: &str = "resumes";

/// Keeps letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "true" | "1" | "on")
}

/// GET /api/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    Ok(Json(state.storage.list_resumes(auth.user_id).await?))
}

/// POST /api/resumes (also /api/upload-resume)
///
/// Multipart with a `resume` file field and an optional `isDefault` flag.
pub async fn handle_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("Invalid multipart body: {e}"))
    };

    let mut file = None;
    let mut is_default = false;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let bytes = field.bytes().await.map_err(bad_form)?;
                if !bytes.is_empty() {
                    file = Some((file_name, bytes));
                }
            }
            "isDefault" => is_default = parse_flag(&field.text().await.map_err(bad_form)?),
            _ => {}
        }
    }
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    let dir = state.config.upload_dir.join(RESUME_SUBDIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to create {}: {e}", dir.display())))?;
    let path = dir.join(format!("{}-{}", Uuid::new_v4(), safe_file_name(&file_name)));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to store resume: {e}")))?;

    let created = state
        .storage
        .create_resume(
            auth.user_id,
            NewResume {
                file_name,
                file_path: path.to_string_lossy().into_owned(),
                is_default,
            },
        )
        .await;

    match created {
        Ok(row) => {
            info!("Stored resume {} ({} bytes)", row.id, bytes.len());
            Ok((StatusCode::CREATED, Json(row)))
        }
        Err(e) => {
            // No row points at the file.
            let _ = tokio::fs::remove_file(&path).await;
            Err(e.into())
        }
    }
}

/// PATCH /api/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ResumeUpdate>,
) -> Result<Json<ResumeRow>, AppError> {
    state
        .storage
        .set_resume_default(auth.user_id, id, update.is_default)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let row = state
        .storage
        .delete_resume(auth.user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    if let Err(e) = tokio::fs::remove_file(&row.file_path).await {
        warn!("Resume {id} deleted but file {} remains: {e}", row.file_path);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("My Resume (final).pdf"), "My_Resume__final_.pdf");
        assert_eq!(safe_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(safe_file_name(""), "resume");
    }

    #[test]
    fn test_default_flag_parsing() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
