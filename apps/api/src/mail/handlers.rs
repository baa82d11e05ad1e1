//! Axum route handlers for sending mail.

use std::path::Path;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::mail::address::parse_recipient_field;
use crate::mail::{dispatch, dispatch_batch, BatchReport, MailRequest, MailboxAccount, UploadedFile};
use crate::models::analytics::{EmailEvent, NewEmailEvent};
use crate::models::application::ApplicationUpdate;
use crate::state::AppState;

/// Form field carrying the optional attachment.
const RESUME_FIELD: &str = "resume";

struct ResumePart {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// The multipart send form shared by `/api/send/mail` and `/api/send/batch`.
struct SendForm {
    request: MailRequest,
    application_id: Option<Uuid>,
    resume: Option<ResumePart>,
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

impl SendForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut request = MailRequest::default();
        let mut raw_to = Vec::new();
        let mut application_id = None;
        let mut resume = None;

        while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == RESUME_FIELD {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_form)?;
                if !bytes.is_empty() {
                    resume = Some(ResumePart {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                continue;
            }

            let value = field.text().await.map_err(bad_form)?;
            match name.as_str() {
                "subject" => request.subject = value,
                "text" => request.text = Some(value),
                "html" => request.html = Some(value),
                "to" | "to[]" => raw_to.push(value),
                "applicationId" if !value.trim().is_empty() => {
                    application_id = Some(Uuid::parse_str(value.trim()).map_err(|_| {
                        AppError::Validation("applicationId must be a UUID".to_string())
                    })?);
                }
                _ => {}
            }
        }

        request.to = parse_recipient_field(&raw_to);
        Ok(Self {
            request,
            application_id,
            resume,
        })
    }

    fn stage(&self, dir: &Path) -> Result<Option<UploadedFile>, AppError> {
        self.resume
            .as_ref()
            .map(|part| {
                UploadedFile::stage(
                    dir,
                    part.file_name.clone(),
                    part.content_type.clone(),
                    &part.bytes,
                )
                .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to stage upload: {e}")))
            })
            .transpose()
    }
}

/// Marks the application sent and records a `sent` event.
/// Returns false when the application does not belong to the caller.
async fn record_sent(
    state: &AppState,
    user_id: Uuid,
    application_id: Uuid,
    metadata: Value,
) -> Result<bool, AppError> {
    let updated = state
        .storage
        .update_application(user_id, application_id, ApplicationUpdate::mark_sent(Utc::now()))
        .await?;
    if updated.is_none() {
        return Ok(false);
    }

    state
        .storage
        .record_event(NewEmailEvent {
            application_id,
            event: EmailEvent::Sent,
            metadata: Some(metadata),
        })
        .await?;
    Ok(true)
}

/// POST /api/send/mail
///
/// One message, every recipient in the same `To` header.
pub async fn handle_send_mail(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = SendForm::read(multipart).await?;
    let upload = form.stage(&state.config.upload_dir)?;

    let user = auth.load(&state).await?;
    let account = MailboxAccount::from_user(&user)?;
    let receipt = dispatch(&account, state.mailer.as_ref(), &form.request, upload).await?;

    if let Some(application_id) = form.application_id {
        let metadata = json!({
            "to": receipt.accepted,
            "subject": form.request.subject,
            "messageId": receipt.message_id,
        });
        match record_sent(&state, auth.user_id, application_id, metadata).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Sent mail for unknown application {application_id}; status not updated")
            }
            // Mail is already delivered; the response stays a success.
            Err(e) => error!("Sent mail but could not update application {application_id}: {e}"),
        }
    }

    Ok(Json(json!({ "message": "Email sent", "info": receipt })))
}

/// POST /api/send/batch
///
/// One message per recipient, paced. Always 200 with a per-recipient report
/// once the form and mailbox checks pass.
pub async fn handle_send_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<BatchReport>, AppError> {
    let form = SendForm::read(multipart).await?;
    let upload = form.stage(&state.config.upload_dir)?;

    let user = auth.load(&state).await?;
    let account = MailboxAccount::from_user(&user)?;
    let report = dispatch_batch(
        &account,
        state.mailer.as_ref(),
        state.pacer.as_ref(),
        &form.request,
        upload,
    )
    .await?;

    if let (Some(application_id), true) = (form.application_id, report.sent > 0) {
        let delivered: Vec<&str> = report
            .results
            .iter()
            .filter(|r| r.message_id.is_some())
            .map(|r| r.recipient.as_str())
            .collect();
        let metadata = json!({ "to": delivered, "subject": form.request.subject });
        match record_sent(&state, auth.user_id, application_id, metadata).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Batch sent for unknown application {application_id}; status not updated")
            }
            Err(e) => error!("Batch sent but could not update application {application_id}: {e}"),
        }
    }

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub application_id: Option<Uuid>,
    pub to: Option<Value>,
    pub subject: Option<String>,
}

/// POST /api/send-email
///
/// Records a send without contacting the mail server.
pub async fn handle_mark_sent(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let user = auth.load(&state).await?;
    MailboxAccount::from_user(&user)?;

    if let Some(application_id) = request.application_id {
        let metadata = json!({ "to": request.to, "subject": request.subject });
        if !record_sent(&state, auth.user_id, application_id, metadata).await? {
            return Err(AppError::NotFound(format!(
                "Application {application_id} not found"
            )));
        }
        info!("Application {application_id} marked sent");
    }

    Ok(Json(json!({
        "success": true,
        "messageId": format!("mock-{}", Utc::now().timestamp_millis()),
    })))
}
