//! Single-message and per-recipient dispatch.
//!
//! Both entry points own the staged upload and close it after the last
//! send attempt. Early returns drop the guard, which also deletes the file.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::mail::address::{is_valid_address, partition_recipients, sanitize_address};
use crate::mail::pacing::SendPacer;
use crate::mail::transport::{
    MailAttachment, MailError, Mailer, MailboxAccount, OutgoingMail, SendReceipt,
};
use crate::mail::upload::UploadedFile;

/// A send request as it arrives from the client. Recipients are raw.
#[derive(Debug, Clone, Default)]
pub struct MailRequest {
    pub to: Vec<String>,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl MailRequest {
    fn body(&self) -> Result<(Option<String>, Option<String>), AppError> {
        let keep = |s: &Option<String>| s.as_ref().filter(|v| !v.trim().is_empty()).cloned();
        let (text, html) = (keep(&self.text), keep(&self.html));
        if text.is_none() && html.is_none() {
            return Err(AppError::Validation(
                "Either text or html body is required".to_string(),
            ));
        }
        Ok((text, html))
    }

    fn outgoing(
        &self,
        to: Vec<String>,
        text: &Option<String>,
        html: &Option<String>,
        attachment: &Option<MailAttachment>,
    ) -> OutgoingMail {
        OutgoingMail {
            to,
            subject: self.subject.trim().to_string(),
            text: text.clone(),
            html: html.clone(),
            attachment: attachment.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOutcome {
    pub recipient: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<RecipientOutcome>,
    pub sent: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record_sent(&mut self, recipient: String, message_id: String) {
        self.sent += 1;
        self.results.push(RecipientOutcome {
            recipient,
            status: DeliveryStatus::Sent,
            message_id: Some(message_id),
            error: None,
        });
    }

    fn record_failure(&mut self, recipient: String, error: String) {
        self.failed += 1;
        self.results.push(RecipientOutcome {
            recipient,
            status: DeliveryStatus::Failed,
            message_id: None,
            error: Some(error),
        });
    }
}

async fn read_attachment(upload: Option<&UploadedFile>) -> Result<Option<MailAttachment>, AppError> {
    match upload {
        Some(file) => Ok(Some(
            file.to_attachment().await.map_err(MailError::from)?,
        )),
        None => Ok(None),
    }
}

/// Sends one message to every recipient in a shared `To` header.
/// Any invalid recipient rejects the whole request before sending.
pub async fn dispatch(
    account: &MailboxAccount,
    mailer: &dyn Mailer,
    request: &MailRequest,
    upload: Option<UploadedFile>,
) -> Result<SendReceipt, AppError> {
    let result = send_single(account, mailer, request, upload.as_ref()).await;
    if let Some(file) = upload {
        file.close();
    }
    result
}

async fn send_single(
    account: &MailboxAccount,
    mailer: &dyn Mailer,
    request: &MailRequest,
    upload: Option<&UploadedFile>,
) -> Result<SendReceipt, AppError> {
    let (valid, invalid) = partition_recipients(&request.to);
    if !invalid.is_empty() {
        return Err(AppError::Validation(format!(
            "Invalid email address(es): {}",
            invalid.join(", ")
        )));
    }
    if valid.is_empty() {
        return Err(AppError::Validation(
            "At least one recipient is required".to_string(),
        ));
    }
    let (text, html) = request.body()?;
    let attachment = read_attachment(upload).await?;

    let mail = request.outgoing(valid, &text, &html, &attachment);
    let receipt = mailer.send(account, &mail).await?;
    info!(
        "Dispatched {} from {} to {} recipient(s)",
        receipt.message_id,
        account.email,
        receipt.accepted.len()
    );
    Ok(receipt)
}

/// Sends an independent message to each recipient, pausing between
/// consecutive remote sends. Per-recipient failures land in the report.
pub async fn dispatch_batch(
    account: &MailboxAccount,
    mailer: &dyn Mailer,
    pacer: &dyn SendPacer,
    request: &MailRequest,
    upload: Option<UploadedFile>,
) -> Result<BatchReport, AppError> {
    let result = send_each(account, mailer, pacer, request, upload.as_ref()).await;
    if let Some(file) = upload {
        file.close();
    }
    result
}

async fn send_each(
    account: &MailboxAccount,
    mailer: &dyn Mailer,
    pacer: &dyn SendPacer,
    request: &MailRequest,
    upload: Option<&UploadedFile>,
) -> Result<BatchReport, AppError> {
    if request.to.is_empty() {
        return Err(AppError::Validation(
            "At least one recipient is required".to_string(),
        ));
    }
    let (text, html) = request.body()?;
    let attachment = read_attachment(upload).await?;

    let mut report = BatchReport::default();
    let mut attempted = false;
    for raw in &request.to {
        let recipient = sanitize_address(raw);
        if !is_valid_address(&recipient) {
            let shown = if recipient.is_empty() {
                raw.trim().to_string()
            } else {
                recipient
            };
            warn!("Skipping invalid recipient {shown:?}");
            report.record_failure(shown, "Invalid email address".to_string());
            continue;
        }

        if attempted {
            pacer.pause().await;
        }
        attempted = true;

        let mail = request.outgoing(vec![recipient.clone()], &text, &html, &attachment);
        match mailer.send(account, &mail).await {
            Ok(receipt) => report.record_sent(recipient, receipt.message_id),
            Err(e) => {
                warn!("Send to {recipient} failed: {e}");
                report.record_failure(recipient, e.to_string());
            }
        }
    }

    info!(
        "Batch from {} finished: {} sent, {} failed",
        account.email, report.sent, report.failed
    );
    Ok(report)
}
