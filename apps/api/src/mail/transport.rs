//! Gmail delivery: OAuth2 refresh-token grant, then SMTP with XOAUTH2.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::user::UserRow;

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Access token refresh failed: {0}")]
    Token(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Message has neither a text nor an HTML body")]
    EmptyBody,

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Attachment read failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MailError> for AppError {
    fn from(e: MailError) -> Self {
        match e {
            MailError::Address(msg) => AppError::Validation(format!("Invalid address: {msg}")),
            MailError::EmptyBody => {
                AppError::Validation("Either text or html body is required".to_string())
            }
            other => AppError::Mail(other.to_string()),
        }
    }
}

/// The sender's connected mailbox.
#[derive(Debug, Clone)]
pub struct MailboxAccount {
    pub email: String,
    pub name: String,
    pub refresh_token: String,
}

impl MailboxAccount {
    /// Requires a connected mailbox with a stored refresh token.
    pub fn from_user(user: &UserRow) -> Result<Self, AppError> {
        let refresh_token = user
            .gmail_refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match refresh_token {
            Some(token) if user.gmail_connected => Ok(MailboxAccount {
                email: user.email.clone(),
                name: user.name.clone(),
                refresh_token: token.to_string(),
            }),
            _ => Err(AppError::Precondition("Gmail not connected".to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MailAttachment {
    fn content_type(&self) -> Result<ContentType, MailError> {
        let raw = self.content_type.as_deref().unwrap_or(OCTET_STREAM);
        ContentType::parse(raw)
            .or_else(|_| ContentType::parse(OCTET_STREAM))
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

/// A fully resolved message. Addresses are already sanitized and validated.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub attachment: Option<MailAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_id: String,
    pub accepted: Vec<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        account: &MailboxAccount,
        mail: &OutgoingMail,
    ) -> Result<SendReceipt, MailError>;
}

/// Builds the MIME message. `From` is `<name> <email>`; all recipients share one `To` header.
pub fn build_message(
    account: &MailboxAccount,
    mail: &OutgoingMail,
    message_id: &str,
) -> Result<Message, MailError> {
    let from_address: Address = account
        .email
        .parse()
        .map_err(|_| MailError::Address(account.email.clone()))?;

    let mut builder = Message::builder()
        .from(Mailbox::new(Some(account.name.clone()), from_address))
        .subject(mail.subject.clone())
        .message_id(Some(message_id.to_string()));
    for recipient in &mail.to {
        let mailbox: Mailbox = recipient
            .parse()
            .map_err(|_| MailError::Address(recipient.clone()))?;
        builder = builder.to(mailbox);
    }

    let content = match (mail.text.as_deref(), mail.html.as_deref()) {
        (Some(text), Some(html)) => {
            MultiPart::alternative_plain_html(text.to_string(), html.to_string())
        }
        (Some(text), None) => MultiPart::mixed().singlepart(SinglePart::plain(text.to_string())),
        (None, Some(html)) => MultiPart::mixed().singlepart(SinglePart::html(html.to_string())),
        (None, None) => return Err(MailError::EmptyBody),
    };

    let body = match &mail.attachment {
        Some(file) => MultiPart::mixed().multipart(content).singlepart(
            Attachment::new(file.file_name.clone()).body(file.bytes.clone(), file.content_type()?),
        ),
        None => content,
    };

    builder
        .multipart(body)
        .map_err(|e| MailError::Build(e.to_string()))
}

fn new_message_id(sender: &str) -> String {
    let domain = sender.rsplit_once('@').map_or("localhost", |(_, d)| d);
    format!("<{}@{}>", Uuid::new_v4(), domain)
}

/// Sends through Gmail. Every send refreshes the access token first.
#[derive(Clone)]
pub struct GmailMailer {
    oauth: BasicClient,
    smtp_host: String,
}

impl GmailMailer {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let oauth = BasicClient::new(
            ClientId::new(config.google_client_id.clone()),
            Some(ClientSecret::new(config.google_client_secret.clone())),
            AuthUrl::new(config.google_auth_url.clone())?,
            Some(TokenUrl::new(config.google_token_url.clone())?),
        );
        Ok(Self {
            oauth,
            smtp_host: config.smtp_host.clone(),
        })
    }

    async fn access_token(&self, refresh_token: &str) -> Result<String, MailError> {
        let token = self
            .oauth
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| MailError::Token(e.to_string()))?;
        Ok(token.access_token().secret().clone())
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(
        &self,
        account: &MailboxAccount,
        mail: &OutgoingMail,
    ) -> Result<SendReceipt, MailError> {
        let message_id = new_message_id(&account.email);
        let message = build_message(account, mail, &message_id)?;

        let access_token = self.access_token(&account.refresh_token).await?;
        debug!("Refreshed access token for {}", account.email);

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.smtp_host)?
            .credentials(Credentials::new(account.email.clone(), access_token))
            .authentication(vec![Mechanism::Xoauth2])
            .build();

        let response = transport.send(message).await?;
        info!(
            "Sent {message_id} to {} recipient(s), smtp code {}",
            mail.to.len(),
            response.code()
        );

        Ok(SendReceipt {
            message_id,
            accepted: mail.to.clone(),
        })
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{MailError, Mailer, MailboxAccount, OutgoingMail, SendReceipt};

    /// Records every message instead of sending. Recipients listed in
    /// `reject` fail with a token error.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingMail>>,
        pub reject: Vec<String>,
    }

    impl RecordingMailer {
        pub fn rejecting(reject: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                reject: reject.iter().map(|r| r.to_string()).collect(),
            }
        }

        pub fn attempts(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(
            &self,
            _account: &MailboxAccount,
            mail: &OutgoingMail,
        ) -> Result<SendReceipt, MailError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(mail.clone());
            if mail.to.iter().any(|r| self.reject.contains(r)) {
                return Err(MailError::Token("invalid_grant".to_string()));
            }
            Ok(SendReceipt {
                message_id: format!("<test-{}@mail.test>", sent.len()),
                accepted: mail.to.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user(connected: bool, refresh: Option<&str>) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            password_hash: String::new(),
            email: "ada@example.com".to_string(),
            name: "Ada Lovelace".to_string(),
            gmail_connected: connected,
            gmail_access_token: None,
            gmail_refresh_token: refresh.map(str::to_string),
            apollo_api_key: None,
            gemini_api_key: None,
            created_at: Utc::now(),
        }
    }

    fn account() -> MailboxAccount {
        MailboxAccount::from_user(&user(true, Some("1//refresh"))).unwrap()
    }

    fn mail(text: Option<&str>, html: Option<&str>) -> OutgoingMail {
        OutgoingMail {
            to: vec!["a@x.com".to_string(), "b@x.com".to_string()],
            subject: "Application for SRE Position".to_string(),
            text: text.map(str::to_string),
            html: html.map(str::to_string),
            attachment: None,
        }
    }

    #[test]
    fn test_missing_refresh_token_is_not_connected() {
        for row in [user(true, None), user(true, Some("  ")), user(false, Some("1//r"))] {
            match MailboxAccount::from_user(&row) {
                Err(AppError::Precondition(msg)) => assert_eq!(msg, "Gmail not connected"),
                other => panic!("expected precondition error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_message_headers() {
        let outgoing = mail(Some("hi"), Some("<p>hi</p>"));
        let message = build_message(&account(), &outgoing, "<id@example.com>").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Ada Lovelace"));
        assert!(raw.contains("<ada@example.com>"));
        assert!(raw.contains("a@x.com, b@x.com"));
        assert!(raw.contains("Subject: Application for SRE Position"));
        assert!(raw.contains("Message-ID: <id@example.com>"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_attachment_included() {
        let mut outgoing = mail(None, Some("<p>see attached</p>"));
        outgoing.attachment = Some(MailAttachment {
            file_name: "resume.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            bytes: b"%PDF-1.4".to_vec(),
        });
        let message = build_message(&account(), &outgoing, "<id@example.com>").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("resume.pdf"));
        assert!(raw.contains("application/pdf"));
    }

    #[test]
    fn test_empty_body_rejected() {
        let err = build_message(&account(), &mail(None, None), "<id@example.com>").unwrap_err();
        assert!(matches!(err, MailError::EmptyBody));
        assert!(matches!(AppError::from(err), AppError::Validation(_)));
    }

    #[test]
    fn test_message_id_uses_sender_domain() {
        let id = new_message_id("ada@example.com");
        assert!(id.starts_with('<'));
        assert!(id.ends_with("@example.com>"));
    }

    #[test]
    fn test_token_failure_is_mail_error() {
        let err: AppError = MailError::Token("invalid_grant".to_string()).into();
        assert!(matches!(err, AppError::Mail(_)));
    }
}
