//! LLM Client: the single point of entry for all Gemini calls.
//!
//! ARCHITECTURAL RULE: No other module may call the Gemini API directly.
//! All LLM interactions go through `CompletionModel`.
//!
//! Every call is a single attempt. Callers decide whether a failure is fatal.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

pub mod extract;
pub mod prompts;

/// The model used for all LLM calls. Hardcoded to prevent drift.
pub const MODEL: &str = "gemini-2.0-flash";

/// Gemini keys are issued with this prefix; anything else is rejected locally.
const GEMINI_KEY_PREFIX: &str = "AIza";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("No valid content in model response")]
    EmptyContent,

    #[error("No JSON object found in model response")]
    NoJsonObject,

    #[error("Failed to parse extracted JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Api { status, body } => AppError::Upstream {
                service: "Gemini",
                status: Some(status),
                body,
            },
            LlmError::Http(e) => AppError::Upstream {
                service: "Gemini",
                status: e.status().map(|s| s.as_u16()),
                body: e.to_string(),
            },
            other => AppError::Llm(other.to_string()),
        }
    }
}

/// Prompt in, free text out.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, LlmError>;
}

/// Rejects a missing or obviously malformed Gemini key before any remote call.
pub fn require_api_key(key: Option<&str>) -> Result<&str, AppError> {
    match key.map(str::trim) {
        Some(k) if k.starts_with(GEMINI_KEY_PREFIX) => Ok(k),
        _ => Err(AppError::Precondition(
            "Gemini API key not configured or invalid".to_string(),
        )),
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

/// Gemini `generateContent` client. The API key travels as the `key` query parameter.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            MODEL
        )
    }
}

#[async_trait]
impl CompletionModel for GeminiClient {
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text().ok_or(LlmError::EmptyContent)?;

        debug!("Gemini call succeeded: {} chars", text.len());
        Ok(text.to_string())
    }
}


#[cfg(test)]
pub mod testing {
    //! Scripted `CompletionModel` for pipeline and router tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{CompletionModel, LlmError};

    pub enum Reply {
        Text(String),
        Status(u16, String),
    }

    /// Answers calls in order with the scripted replies; records every prompt.
    #[derive(Default)]
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Reply>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        async fn complete(&self, _api_key: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::Status(status, body)) => Err(LlmError::Api { status, body }),
                None => Err(LlmError::EmptyContent),
            }
        }
    }
}
