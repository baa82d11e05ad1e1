//! Job Parser: extracts a structured job from a raw job description.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompts::JOB_PARSE_PROMPT_TEMPLATE;
use crate::llm_client::extract::{extract_json, null_as_default};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{require_api_key, CompletionModel};

/// Structured view of a job description.
/// Every field tolerates being absent or `null` in the model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJob {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub salary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub requirements: Vec<String>,
}

impl ParsedJob {
    pub fn skills_line(&self) -> String {
        self.skills.join(", ")
    }
}

/// Models answer `"experience": 3` as often as `"3+ years"`; accept both.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Parses a job description with a single LLM call.
///
/// Rejects before the remote call when the text is empty or the key is
/// unusable. A reply without a JSON object, or with malformed JSON, is an
/// error; partial data is never returned.
pub async fn parse_job(
    llm: &dyn CompletionModel,
    api_key: Option<&str>,
    job_description: &str,
) -> Result<ParsedJob, AppError> {
    if job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Job description is required".to_string(),
        ));
    }
    let api_key = require_api_key(api_key)?;

    let prompt = JOB_PARSE_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{json_only}", JSON_ONLY_INSTRUCTION);

    let text = llm.complete(api_key, &prompt).await?;
    let parsed: ParsedJob = extract_json(&text)?;

    info!(
        "Parsed job: title={:?} company={:?} skills={}",
        parsed.title,
        parsed.company,
        parsed.skills.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const KEY: &str = "AIzaTestKey";

    const BACKEND_JD: &str = r#"
        Senior Backend Engineer at Acme Corp (Remote, US)
        You will build payment APIs in Rust and Go.
        Requirements: 5+ years experience, distributed systems, PostgreSQL.
        Salary: $150k-180k.
    "#;

    struct CannedModel {
        reply: Result<String, (u16, String)>,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn status(status: u16, body: &str) -> Self {
            Self {
                reply: Err((status, body.to_string())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for CannedModel {
        async fn complete(&self, _api_key: &str, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err((status, body)) => Err(LlmError::Api {
                    status: *status,
                    body: body.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_parses_object_wrapped_in_prose() {
        let model = CannedModel::ok(
            r#"Here is the parsed job:
            {
              "title": "Senior Backend Engineer",
              "company": "Acme Corp",
              "skills": ["Rust", "Go", "PostgreSQL"],
              "experience": "5+ years",
              "location": "Remote, US",
              "salary": "$150k-180k",
              "requirements": ["Distributed systems"]
            }"#,
        );

        let parsed = parse_job(&model, Some(KEY), BACKEND_JD).await.unwrap();
        assert_eq!(parsed.title, "Senior Backend Engineer");
        assert_eq!(parsed.company, "Acme Corp");
        assert_eq!(parsed.skills, vec!["Rust", "Go", "PostgreSQL"]);
        assert_eq!(parsed.salary.as_deref(), Some("$150k-180k"));
        assert_eq!(parsed.skills_line(), "Rust, Go, PostgreSQL");
    }

    #[tokio::test]
    async fn test_reply_without_object_is_rejected() {
        let model = CannedModel::ok("Sorry, I cannot help with that job description.");
        let err = parse_job(&model, Some(KEY), BACKEND_JD).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_malformed_object_is_rejected() {
        let model = CannedModel::ok(r#"{"title": "Engineer", "skills": [}"#);
        let err = parse_job(&model, Some(KEY), BACKEND_JD).await.unwrap_err();
        match err {
            AppError::Llm(msg) => assert!(msg.contains("parse")),
            other => panic!("expected LLM error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_remote_status_is_surfaced() {
        let model = CannedModel::status(400, "API key not valid");
        let err = parse_job(&model, Some(KEY), BACKEND_JD).await.unwrap_err();
        match err {
            AppError::Upstream { status, body, .. } => {
                assert_eq!(status, Some(400));
                assert_eq!(body, "API key not valid");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_remote_call() {
        let model = CannedModel::ok("{}");
        let err = parse_job(&model, Some("not-a-key"), BACKEND_JD)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Precondition(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        let err = parse_job(&model, None, BACKEND_JD).await.unwrap_err();
        assert!(matches!(err, AppError::Precondition(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_description_is_validation_error() {
        let model = CannedModel::ok("{}");
        let err = parse_job(&model, Some(KEY), "   ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_numeric_experience_is_accepted() {
        let parsed: ParsedJob =
            serde_json::from_str(r#"{"title": "SRE", "experience": 3, "salary": null}"#).unwrap();
        assert_eq!(parsed.experience.as_deref(), Some("3"));
        assert!(parsed.salary.is_none());
        assert!(parsed.skills.is_empty());
    }

    #[tokio::test]
    async fn test_null_company_and_skills_are_empty() {
        let model = CannedModel::ok(
            r#"{"title": "SRE", "company": null, "skills": null, "experience": null,
                "location": "Berlin", "salary": null, "requirements": null}"#,
        );
        let parsed = parse_job(&model, Some(KEY), BACKEND_JD).await.unwrap();
        assert_eq!(parsed.title, "SRE");
        assert!(parsed.company.is_empty());
        assert!(parsed.skills.is_empty());
        assert!(parsed.requirements.is_empty());
        assert_eq!(parsed.location.as_deref(), Some("Berlin"));
    }
}
