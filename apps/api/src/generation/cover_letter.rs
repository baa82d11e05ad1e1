//! Cover Letter Generation: letter draft plus a best-effort analysis.
//!
//! Flow: key check → letter call (fatal on failure) → analysis call
//! (non-fatal; degrades to an empty analysis) → deterministic subject.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::job_parser::ParsedJob;
use crate::generation::prompts::{ANALYSIS_PROMPT_TEMPLATE, COVER_LETTER_PROMPT_TEMPLATE};
use crate::llm_client::extract::{extract_json, lenient_number, null_as_default, strip_code_fences};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{require_api_key, CompletionModel, LlmError};

/// The slice of the sender's profile the letter prompt uses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFragment {
    /// e.g. "Backend engineer with 6 years of Rust"
    pub title: Option<String>,
    /// Overrides the account display name in the closing signature.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    pub job_description: String,
    pub parsed_job: ParsedJob,
    #[serde(default)]
    pub user_profile: ProfileFragment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personalization {
    #[serde(default)]
    pub insight: String,
}

/// Feedback about a generated letter. `Default` serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterAnalysis {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub strengths: Vec<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub suggestions: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub match_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_personalization",
        skip_serializing_if = "Option::is_none"
    )]
    pub personalization: Option<Personalization>,
}

/// Accepts `{"insight": "..."}` or a bare string.
fn lenient_personalization<'de, D>(deserializer: D) -> Result<Option<Personalization>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(insight) if !insight.trim().is_empty() => Some(Personalization { insight }),
        Value::Object(mut map) => match map.remove("insight") {
            Some(Value::String(insight)) => Some(Personalization { insight }),
            _ => Some(Personalization::default()),
        },
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterDraft {
    pub cover_letter: String,
    pub analysis: CoverLetterAnalysis,
    pub subject: String,
}

/// `Application for <title> Position`
pub fn subject_for(job: &ParsedJob) -> String {
    format!("Application for {} Position", job.title)
}

/// Runs both LLM calls. Only the letter call can fail the request.
pub async fn generate_cover_letter(
    llm: &dyn CompletionModel,
    api_key: Option<&str>,
    account_name: &str,
    request: &CoverLetterRequest,
) -> Result<CoverLetterDraft, AppError> {
    let api_key = require_api_key(api_key)?;

    let signer = request
        .user_profile
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(account_name);

    let prompt = build_letter_prompt(request, signer);
    let raw = llm.complete(api_key, &prompt).await?;
    let cover_letter = normalize_letter(&raw);
    if cover_letter.is_empty() {
        return Err(LlmError::EmptyContent.into());
    }
    info!(
        "Generated cover letter for {:?} at {:?} ({} chars)",
        request.parsed_job.title,
        request.parsed_job.company,
        cover_letter.len()
    );

    let analysis = match analyze(llm, api_key, &cover_letter, &request.parsed_job).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Cover letter analysis failed, returning empty analysis: {e}");
            CoverLetterAnalysis::default()
        }
    };

    Ok(CoverLetterDraft {
        cover_letter,
        analysis,
        subject: subject_for(&request.parsed_job),
    })
}

async fn analyze(
    llm: &dyn CompletionModel,
    api_key: &str,
    cover_letter: &str,
    job: &ParsedJob,
) -> Result<CoverLetterAnalysis, LlmError> {
    let prompt = ANALYSIS_PROMPT_TEMPLATE
        .replace("{cover_letter}", cover_letter)
        .replace("{skills}", &job.skills_line())
        .replace("{json_only}", JSON_ONLY_INSTRUCTION);
    let text = llm.complete(api_key, &prompt).await?;
    extract_json(&text)
}

fn build_letter_prompt(request: &CoverLetterRequest, signer: &str) -> String {
    let job = &request.parsed_job;
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{title}", &job.title)
        .replace("{company}", &job.company)
        .replace("{skills}", &job.skills_line())
        .replace("{experience}", job.experience.as_deref().unwrap_or("not specified"))
        .replace("{location}", job.location.as_deref().unwrap_or("not specified"))
        .replace(
            "{sender_title}",
            request.user_profile.title.as_deref().unwrap_or("not specified"),
        )
        .replace("{job_description}", &request.job_description)
        .replace("{signer}", signer)
}

/// Trims, strips fences, and makes sure the letter is a single `<p>` block.
fn normalize_letter(raw: &str) -> String {
    let text = strip_code_fences(raw);
    if text.is_empty() || text.starts_with("<p") {
        text.to_string()
    } else {
        format!("<p>{text}</p>")
    }
}
