//! Best-effort structured extraction from free-text model replies.
//!
//! Models wrap JSON in prose or code fences. The contract here: take the
//! span from the first `{` to the last `}` after it, then parse that span.
//! No span → `LlmError::NoJsonObject`. Bad JSON in the span → `LlmError::Parse`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::LlmError;

/// Returns the greedy brace-delimited span, if any.
pub fn json_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Extracts and deserializes the JSON object embedded in `text`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let span = json_object_span(text).ok_or(LlmError::NoJsonObject)?;
    serde_json::from_str(span).map_err(LlmError::Parse)
}

/// Strips ```lang ... ``` fences from a reply, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag line (```json, ```html, ...)
    let rest = match rest.find('\n') {
        Some(idx) if !rest[..idx].contains(' ') => &rest[idx + 1..],
        _ => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// `null` reads as the field's default, same as a missing field.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A number, or a string holding one (`"85"`, `"85%"`). Anything else is `None`.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    })
}
