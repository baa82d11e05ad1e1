// Shared prompt fragments. Each module that calls the LLM keeps its own
// prompts.rs alongside it and reuses these.

/// Appended to every prompt whose reply is run through `extract::extract_json`.
pub const JSON_ONLY_INSTRUCTION: &str = "Respond with ONLY a valid JSON object. \
    Do not include any text outside the JSON object. \
    Do not include explanations or apologies.";
