// Outreach drafting: job parsing and cover letter generation.
// All LLM calls go through llm_client; nothing here talks to Gemini directly.

pub mod cover_letter;
pub mod handlers;
pub mod job_parser;
pub mod prompts;
