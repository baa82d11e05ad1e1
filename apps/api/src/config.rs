use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_APOLLO_BASE_URL: &str = "https://api.apollo.io";
const DEFAULT_GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub google_auth_url: String,
    pub google_token_url: String,
    pub smtp_host: String,
    pub gemini_base_url: String,
    pub apollo_base_url: String,
    pub upload_dir: PathBuf,
    /// Pause between independent sends in the multi-recipient flow.
    pub send_delay: Duration,
    pub session_ttl_hours: i64,
    pub secure_cookies: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            google_client_id: require_env("GOOGLE_CLIENT_ID")?,
            google_client_secret: require_env("GOOGLE_CLIENT_SECRET")?,
            google_auth_url: env_or("GOOGLE_AUTH_URL", DEFAULT_GOOGLE_AUTH_URL),
            google_token_url: env_or("GOOGLE_TOKEN_URL", DEFAULT_GOOGLE_TOKEN_URL),
            smtp_host: env_or("SMTP_HOST", DEFAULT_SMTP_HOST),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            apollo_base_url: env_or("APOLLO_BASE_URL", DEFAULT_APOLLO_BASE_URL),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            send_delay: Duration::from_secs(
                env_or("SEND_DELAY_SECS", "10")
                    .parse::<u64>()
                    .context("SEND_DELAY_SECS must be a whole number of seconds")?,
            ),
            session_ttl_hours: env_or("SESSION_TTL_HOURS", "24")
                .parse::<i64>()
                .context("SESSION_TTL_HOURS must be an integer")?,
            secure_cookies: env_or("COOKIE_SECURE", "false")
                .parse::<bool>()
                .context("COOKIE_SECURE must be true or false")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Configuration for router tests. Nothing here is dialled.
    pub fn for_tests(upload_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://localhost/outreach_test".to_string(),
            google_client_id: "test-client".to_string(),
            google_client_secret: "test-secret".to_string(),
            google_auth_url: DEFAULT_GOOGLE_AUTH_URL.to_string(),
            google_token_url: DEFAULT_GOOGLE_TOKEN_URL.to_string(),
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            apollo_base_url: DEFAULT_APOLLO_BASE_URL.to_string(),
            upload_dir,
            send_delay: Duration::from_secs(10),
            session_ttl_hours: 24,
            secure_cookies: false,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
