mod analytics;
mod auth;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod mail;
mod models;
mod recruiter;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{spawn_session_sweeper, SESSION_SWEEP_INTERVAL};
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::mail::{FixedDelay, GmailMailer};
use crate::recruiter::ApolloClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::{PgStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Outreach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create upload dir {}", config.upload_dir.display()))?;
    info!("Uploads staged under {}", config.upload_dir.display());

    // One HTTP client shared by the Gemini and Apollo integrations
    let http = reqwest::Client::new();
    let llm = GeminiClient::new(http.clone(), config.gemini_base_url.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let contacts = ApolloClient::new(http, config.apollo_base_url.clone());

    let mailer = GmailMailer::from_config(&config)?;
    info!(
        "Mail transport: {} (send delay {:?})",
        config.smtp_host, config.send_delay
    );

    let storage: Arc<dyn Storage> = Arc::new(PgStorage::new(db));
    spawn_session_sweeper(storage.clone(), SESSION_SWEEP_INTERVAL);

    let state = AppState {
        storage,
        llm: Arc::new(llm),
        contacts: Arc::new(contacts),
        mailer: Arc::new(mailer),
        pacer: Arc::new(FixedDelay(config.send_delay)),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
