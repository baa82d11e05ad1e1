use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionModel;
use crate::mail::{Mailer, SendPacer};
use crate::recruiter::ContactSearch;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every remote collaborator sits behind a trait object so tests can swap it out.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub llm: Arc<dyn CompletionModel>,
    pub contacts: Arc<dyn ContactSearch>,
    pub mailer: Arc<dyn Mailer>,
    /// Pause policy between batch sends. Production: `FixedDelay(SEND_DELAY_SECS)`.
    pub pacer: Arc<dyn SendPacer>,
    pub config: Config,
}
