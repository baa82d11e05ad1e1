//! Session authentication.
//!
//! A session is a row keyed by a random UUID that travels in the `sid`
//! cookie. Handlers never read the cookie themselves: they take an
//! `AuthUser` extractor and pass the identity down explicitly.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::storage::Storage;

pub mod handlers;

pub const SESSION_COOKIE: &str = "sid";

/// The authenticated caller. Obtained only through the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub session_id: Uuid,
}

impl AuthUser {
    /// Loads the caller's row. A session whose user vanished is unauthorized.
    pub async fn load(&self, state: &AppState) -> Result<UserRow, AppError> {
        state
            .storage
            .get_user(self.user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .and_then(|c| Uuid::parse_str(c.value()).ok())
            .ok_or(AppError::Unauthorized)?;

        let user_id = state
            .storage
            .session_user(session_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            session_id,
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// False for a wrong password and for an unreadable stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

pub fn session_cookie(session_id: Uuid, ttl_hours: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::hours(ttl_hours))
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// How often expired session rows are swept.
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Deletes expired sessions. Failures are logged and retried next sweep.
pub async fn sweep_expired_sessions(storage: &dyn Storage) {
    match storage.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(n) => debug!("Purged {n} expired sessions"),
        Err(e) => warn!("Session purge failed: {e}"),
    }
}

/// Sweeps on a fixed interval for the life of the process.
pub fn spawn_session_sweeper(storage: Arc<dyn Storage>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            sweep_expired_sessions(storage.as_ref()).await;
        }
    })
}
