//! Axum route handlers for register / login / logout / current user.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{
    expired_session_cookie, hash_password, session_cookie, verify_password, AuthUser,
    SESSION_COOKIE,
};
use crate::errors::AppError;
use crate::models::user::{NewUser, UserRow, UserView};
use crate::state::AppState;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            return Err(AppError::Validation(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if !EmailAddress::is_valid(self.email.trim()) {
            return Err(AppError::Validation("Invalid email address".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<UserView>), AppError> {
    request.validate()?;
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    if state.storage.find_user_by_username(&username).await?.is_some() {
        return Err(AppError::Validation("Username already exists".to_string()));
    }
    if state.storage.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("Email already exists".to_string()));
    }

    let user = state
        .storage
        .create_user(NewUser {
            username,
            password_hash: hash_password(&request.password)?,
            email,
            name: request.name.trim().to_string(),
        })
        .await?;
    info!("Registered user {} ({})", user.id, user.username);

    let jar = start_session(&state, jar, &user).await?;
    Ok((StatusCode::CREATED, jar, Json(UserView::basic(&user))))
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<UserView>), AppError> {
    let user = state
        .storage
        .find_user_by_username(request.username.trim())
        .await?
        .filter(|u| verify_password(&request.password, &u.password_hash))
        .ok_or(AppError::Unauthorized)?;

    info!("User {} logged in", user.id);
    let jar = start_session(&state, jar, &user).await?;
    Ok((jar, Json(UserView::basic(&user))))
}

/// POST /api/auth/logout
///
/// Idempotent: a missing or stale cookie still gets a cleared cookie back.
pub async fn handle_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), AppError> {
    if let Some(session_id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| uuid::Uuid::parse_str(c.value()).ok())
    {
        state.storage.delete_session(session_id).await?;
    }
    Ok((
        jar.remove(expired_session_cookie()),
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

/// GET /api/auth/user
pub async fn handle_current_user(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserView>, AppError> {
    let user = auth.load(&state).await?;
    Ok(Json(UserView::with_keys(&user)))
}

async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &UserRow,
) -> Result<CookieJar, AppError> {
    let ttl_hours = state.config.session_ttl_hours;
    let expires_at = Utc::now() + Duration::hours(ttl_hours);
    let session_id = state.storage.create_session(user.id, expires_at).await?;
    Ok(jar.add(session_cookie(
        session_id,
        ttl_hours,
        state.config.secure_cookies,
    )))
}
