pub mod analytics;
pub mod applications;
pub mod health;
pub mod resumes;
pub mod templates;
pub mod user;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::generation::handlers as generation;
use crate::mail::handlers as mail;
use crate::recruiter::handlers as recruiter;
use crate::state::AppState;

/// Largest accepted request body, resume uploads included.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session auth
        .route("/api/auth/register", post(auth::handle_register))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/logout", post(auth::handle_logout))
        .route("/api/auth/user", get(auth::handle_current_user))
        // Account settings
        .route("/api/user", patch(user::handle_update_user))
        .route("/api/add/token", post(user::handle_add_token))
        // Applications
        .route(
            "/api/applications",
            get(applications::handle_list).post(applications::handle_create),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get)
                .patch(applications::handle_update)
                .delete(applications::handle_delete),
        )
        .route(
            "/api/applications/:id/events",
            get(applications::handle_events),
        )
        // Templates
        .route(
            "/api/templates",
            get(templates::handle_list).post(templates::handle_create),
        )
        .route(
            "/api/templates/:id",
            patch(templates::handle_update).delete(templates::handle_delete),
        )
        // Resumes
        .route(
            "/api/resumes",
            get(resumes::handle_list).post(resumes::handle_upload),
        )
        .route("/api/upload-resume", post(resumes::handle_upload))
        .route(
            "/api/resumes/:id",
            patch(resumes::handle_update).delete(resumes::handle_delete),
        )
        .route("/api/analytics", get(analytics::handle_summary))
        // Drafting
        .route("/api/parse-job", post(generation::handle_parse_job))
        .route(
            "/api/generate-cover-letter",
            post(generation::handle_generate_cover_letter),
        )
        .route("/api/find-recruiter", post(recruiter::handle_find_recruiter))
        // Sending
        .route("/api/send-email", post(mail::handle_mark_sent))
        .route("/api/send/mail", post(mail::handle_send_mail))
        .route("/api/send/batch", post(mail::handle_send_batch))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
