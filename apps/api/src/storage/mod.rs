//! Repository interface over the relational store.
//!
//! Every entity except `users` is scoped by the owning user id; a row that
//! belongs to someone else is indistinguishable from a missing row.
//!
//! `AppState` carries an `Arc<dyn Storage>`; production uses `PgStorage`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::analytics::{EmailEventRow, NewEmailEvent};
use crate::models::application::{ApplicationUpdate, JobApplicationRow, NewApplication};
use crate::models::resume::{NewResume, ResumeRow};
use crate::models::template::{EmailTemplateRow, NewTemplate, TemplateUpdate};
use crate::models::user::{NewUser, UserRow, UserUpdate};

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStorage;

pub type StorageResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<UserRow>>;
    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>>;
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRow>>;
    async fn create_user(&self, user: NewUser) -> StorageResult<UserRow>;
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<Option<UserRow>>;

    // Sessions
    async fn create_session(&self, user_id: Uuid, expires_at: DateTime<Utc>)
        -> StorageResult<Uuid>;
    /// The session's user, if the session exists and has not expired.
    async fn session_user(&self, session_id: Uuid) -> StorageResult<Option<Uuid>>;
    async fn delete_session(&self, session_id: Uuid) -> StorageResult<()>;
    /// Drops every expired session; returns how many went.
    async fn purge_expired_sessions(&self) -> StorageResult<u64>;

    // Job applications, newest first
    async fn list_applications(&self, user_id: Uuid) -> StorageResult<Vec<JobApplicationRow>>;
    async fn get_application(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<JobApplicationRow>>;
    async fn create_application(
        &self,
        user_id: Uuid,
        application: NewApplication,
    ) -> StorageResult<JobApplicationRow>;
    async fn update_application(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: ApplicationUpdate,
    ) -> StorageResult<Option<JobApplicationRow>>;
    async fn delete_application(&self, user_id: Uuid, id: Uuid) -> StorageResult<bool>;

    // Email templates
    async fn list_templates(&self, user_id: Uuid) -> StorageResult<Vec<EmailTemplateRow>>;
    async fn create_template(
        &self,
        user_id: Uuid,
        template: NewTemplate,
    ) -> StorageResult<EmailTemplateRow>;
    async fn update_template(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: TemplateUpdate,
    ) -> StorageResult<Option<EmailTemplateRow>>;
    async fn delete_template(&self, user_id: Uuid, id: Uuid) -> StorageResult<bool>;

    // Resumes
    async fn list_resumes(&self, user_id: Uuid) -> StorageResult<Vec<ResumeRow>>;
    async fn create_resume(&self, user_id: Uuid, resume: NewResume) -> StorageResult<ResumeRow>;
    async fn set_resume_default(
        &self,
        user_id: Uuid,
        id: Uuid,
        is_default: bool,
    ) -> StorageResult<Option<ResumeRow>>;
    /// Returns the deleted row so the caller can remove the stored file.
    async fn delete_resume(&self, user_id: Uuid, id: Uuid) -> StorageResult<Option<ResumeRow>>;

    // Analytics events
    async fn list_events(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> StorageResult<Vec<EmailEventRow>>;
    async fn record_event(&self, event: NewEmailEvent) -> StorageResult<EmailEventRow>;
}
