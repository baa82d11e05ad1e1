use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Storage, StorageResult};
use crate::models::analytics::{EmailEventRow, NewEmailEvent};
use crate::models::application::{ApplicationUpdate, JobApplicationRow, NewApplication};
use crate::models::resume::{NewResume, ResumeRow};
use crate::models::template::{EmailTemplateRow, NewTemplate, TemplateUpdate};
use crate::models::user::{NewUser, UserRow, UserUpdate};

/// `Storage` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<UserRow> {
        sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash, email, name)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<Option<UserRow>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                apollo_api_key = COALESCE($4, apollo_api_key),
                gemini_api_key = COALESCE($5, gemini_api_key),
                gmail_access_token = COALESCE($6, gmail_access_token),
                gmail_refresh_token = COALESCE($7, gmail_refresh_token),
                gmail_connected = COALESCE($8, gmail_connected)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.email)
        .bind(update.apollo_api_key)
        .bind(update.gemini_api_key)
        .bind(update.gmail_access_token)
        .bind(update.gmail_refresh_token)
        .bind(update.gmail_connected)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<Uuid> {
        let session_id = Uuid::new_v4();
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(session_id)
    }

    async fn session_user(&self, session_id: Uuid) -> StorageResult<Option<Uuid>> {
        sqlx::query_scalar("SELECT user_id FROM sessions WHERE id = $1 AND expires_at > now()")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_session(&self, session_id: Uuid) -> StorageResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_applications(&self, user_id: Uuid) -> StorageResult<Vec<JobApplicationRow>> {
        sqlx::query_as::<_, JobApplicationRow>(
            "SELECT * FROM job_applications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_application(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<JobApplicationRow>> {
        sqlx::query_as::<_, JobApplicationRow>(
            "SELECT * FROM job_applications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_application(
        &self,
        user_id: Uuid,
        application: NewApplication,
    ) -> StorageResult<JobApplicationRow> {
        sqlx::query_as::<_, JobApplicationRow>(
            r#"
            INSERT INTO job_applications
                (user_id, company, position, job_description, recruiter_name,
                 recruiter_email, recruiter_title, status, email_subject,
                 email_content, cover_letter, location, scheduled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&application.company)
        .bind(&application.position)
        .bind(&application.job_description)
        .bind(&application.recruiter_name)
        .bind(&application.recruiter_email)
        .bind(&application.recruiter_title)
        .bind(application.status.as_str())
        .bind(&application.email_subject)
        .bind(&application.email_content)
        .bind(&application.cover_letter)
        .bind(&application.location)
        .bind(application.scheduled_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_application(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: ApplicationUpdate,
    ) -> StorageResult<Option<JobApplicationRow>> {
        sqlx::query_as::<_, JobApplicationRow>(
            r#"
            UPDATE job_applications SET
                company = COALESCE($3, company),
                position = COALESCE($4, position),
                job_description = COALESCE($5, job_description),
                recruiter_name = COALESCE($6, recruiter_name),
                recruiter_email = COALESCE($7, recruiter_email),
                recruiter_title = COALESCE($8, recruiter_title),
                status = COALESCE($9, status),
                email_subject = COALESCE($10, email_subject),
                email_content = COALESCE($11, email_content),
                cover_letter = COALESCE($12, cover_letter),
                location = COALESCE($13, location),
                scheduled_at = COALESCE($14, scheduled_at),
                sent_at = COALESCE($15, sent_at)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.company)
        .bind(update.position)
        .bind(update.job_description)
        .bind(update.recruiter_name)
        .bind(update.recruiter_email)
        .bind(update.recruiter_title)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.email_subject)
        .bind(update.email_content)
        .bind(update.cover_letter)
        .bind(update.location)
        .bind(update.scheduled_at)
        .bind(update.sent_at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_application(&self, user_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_templates(&self, user_id: Uuid) -> StorageResult<Vec<EmailTemplateRow>> {
        sqlx::query_as::<_, EmailTemplateRow>(
            "SELECT * FROM email_templates WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_template(
        &self,
        user_id: Uuid,
        template: NewTemplate,
    ) -> StorageResult<EmailTemplateRow> {
        let mut tx = self.pool.begin().await?;
        if template.is_default {
            clear_default(&mut tx, "email_templates", user_id).await?;
        }
        let row = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            INSERT INTO email_templates (user_id, name, subject, content, is_default)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.content)
        .bind(template.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn update_template(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: TemplateUpdate,
    ) -> StorageResult<Option<EmailTemplateRow>> {
        let mut tx = self.pool.begin().await?;
        if update.is_default == Some(true) {
            clear_default(&mut tx, "email_templates", user_id).await?;
        }
        let row = sqlx::query_as::<_, EmailTemplateRow>(
            r#"
            UPDATE email_templates SET
                name = COALESCE($3, name),
                subject = COALESCE($4, subject),
                content = COALESCE($5, content),
                is_default = COALESCE($6, is_default)
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.name)
        .bind(update.subject)
        .bind(update.content)
        .bind(update.is_default)
        .fetch_optional(&mut *tx)
        .await?;
        // Missing row: roll back so the cleared default is restored
        if row.is_some() {
            tx.commit().await?;
        }
        Ok(row)
    }

    async fn delete_template(&self, user_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM email_templates WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_resumes(&self, user_id: Uuid) -> StorageResult<Vec<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_resume(&self, user_id: Uuid, resume: NewResume) -> StorageResult<ResumeRow> {
        let mut tx = self.pool.begin().await?;
        if resume.is_default {
            clear_default(&mut tx, "resumes", user_id).await?;
        }
        let row = sqlx::query_as::<_, ResumeRow>(
            r#"
            INSERT INTO resumes (user_id, file_name, file_path, is_default)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&resume.file_name)
        .bind(&resume.file_path)
        .bind(resume.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn set_resume_default(
        &self,
        user_id: Uuid,
        id: Uuid,
        is_default: bool,
    ) -> StorageResult<Option<ResumeRow>> {
        let mut tx = self.pool.begin().await?;
        if is_default {
            clear_default(&mut tx, "resumes", user_id).await?;
        }
        let row = sqlx::query_as::<_, ResumeRow>(
            "UPDATE resumes SET is_default = $3 WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(is_default)
        .fetch_optional(&mut *tx)
        .await?;
        if row.is_some() {
            tx.commit().await?;
        }
        Ok(row)
    }

    async fn delete_resume(&self, user_id: Uuid, id: Uuid) -> StorageResult<Option<ResumeRow>> {
        sqlx::query_as::<_, ResumeRow>(
            "DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_events(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> StorageResult<Vec<EmailEventRow>> {
        sqlx::query_as::<_, EmailEventRow>(
            r#"
            SELECT e.* FROM email_analytics e
            JOIN job_applications a ON a.id = e.application_id
            WHERE e.application_id = $1 AND a.user_id = $2
            ORDER BY e.occurred_at
            "#,
        )
        .bind(application_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn record_event(&self, event: NewEmailEvent) -> StorageResult<EmailEventRow> {
        sqlx::query_as::<_, EmailEventRow>(
            r#"
            INSERT INTO email_analytics (application_id, event, metadata)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(event.application_id)
        .bind(event.event.as_str())
        .bind(&event.metadata)
        .fetch_one(&self.pool)
        .await
    }
}

/// Clears `is_default` on all of a user's rows in `table`.
/// `table` is always a compile-time constant from this module.
async fn clear_default(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    table: &'static str,
    user_id: Uuid,
) -> StorageResult<()> {
    sqlx::query(&format!(
        "UPDATE {table} SET is_default = FALSE WHERE user_id = $1"
    ))
    .bind(user_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
