//! In-memory `Storage` double for handler and pipeline tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Storage, StorageResult};
use crate::models::analytics::{EmailEventRow, NewEmailEvent};
use crate::models::application::{ApplicationUpdate, JobApplicationRow, NewApplication};
use crate::models::resume::{NewResume, ResumeRow};
use crate::models::template::{EmailTemplateRow, NewTemplate, TemplateUpdate};
use crate::models::user::{NewUser, UserRow, UserUpdate};

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    sessions: Vec<(Uuid, Uuid, DateTime<Utc>)>,
    applications: Vec<JobApplicationRow>,
    templates: Vec<EmailTemplateRow>,
    resumes: Vec<ResumeRow>,
    events: Vec<EmailEventRow>,
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
    fail_application_updates: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EmailEventRow> {
        self.tables.lock().unwrap().events.clone()
    }

    /// Makes every later `update_application` return a database error.
    pub fn fail_application_updates(&self) {
        self.fail_application_updates.store(true, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: Uuid) -> StorageResult<Option<UserRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StorageResult<Option<UserRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<UserRow> {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            name: user.name,
            gmail_connected: false,
            gmail_access_token: None,
            gmail_refresh_token: None,
            apollo_api_key: None,
            gemini_api_key: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().users.push(row.clone());
        Ok(row)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> StorageResult<Option<UserRow>> {
        let mut t = self.tables.lock().unwrap();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        set(&mut user.name, update.name);
        set(&mut user.email, update.email);
        set_opt(&mut user.apollo_api_key, update.apollo_api_key);
        set_opt(&mut user.gemini_api_key, update.gemini_api_key);
        set_opt(&mut user.gmail_access_token, update.gmail_access_token);
        set_opt(&mut user.gmail_refresh_token, update.gmail_refresh_token);
        set(&mut user.gmail_connected, update.gmail_connected);
        Ok(Some(user.clone()))
    }

    async fn create_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<Uuid> {
        let id = Uuid::new_v4();
        self.tables
            .lock()
            .unwrap()
            .sessions
            .push((id, user_id, expires_at));
        Ok(id)
    }

    async fn session_user(&self, session_id: Uuid) -> StorageResult<Option<Uuid>> {
        let t = self.tables.lock().unwrap();
        let now = Utc::now();
        Ok(t
            .sessions
            .iter()
            .find(|(id, _, expires)| *id == session_id && *expires > now)
            .map(|(_, user_id, _)| *user_id))
    }

    async fn delete_session(&self, session_id: Uuid) -> StorageResult<()> {
        self.tables
            .lock()
            .unwrap()
            .sessions
            .retain(|(id, _, _)| *id != session_id);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> StorageResult<u64> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let before = t.sessions.len();
        t.sessions.retain(|(_, _, expires)| *expires > now);
        Ok((before - t.sessions.len()) as u64)
    }

    async fn list_applications(&self, user_id: Uuid) -> StorageResult<Vec<JobApplicationRow>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<_> = t
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_application(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<JobApplicationRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .applications
            .iter()
            .find(|a| a.id == id && a.user_id == user_id)
            .cloned())
    }

    async fn create_application(
        &self,
        user_id: Uuid,
        application: NewApplication,
    ) -> StorageResult<JobApplicationRow> {
        let row = JobApplicationRow {
            id: Uuid::new_v4(),
            user_id,
            company: application.company,
            position: application.position,
            job_description: application.job_description,
            recruiter_name: application.recruiter_name,
            recruiter_email: application.recruiter_email,
            recruiter_title: application.recruiter_title,
            status: application.status.as_str().to_string(),
            email_subject: application.email_subject,
            email_content: application.email_content,
            cover_letter: application.cover_letter,
            location: application.location,
            scheduled_at: application.scheduled_at,
            sent_at: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().applications.push(row.clone());
        Ok(row)
    }

    async fn update_application(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: ApplicationUpdate,
    ) -> StorageResult<Option<JobApplicationRow>> {
        if self.fail_application_updates.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut t = self.tables.lock().unwrap();
        let Some(app) = t
            .applications
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user_id)
        else {
            return Ok(None);
        };
        set(&mut app.company, update.company);
        set(&mut app.position, update.position);
        set(&mut app.job_description, update.job_description);
        set_opt(&mut app.recruiter_name, update.recruiter_name);
        set_opt(&mut app.recruiter_email, update.recruiter_email);
        set_opt(&mut app.recruiter_title, update.recruiter_title);
        set(&mut app.status, update.status.map(|s| s.as_str().to_string()));
        set_opt(&mut app.email_subject, update.email_subject);
        set_opt(&mut app.email_content, update.email_content);
        set_opt(&mut app.cover_letter, update.cover_letter);
        set_opt(&mut app.location, update.location);
        set_opt(&mut app.scheduled_at, update.scheduled_at);
        set_opt(&mut app.sent_at, update.sent_at);
        Ok(Some(app.clone()))
    }

    async fn delete_application(&self, user_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.applications.len();
        t.applications
            .retain(|a| !(a.id == id && a.user_id == user_id));
        let deleted = t.applications.len() < before;
        if deleted {
            t.events.retain(|e| e.application_id != id);
        }
        Ok(deleted)
    }

    async fn list_templates(&self, user_id: Uuid) -> StorageResult<Vec<EmailTemplateRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .templates
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_template(
        &self,
        user_id: Uuid,
        template: NewTemplate,
    ) -> StorageResult<EmailTemplateRow> {
        let mut t = self.tables.lock().unwrap();
        if template.is_default {
            for r in t.templates.iter_mut().filter(|r| r.user_id == user_id) {
                r.is_default = false;
            }
        }
        let row = EmailTemplateRow {
            id: Uuid::new_v4(),
            user_id,
            name: template.name,
            subject: template.subject,
            content: template.content,
            is_default: template.is_default,
            created_at: Utc::now(),
        };
        t.templates.push(row.clone());
        Ok(row)
    }

    async fn update_template(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: TemplateUpdate,
    ) -> StorageResult<Option<EmailTemplateRow>> {
        let mut t = self.tables.lock().unwrap();
        if !t.templates.iter().any(|r| r.id == id && r.user_id == user_id) {
            return Ok(None);
        }
        if update.is_default == Some(true) {
            for r in t.templates.iter_mut().filter(|r| r.user_id == user_id) {
                r.is_default = false;
            }
        }
        let row = t
            .templates
            .iter_mut()
            .find(|r| r.id == id)
            .expect("checked above");
        set(&mut row.name, update.name);
        set(&mut row.subject, update.subject);
        set(&mut row.content, update.content);
        set(&mut row.is_default, update.is_default);
        Ok(Some(row.clone()))
    }

    async fn delete_template(&self, user_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.templates.len();
        t.templates.retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(t.templates.len() < before)
    }

    async fn list_resumes(&self, user_id: Uuid) -> StorageResult<Vec<ResumeRow>> {
        let t = self.tables.lock().unwrap();
        Ok(t
            .resumes
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_resume(&self, user_id: Uuid, resume: NewResume) -> StorageResult<ResumeRow> {
        let mut t = self.tables.lock().unwrap();
        if resume.is_default {
            for r in t.resumes.iter_mut().filter(|r| r.user_id == user_id) {
                r.is_default = false;
            }
        }
        let row = ResumeRow {
            id: Uuid::new_v4(),
            user_id,
            file_name: resume.file_name,
            file_path: resume.file_path,
            is_default: resume.is_default,
            created_at: Utc::now(),
        };
        t.resumes.push(row.clone());
        Ok(row)
    }

    async fn set_resume_default(
        &self,
        user_id: Uuid,
        id: Uuid,
        is_default: bool,
    ) -> StorageResult<Option<ResumeRow>> {
        let mut t = self.tables.lock().unwrap();
        if !t.resumes.iter().any(|r| r.id == id && r.user_id == user_id) {
            return Ok(None);
        }
        for r in t.resumes.iter_mut().filter(|r| r.user_id == user_id) {
            if r.id == id {
                r.is_default = is_default;
            } else if is_default {
                r.is_default = false;
            }
        }
        Ok(t.resumes.iter().find(|r| r.id == id).cloned())
    }

    async fn delete_resume(&self, user_id: Uuid, id: Uuid) -> StorageResult<Option<ResumeRow>> {
        let mut t = self.tables.lock().unwrap();
        let idx = t
            .resumes
            .iter()
            .position(|r| r.id == id && r.user_id == user_id);
        Ok(idx.map(|i| t.resumes.remove(i)))
    }

    async fn list_events(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> StorageResult<Vec<EmailEventRow>> {
        let t = self.tables.lock().unwrap();
        let owned = t
            .applications
            .iter()
            .any(|a| a.id == application_id && a.user_id == user_id);
        if !owned {
            return Ok(Vec::new());
        }
        Ok(t
            .events
            .iter()
            .filter(|e| e.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn record_event(&self, event: NewEmailEvent) -> StorageResult<EmailEventRow> {
        let row = EmailEventRow {
            id: Uuid::new_v4(),
            application_id: event.application_id,
            event: event.event.as_str().to_string(),
            metadata: event.metadata,
            occurred_at: Utc::now(),
        };
        self.tables.lock().unwrap().events.push(row.clone());
        Ok(row)
    }
}
