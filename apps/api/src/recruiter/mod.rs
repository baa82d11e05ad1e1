//! Recruiter lookup through Apollo's people search.
//!
//! Single attempt, no retry. The caller's own Apollo key travels in the
//! `X-Api-Key` header.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::errors::AppError;

pub mod handlers;

/// Titles Apollo is asked to match against.
pub const RECRUITER_TITLES: [&str; 4] = ["recruiter", "talent acquisition", "hr", "hiring manager"];
const PAGE_SIZE: u32 = 5;

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
}

impl From<ContactError> for AppError {
    fn from(e: ContactError) -> Self {
        match e {
            ContactError::Api { status, body } => AppError::Upstream {
                service: "Apollo",
                status: Some(status),
                body,
            },
            ContactError::Http(e) => AppError::Upstream {
                service: "Apollo",
                status: e.status().map(|s| s.as_u16()),
                body: e.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub name: String,
    pub email: Option<String>,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeopleSearchRequest<'a> {
    pub q_organization_name: &'a str,
    pub person_titles: &'a [&'a str],
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct PeopleSearchResponse {
    /// Apollo omits this, or sends `null`, when nothing matched.
    #[serde(default)]
    pub people: Option<Vec<Person>>,
}

impl PeopleSearchResponse {
    pub fn into_contacts(self) -> Vec<Contact> {
        self.people
            .unwrap_or_default()
            .into_iter()
            .map(Contact::from)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct Person {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub linkedin_url: Option<String>,
}

impl From<Person> for Contact {
    fn from(p: Person) -> Self {
        let name = [p.first_name, p.last_name]
            .into_iter()
            .flatten()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Contact {
            name,
            email: p.email,
            title: p.title,
            linkedin_url: p.linkedin_url,
        }
    }
}

#[async_trait]
pub trait ContactSearch: Send + Sync {
    async fn search(&self, api_key: &str, company: &str) -> Result<Vec<Contact>, ContactError>;
}

#[derive(Clone)]
pub struct ApolloClient {
    client: Client,
    base_url: String,
}

impl ApolloClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/mixed_people/search",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ContactSearch for ApolloClient {
    async fn search(&self, api_key: &str, company: &str) -> Result<Vec<Contact>, ContactError> {
        let body = PeopleSearchRequest {
            q_organization_name: company,
            person_titles: &RECRUITER_TITLES,
            page: 1,
            per_page: PAGE_SIZE,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("X-Api-Key", api_key)
            .header("Cache-Control", "no-cache")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ContactError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PeopleSearchResponse = response.json().await?;
        let contacts = parsed.into_contacts();
        debug!("Apollo returned {} people", contacts.len());
        Ok(contacts)
    }
}

/// Validates inputs, then runs one people search for `company`.
pub async fn find_recruiters(
    contacts: &dyn ContactSearch,
    api_key: Option<&str>,
    company: &str,
) -> Result<Vec<Contact>, AppError> {
    let company = company.trim();
    if company.is_empty() {
        return Err(AppError::Validation("Company name is required".to_string()));
    }
    let api_key = api_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::Precondition("Apollo API key not configured".to_string()))?;

    let found = contacts.search(api_key, company).await?;
    info!("Found {} recruiter contacts at {company}", found.len());
    Ok(found)
}
