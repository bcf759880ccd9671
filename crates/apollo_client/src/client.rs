//! Apollo HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required). Every endpoint is a
//! JSON POST authenticated with the static API key.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::model::{
    Campaign, CampaignPage, CreateContactResponse, EnrollmentResponse, MatchResponse, Person,
};

pub const DEFAULT_API_BASE: &str = "https://api.apollo.io/v1";

/// Fixed page size for the sequence listing.
pub const PER_PAGE: u32 = 100;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Apollo API client (blocking).
#[derive(Clone)]
pub struct ApolloClient {
    http: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
    email_account_id: String,
}

/// Error type for Apollo calls.
#[derive(Debug, thiserror::Error)]
pub enum ApolloError {
    /// Connection, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// 2xx response whose body could not be decoded
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl ApolloError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApolloError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body text, when the server sent one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            ApolloError::Http { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

/// Outcome of [`ApolloClient::find_or_create_contact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactMatch {
    /// The person was already a contact.
    Existing(String),
    /// The person existed without a contact record; one was created.
    Created(String),
    NotFound,
}

impl ContactMatch {
    pub fn contact_id(&self) -> Option<&str> {
        match self {
            ContactMatch::Existing(id) | ContactMatch::Created(id) => Some(id),
            ContactMatch::NotFound => None,
        }
    }
}

/// Result of paging through the sequence listing.
///
/// The listing is a soft-failure call: a transport error ends pagination
/// early and is kept in `error`, while `campaigns` holds everything fetched
/// before it.
#[derive(Debug, Default)]
pub struct SequenceListing {
    pub campaigns: Vec<Campaign>,
    pub pages: u32,
    pub error: Option<ApolloError>,
}

/// Raw enrollment outcome: the decoded body, or the transport failure.
pub type RawEnrollmentResult = Result<EnrollmentResponse, ApolloError>;

impl ApolloClient {
    pub fn new(
        api_key: impl Into<String>,
        email_account_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, ApolloError> {
        Self::with_timeout(api_key, email_account_id, api_base, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        email_account_id: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApolloError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("outreach/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ApolloError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            email_account_id: email_account_id.into(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Look up a person by name + email.
    pub fn match_person(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<Option<Person>, ApolloError> {
        let url = format!("{}/people/match", self.api_base);
        let resp: MatchResponse = self.post_json(
            &url,
            &serde_json::json!({
                "first_name": first_name,
                "last_name": last_name,
                "email": email,
            }),
        )?;
        Ok(resp.person)
    }

    /// Create a contact record from a matched person.
    /// Returns the new contact id, or `None` if Apollo returned no id.
    pub fn create_contact(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        person: &Person,
    ) -> Result<Option<String>, ApolloError> {
        let url = format!("{}/contacts", self.api_base);
        let resp: CreateContactResponse = self.post_json(
            &url,
            &serde_json::json!({
                "first_name": first_name,
                "last_name": last_name,
                "email": email,
                "title": person.title.as_deref().unwrap_or(""),
                "organization_name": person.organization_name(),
                "person_id": person.id,
            }),
        )?;
        Ok(resp
            .contact
            .and_then(|c| c.id)
            .filter(|id| !id.is_empty()))
    }

    /// Resolve a prospect to a contact id, creating the contact record when
    /// Apollo knows the person but has no contact for them yet.
    pub fn find_or_create_contact(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Result<ContactMatch, ApolloError> {
        let person = match self.match_person(first_name, last_name, email)? {
            Some(p) => p,
            None => return Ok(ContactMatch::NotFound),
        };

        if let Some(id) = person.contact_id() {
            return Ok(ContactMatch::Existing(id.to_string()));
        }

        if person.id.as_deref().map_or(true, str::is_empty) {
            return Ok(ContactMatch::NotFound);
        }

        debug!(first_name, last_name, "person has no contact record, creating one");
        match self.create_contact(first_name, last_name, email, &person)? {
            Some(id) => Ok(ContactMatch::Created(id)),
            None => Ok(ContactMatch::NotFound),
        }
    }

    /// Fetch one page of the sequence listing (1-based).
    pub fn list_sequences_page(&self, page: u32) -> Result<Vec<Campaign>, ApolloError> {
        let url = format!("{}/emailer_campaigns/search", self.api_base);
        let resp: CampaignPage = self.post_json(
            &url,
            &serde_json::json!({
                "page": page,
                "per_page": PER_PAGE,
            }),
        )?;
        Ok(resp.emailer_campaigns.unwrap_or_default())
    }

    /// Page through every sequence in the account.
    ///
    /// Stops at the first empty or short page. A transport failure stops
    /// pagination and is logged; what was fetched so far is still returned.
    pub fn list_all_sequences(&self) -> SequenceListing {
        let mut listing = SequenceListing::default();
        let mut page = 1u32;

        loop {
            let batch = match self.list_sequences_page(page) {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(page, error = %e, "sequence listing failed");
                    listing.error = Some(e);
                    break;
                }
            };
            listing.pages += 1;

            let count = batch.len();
            debug!(page, count, "fetched sequence page");
            listing
                .campaigns
                .extend(batch.into_iter().filter(|c| !c.id.is_empty()));

            if count == 0 || count < PER_PAGE as usize {
                break;
            }
            page += 1;
        }

        listing
    }

    /// Add one contact to a sequence, sending from the configured mailbox.
    pub fn enroll_contact(&self, contact_id: &str, sequence_id: &str) -> RawEnrollmentResult {
        let url = format!(
            "{}/emailer_campaigns/{}/add_contact_ids",
            self.api_base, sequence_id
        );
        self.post_json(
            &url,
            &serde_json::json!({
                "contact_ids": [contact_id],
                "emailer_campaign_id": sequence_id,
                "send_email_from_email_account_id": self.email_account_id,
            }),
        )
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, ApolloError> {
        let response = self
            .http
            .post(url)
            .header("X-Api-Key", &self.api_key)
            .header("Cache-Control", "no-cache")
            .json(body)
            .send()
            .map_err(|e| ApolloError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApolloError::Http { status, body });
        }

        let text = response
            .text()
            .map_err(|e| ApolloError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            ApolloError::Parse(format!(
                "{} (body: {})",
                e,
                &text[..floor_char_boundary(&text, 200)],
            ))
        })
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
