//! LeadConnector (GoHighLevel) implementation of [`CrmClient`].
//!
//! Uses the v2 REST surface: duplicate search by email, contact
//! create/update, contact notes and contact tags. All requests carry the
//! fixed `Version` header the API requires.

use crate::{CrmClient, CrmContact, CrmError};
use async_trait::async_trait;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";
const API_VERSION: &str = "2021-07-28";

#[derive(Debug, Clone)]
pub struct LeadConnectorClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    location_id: String,
}

impl LeadConnectorClient {
    pub fn new(
        client: reqwest::Client,
        api_key: impl Into<String>,
        location_id: impl Into<String>,
    ) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, api_key, location_id)
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        location_id: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            api_key: api_key.into(),
            location_id: location_id.into(),
        }
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.api_key)
            .header("Version", API_VERSION)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CrmError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(CrmError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Looks up an existing contact id by email, if any.
    async fn find_contact(&self, email: &str) -> Result<Option<String>, CrmError> {
        let url = format!(
            "{}/contacts/search/duplicate?locationId={}&email={}",
            self.base_url,
            self.location_id,
            urlencode(email)
        );
        let response = Self::check(self.request(reqwest::Method::GET, url).send().await?).await?;
        let body: Value = response.json().await?;
        Ok(contact_id_from(&body))
    }
}

/// Extracts `contact.id` from a search/create/update response body.
fn contact_id_from(body: &Value) -> Option<String> {
    body.get("contact")
        .and_then(|contact| contact.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Minimal percent-encoding for a query value.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[async_trait]
impl CrmClient for LeadConnectorClient {
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<String, CrmError> {
        let existing = self.find_contact(&contact.email).await?;

        let response = match &existing {
            Some(id) => {
                tracing::debug!(contact_id = %id, "updating existing CRM contact");
                self.request(
                    reqwest::Method::PUT,
                    format!("{}/contacts/{}", self.base_url, id),
                )
                .json(contact)
                .send()
                .await?
            }
            None => {
                tracing::debug!("creating new CRM contact");
                let mut payload = serde_json::to_value(contact)
                    .unwrap_or_else(|_| json!({}));
                payload["locationId"] = Value::String(self.location_id.clone());
                self.request(reqwest::Method::POST, format!("{}/contacts/", self.base_url))
                    .json(&payload)
                    .send()
                    .await?
            }
        };

        let body: Value = Self::check(response).await?.json().await?;
        contact_id_from(&body)
            .or(existing)
            .ok_or(CrmError::MissingContactId)
    }

    async fn add_note(&self, contact_id: &str, body: &str) -> Result<(), CrmError> {
        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/contacts/{}/notes", self.base_url, contact_id),
            )
            .json(&json!({ "body": body }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn add_tags(&self, contact_id: &str, tags: &[String]) -> Result<(), CrmError> {
        let response = self
            .request(
                reqwest::Method::POST,
                format!("{}/contacts/{}/tags", self.base_url, contact_id),
            )
            .json(&json!({ "tags": tags }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
