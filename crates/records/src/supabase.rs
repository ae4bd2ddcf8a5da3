//! Supabase REST implementation of [`RecordStore`].

use crate::{AdditionalData, ConsentRecord, RecordError, RecordId, RecordStore};
use async_trait::async_trait;
use serde_json::Value;

/// Client for the `consents` table exposed over Supabase's PostgREST
/// surface.
#[derive(Debug, Clone)]
pub struct SupabaseRecords {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseRecords {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/consents", self.base_url)
    }

    fn row_url(&self, id: &RecordId) -> String {
        format!("{}/rest/v1/consents?id=eq.{}", self.base_url, id.0)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
    }
}

/// Extracts the row id from a `return=representation` insert response.
fn row_id_from_response(body: &Value) -> Result<RecordId, RecordError> {
    let id = body
        .as_array()
        .and_then(|rows| rows.first())
        .and_then(|row| row.get("id"));
    match id {
        Some(Value::String(id)) => Ok(RecordId(id.clone())),
        Some(Value::Number(id)) => Ok(RecordId(id.to_string())),
        _ => Err(RecordError::BadResponse(
            "insert response carried no row id".to_string(),
        )),
    }
}

#[async_trait]
impl RecordStore for SupabaseRecords {
    async fn insert(&self, record: &ConsentRecord) -> Result<RecordId, RecordError> {
        let response = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        let id = row_id_from_response(&body)?;
        tracing::debug!(%id, "inserted consent record");
        Ok(id)
    }

    async fn attach_crm_contact(
        &self,
        id: &RecordId,
        additional_data: &AdditionalData,
    ) -> Result<(), RecordError> {
        let response = self
            .authed(self.client.patch(self.row_url(id)))
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "additional_data": additional_data }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecordError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
