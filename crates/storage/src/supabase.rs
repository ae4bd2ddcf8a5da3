//! Supabase storage implementation of [`ObjectStore`].

use crate::{ObjectStore, StorageError};
use async_trait::async_trait;

/// Client for one Supabase storage bucket.
///
/// Uploads objects via `POST /storage/v1/object/{bucket}/{path}` and hands
/// back the public-access URL for the stored object. The bucket is
/// expected to be public-read; the pipeline only links these URLs into
/// internal records and CRM notes.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl SupabaseStorage {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            bucket: bucket.into(),
            api_key: api_key.into(),
        }
    }

    fn upload_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let response = self
            .client
            .post(self.upload_url(path))
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadRejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(path, "stored object");
        Ok(self.public_url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> SupabaseStorage {
        SupabaseStorage::new(
            reqwest::Client::new(),
            "https://example.supabase.co/",
            "medical-documents",
            "anon-key",
        )
    }

    #[test]
    fn upload_url_targets_bucket_path() {
        assert_eq!(
            storage().upload_url("signatures/jane-doe-42.jpg"),
            "https://example.supabase.co/storage/v1/object/medical-documents/signatures/jane-doe-42.jpg"
        );
    }

    #[test]
    fn public_url_uses_public_object_route() {
        assert_eq!(
            storage().public_url("consents/iv-injection-consent-jane-doe-42.pdf"),
            "https://example.supabase.co/storage/v1/object/public/medical-documents/consents/iv-injection-consent-jane-doe-42.pdf"
        );
    }
}
