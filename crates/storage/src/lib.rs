//! Object storage for generated consent artifacts.
//!
//! Two artifacts are uploaded per submission: the signature raster and the
//! assembled consent PDF. Both go to name-addressed object storage under
//! fixed prefixes:
//!
//! ```text
//! signatures/<first>-<last>-<epochMillis>.jpg
//! consents/<kind>-consent-<first>-<last>-<epochMillis>.pdf
//! ```
//!
//! The epoch-millisecond component makes repeat submissions from the same
//! patient collision-free. Name components are normalised to a
//! conservative URL-safe set, since they are embedded verbatim in public
//! URLs.
//!
//! The [`ObjectStore`] trait is the narrow seam the pipeline depends on;
//! the production implementation is the Supabase storage client in
//! [`supabase`], and tests substitute an in-memory fake. Upload failure is
//! expected to degrade to an empty URL at the call site rather than abort
//! the pipeline.

mod supabase;

pub use supabase::SupabaseStorage;

use async_trait::async_trait;
use consent_types::ConsentKind;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected with status {status}: {body}")]
    UploadRejected { status: u16, body: String },
}

/// Narrow contract for name-addressed object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` at `path` and returns a publicly accessible URL.
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// Storage path for a signature image.
pub fn signature_object_path(first_name: &str, last_name: &str, epoch_millis: i64) -> String {
    format!(
        "signatures/{}-{}-{}.jpg",
        name_component(first_name),
        name_component(last_name),
        epoch_millis
    )
}

/// Storage path for an assembled consent document.
pub fn consent_object_path(
    kind: ConsentKind,
    first_name: &str,
    last_name: &str,
    epoch_millis: i64,
) -> String {
    format!(
        "consents/{}-consent-{}-{}-{}.pdf",
        kind.slug(),
        name_component(first_name),
        name_component(last_name),
        epoch_millis
    )
}

/// Normalises a patient-name component for use in an object path: trimmed,
/// lowercased, whitespace collapsed to single dashes, everything outside
/// `[a-z0-9-]` dropped.
fn name_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_dash = true;
    for c in raw.trim().chars() {
        if c.is_whitespace() {
            if !last_dash {
                out.push('-');
                last_dash = true;
            }
            continue;
        }
        for lower in c.to_lowercase() {
            if lower.is_ascii_alphanumeric() || lower == '-' {
                out.push(lower);
                last_dash = lower == '-';
            }
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_path_embeds_name_and_timestamp() {
        let path = signature_object_path("Jane", "Doe", 1_770_000_000_123);
        assert_eq!(path, "signatures/jane-doe-1770000000123.jpg");
    }

    #[test]
    fn consent_path_embeds_kind_name_and_timestamp() {
        let path =
            consent_object_path(ConsentKind::IvInjection, "Jane", "Doe", 1_770_000_000_123);
        assert_eq!(path, "consents/iv-injection-consent-jane-doe-1770000000123.pdf");
    }

    #[test]
    fn different_timestamps_never_collide() {
        let a = signature_object_path("Jane", "Doe", 1_770_000_000_000);
        let b = signature_object_path("Jane", "Doe", 1_770_000_000_001);
        assert_ne!(a, b);
    }

    #[test]
    fn name_components_are_url_safe() {
        let path = signature_object_path("  Mary Jo ", "O'Brien-Smith", 42);
        assert_eq!(path, "signatures/mary-jo-obrien-smith-42.jpg");
    }

    #[test]
    fn unicode_names_are_lowercased_and_filtered() {
        let component = name_component("Älvá  Strøm");
        assert!(!component.contains(' '));
        assert!(component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }
}
