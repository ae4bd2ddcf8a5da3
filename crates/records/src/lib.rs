//! Relational persistence of consent submissions.
//!
//! One row is inserted per submission, carrying the identity fields, the
//! consent-type discriminator, the two artifact URLs (possibly empty when
//! an upload failed) and an `additional_data` payload nesting the full
//! screening responses, the derived critical flag and the acknowledgment
//! catalog with checked states.
//!
//! Insertion is best-effort from the pipeline's point of view: a failed
//! insert is logged for operators and never blocks the user-visible
//! outcome. If the CRM sync later yields a contact id, a second
//! best-effort update attaches it to the already-inserted row. The
//! original screening/acknowledgment/signature payload is never mutated
//! after insertion.

mod supabase;

pub use supabase::SupabaseRecords;

use async_trait::async_trait;
use consent_core::ConsentSubmission;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("record store rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("record store returned an unusable response: {0}")]
    BadResponse(String),
}

/// Identifier of an inserted consent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId(pub String);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One acknowledgment entry inside `additional_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgmentEntry {
    pub id: String,
    pub text: String,
    pub checked: bool,
}

/// The nested payload column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_contact_id: Option<String>,
    /// Screening answers and details keyed by their original wire names,
    /// plus the derived `g6pdCritical` flag.
    pub health_screening: Value,
    pub acknowledgments: Vec<AcknowledgmentEntry>,
}

/// The persisted consent row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub consent_type: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    /// ISO date (`YYYY-MM-DD`).
    pub consent_date: String,
    pub consent_given: bool,
    pub signature_url: String,
    pub pdf_url: String,
    pub additional_data: AdditionalData,
}

/// Narrow contract for the relational store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts one consent row and returns its identifier.
    async fn insert(&self, record: &ConsentRecord) -> Result<RecordId, RecordError>;

    /// Replaces the row's `additional_data`, used to attach the CRM
    /// contact id after a successful sync.
    async fn attach_crm_contact(
        &self,
        id: &RecordId,
        additional_data: &AdditionalData,
    ) -> Result<(), RecordError>;
}

/// Builds the persisted row from a validated submission and the artifact
/// URLs (which may be empty strings when an upload failed).
pub fn build_record(
    submission: &ConsentSubmission,
    signature_url: &str,
    pdf_url: &str,
) -> ConsentRecord {
    ConsentRecord {
        consent_type: submission.kind.slug().to_string(),
        first_name: submission.identity.first_name.clone(),
        last_name: submission.identity.last_name.clone(),
        email: submission.identity.email.clone(),
        phone: submission.identity.phone.clone(),
        date_of_birth: submission.identity.date_of_birth.clone(),
        consent_date: submission.consent_date_iso(),
        consent_given: true,
        signature_url: signature_url.to_string(),
        pdf_url: pdf_url.to_string(),
        additional_data: AdditionalData {
            crm_contact_id: None,
            health_screening: health_screening_json(submission),
            acknowledgments: submission
                .acknowledgments
                .iter()
                .map(|a| AcknowledgmentEntry {
                    id: a.id.clone(),
                    text: a.text.clone(),
                    checked: a.checked,
                })
                .collect(),
        },
    }
}

/// Screening payload keyed by the original wire names (`g6pd`,
/// `g6pdDetails`, ..., `g6pdCritical`), answer and detail per question.
fn health_screening_json(submission: &ConsentSubmission) -> Value {
    let mut map = Map::new();
    for response in &submission.screening {
        map.insert(
            response.key.wire_name().to_string(),
            Value::String(response.answer.to_string()),
        );
        if let Some(detail_key) = response.key.detail_wire_name() {
            map.insert(
                detail_key.to_string(),
                Value::String(response.detail.clone().unwrap_or_default()),
            );
        }
    }
    map.insert(
        "g6pdCritical".to_string(),
        Value::Bool(submission.critical_flag),
    );
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use consent_core::{ConsentCatalog, FormState};
    use consent_types::{ScreeningAnswer, ScreeningKey};

    const TINY_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4z8AAAAMBAQDJ/pLvAAAAAElFTkSuQmCC";

    fn submission(g6pd: ScreeningAnswer) -> ConsentSubmission {
        let catalog = ConsentCatalog::iv_injection();
        let mut state = FormState {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            date_of_birth: "01/01/1990".into(),
            ..FormState::default()
        };
        for key in ScreeningKey::ALL {
            state.set_answer(key, ScreeningAnswer::No);
        }
        state.set_answer(ScreeningKey::G6pd, g6pd);
        state.set_detail(ScreeningKey::G6pd, "diagnosed 2019");
        for statement in catalog.acknowledgments() {
            state.set_acknowledgment(statement.id, true);
        }
        state.signature_data = TINY_PNG_DATA_URL.into();
        let at = Utc.with_ymd_and_hms(2026, 2, 3, 18, 30, 0).unwrap();
        ConsentSubmission::from_validated(&state, &catalog, at).unwrap()
    }

    #[test]
    fn record_matches_persisted_schema() {
        let record = build_record(&submission(ScreeningAnswer::No), "sig-url", "pdf-url");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["consent_type"], "iv-injection");
        assert_eq!(json["first_name"], "Jane");
        assert_eq!(json["consent_date"], "2026-02-03");
        assert_eq!(json["consent_given"], true);
        assert_eq!(json["signature_url"], "sig-url");
        assert_eq!(json["pdf_url"], "pdf-url");
        assert_eq!(json["additional_data"]["health_screening"]["g6pd"], "No");
        assert_eq!(
            json["additional_data"]["health_screening"]["g6pdDetails"],
            "diagnosed 2019"
        );
        assert_eq!(
            json["additional_data"]["health_screening"]["g6pdCritical"],
            false
        );
        assert_eq!(
            json["additional_data"]["acknowledgments"]
                .as_array()
                .unwrap()
                .len(),
            12
        );
    }

    #[test]
    fn critical_answer_sets_g6pd_critical() {
        let record = build_record(&submission(ScreeningAnswer::Unsure), "", "");
        assert_eq!(
            record.additional_data.health_screening["g6pdCritical"],
            true
        );
    }

    #[test]
    fn crm_contact_id_is_absent_until_attached() {
        let record = build_record(&submission(ScreeningAnswer::No), "", "");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["additional_data"]
            .as_object()
            .unwrap()
            .get("crm_contact_id")
            .is_none());
    }

    #[test]
    fn empty_urls_are_preserved_not_rejected() {
        let record = build_record(&submission(ScreeningAnswer::No), "", "");
        assert_eq!(record.signature_url, "");
        assert_eq!(record.pdf_url, "");
    }

    #[test]
    fn pregnant_has_no_detail_key() {
        let record = build_record(&submission(ScreeningAnswer::No), "", "");
        let screening = record.additional_data.health_screening.as_object().unwrap();
        assert!(screening.contains_key("pregnant"));
        assert!(!screening.contains_key("pregnantDetails"));
        // 9 answers + 8 detail fields + the critical flag.
        assert_eq!(screening.len(), 18);
    }
}
