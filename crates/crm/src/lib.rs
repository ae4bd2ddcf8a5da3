//! Best-effort CRM synchronisation of signed consents.
//!
//! After a submission is persisted, a subset of its data is pushed to the
//! external relationship-management system so front-desk staff can see
//! signed consents next to the contact record. The sync is three
//! independent operations (upsert the contact, attach a summary note,
//! tag the contact for segmentation) and every one of them is
//! best-effort: a failure is logged for operators and never alters the
//! outcome shown to the patient. No retries are attempted.
//!
//! The safety flag travels as a first-class field of the payload (not only
//! inside the note text) so a reviewer can filter high-risk submissions
//! without reading narrative.

mod leadconnector;

pub use leadconnector::LeadConnectorClient;

use async_trait::async_trait;
use consent_core::ConsentSubmission;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("CRM request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("CRM rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("CRM response carried no contact id")]
    MissingContactId,
}

/// Contact fields pushed on upsert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    pub source: String,
}

/// Screening summary carried first-class in the sync payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmHealthScreening {
    pub critical_question_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_detail: Option<String>,
    pub critical_flag: bool,
}

/// The full sync payload for one signed consent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentSyncPayload {
    pub consent_type: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub consent_date: String,
    pub pdf_url: String,
    pub signature_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm_contact_id: Option<String>,
    pub health_screening: CrmHealthScreening,
}

/// Narrow contract for the external CRM.
#[async_trait]
pub trait CrmClient: Send + Sync {
    /// Finds the contact by email or creates it; returns the contact id.
    async fn upsert_contact(&self, contact: &CrmContact) -> Result<String, CrmError>;

    /// Attaches a free-text note to the contact.
    async fn add_note(&self, contact_id: &str, body: &str) -> Result<(), CrmError>;

    /// Applies segmentation tags to the contact.
    async fn add_tags(&self, contact_id: &str, tags: &[String]) -> Result<(), CrmError>;
}

/// Builds the sync payload for a submission and its artifact URLs.
pub fn build_payload(
    submission: &ConsentSubmission,
    signature_url: &str,
    pdf_url: &str,
) -> ConsentSyncPayload {
    let critical = submission.critical_response();
    ConsentSyncPayload {
        consent_type: submission.kind.crm_code().to_string(),
        first_name: submission.identity.first_name.clone(),
        last_name: submission.identity.last_name.clone(),
        email: submission.identity.email.clone(),
        phone: submission.identity.phone.clone(),
        date_of_birth: submission.identity.date_of_birth.clone(),
        consent_date: submission.consent_date_display(),
        pdf_url: pdf_url.to_string(),
        signature_url: signature_url.to_string(),
        crm_contact_id: None,
        health_screening: CrmHealthScreening {
            critical_question_answer: critical
                .map(|r| r.answer.to_string())
                .unwrap_or_default(),
            critical_detail: critical.and_then(|r| r.detail.clone()),
            critical_flag: submission.critical_flag,
        },
    }
}

/// Contact fields for the upsert call, with the phone normalised.
pub fn build_contact(submission: &ConsentSubmission) -> CrmContact {
    CrmContact {
        first_name: submission.identity.first_name.clone(),
        last_name: submission.identity.last_name.clone(),
        email: submission.identity.email.clone(),
        phone: format_phone(&submission.identity.phone),
        date_of_birth: match submission.identity.date_of_birth.trim() {
            "" => None,
            dob => Some(dob.to_string()),
        },
        source: "Website Consent Form".to_string(),
    }
}

/// Segmentation tags applied after a signed consent.
pub fn tags_for(submission: &ConsentSubmission) -> Vec<String> {
    vec![submission.kind.signed_tag().to_string()]
}

/// Normalises a US phone number to `+1XXXXXXXXXX`.
///
/// Ten-digit numbers gain the country code; eleven-digit numbers with a
/// leading 1 gain the plus. Anything else is passed through stripped of
/// formatting, or dropped entirely when no digits remain.
pub fn format_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        0 => None,
        10 => Some(format!("+1{digits}")),
        11 if digits.starts_with('1') => Some(format!("+{digits}")),
        _ => Some(digits),
    }
}

/// The note attached to the contact: patient identity, consent date, links
/// to both artifacts, and the safety alert when flagged.
pub fn note_body(submission: &ConsentSubmission, signature_url: &str, pdf_url: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "{} CONSENT FORM SIGNED\n",
        submission.kind.title().to_uppercase()
    ));
    body.push_str("==============================\n\n");
    body.push_str(&format!("Patient: {}\n", submission.identity.full_name()));
    body.push_str(&format!("Email: {}\n", submission.identity.email));
    if let Some(phone) = format_phone(&submission.identity.phone) {
        body.push_str(&format!("Phone: {phone}\n"));
    }
    body.push_str(&format!(
        "Consent Date: {}\n",
        submission.consent_date_display()
    ));

    if !pdf_url.is_empty() || !signature_url.is_empty() {
        body.push_str("\nDOCUMENTS:\n");
        if !pdf_url.is_empty() {
            body.push_str(&format!("Signed PDF: {pdf_url}\n"));
        }
        if !signature_url.is_empty() {
            body.push_str(&format!("Signature: {signature_url}\n"));
        }
    }

    if submission.critical_flag {
        body.push_str(
            "\nG6PD ALERT: patient reported G6PD deficiency or uncertain status. Confirm \
             G6PD status before any Vitamin C-containing IV formulation.\n",
        );
    }

    body.push_str(&format!(
        "\nSubmitted: {}",
        submission.submitted_at.format("%Y-%m-%d %H:%M UTC")
    ));
    body
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
            phone: "(949) 555-0100".into(),
            date_of_birth: "01/01/1990".into(),
            ..FormState::default()
        };
        for key in ScreeningKey::ALL {
            state.set_answer(key, ScreeningAnswer::No);
        }
        state.set_answer(ScreeningKey::G6pd, g6pd);
        for statement in catalog.acknowledgments() {
            state.set_acknowledgment(statement.id, true);
        }
        state.signature_data = TINY_PNG_DATA_URL.into();
        let at = Utc.with_ymd_and_hms(2026, 2, 3, 18, 30, 0).unwrap();
        ConsentSubmission::from_validated(&state, &catalog, at).unwrap()
    }

    #[test]
    fn payload_serializes_with_camel_case_keys() {
        let payload = build_payload(&submission(ScreeningAnswer::No), "sig", "pdf");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["consentType"], "iv");
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["consentDate"], "2/3/2026");
        assert_eq!(json["pdfUrl"], "pdf");
        assert_eq!(json["signatureUrl"], "sig");
        assert_eq!(json["healthScreening"]["criticalQuestionAnswer"], "No");
        assert_eq!(json["healthScreening"]["criticalFlag"], false);
    }

    #[test]
    fn critical_flag_travels_first_class() {
        for answer in [ScreeningAnswer::Yes, ScreeningAnswer::Unsure] {
            let payload = build_payload(&submission(answer), "", "");
            assert!(payload.health_screening.critical_flag, "flag for {answer}");
        }
        let payload = build_payload(&submission(ScreeningAnswer::No), "", "");
        assert!(!payload.health_screening.critical_flag);
    }

    #[test]
    fn phone_formats_to_e164() {
        assert_eq!(format_phone("(949) 997-3988"), Some("+19499973988".into()));
        assert_eq!(format_phone("19499973988"), Some("+19499973988".into()));
        assert_eq!(format_phone("+1 949 997 3988"), Some("+19499973988".into()));
        assert_eq!(format_phone("997-3988"), Some("9973988".into()));
        assert_eq!(format_phone("  "), None);
    }

    #[test]
    fn contact_carries_normalised_phone_and_source() {
        let contact = build_contact(&submission(ScreeningAnswer::No));
        assert_eq!(contact.phone.as_deref(), Some("+19495550100"));
        assert_eq!(contact.source, "Website Consent Form");
        assert_eq!(contact.date_of_birth.as_deref(), Some("01/01/1990"));
    }

    #[test]
    fn note_links_documents_and_flags_g6pd() {
        let note = note_body(&submission(ScreeningAnswer::Unsure), "sig-url", "pdf-url");
        assert!(note.starts_with("IV & INJECTION THERAPY CONSENT FORM SIGNED"));
        assert!(note.contains("Patient: Jane Doe"));
        assert!(note.contains("Signed PDF: pdf-url"));
        assert!(note.contains("Signature: sig-url"));
        assert!(note.contains("G6PD ALERT"));
    }

    #[test]
    fn note_omits_missing_documents_and_alert() {
        let note = note_body(&submission(ScreeningAnswer::No), "", "");
        assert!(!note.contains("DOCUMENTS:"));
        assert!(!note.contains("G6PD ALERT"));
        assert!(note.contains("Consent Date: 2/3/2026"));
    }

    #[test]
    fn signed_tag_follows_consent_kind() {
        assert_eq!(
            tags_for(&submission(ScreeningAnswer::No)),
            vec!["iv-signed".to_string()]
        );
    }
}
