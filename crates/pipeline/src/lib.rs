//! # Consent Pipeline
//!
//! The submission controller: sequences validation, document assembly,
//! artifact uploads, persistence and CRM sync, and decides the
//! user-visible outcome.
//!
//! The state machine is
//!
//! ```text
//! Idle -> Validating -> Invalid (errors shown, back to Idle)
//!                    -> Assembling -> Uploading -> Persisting -> Syncing -> Succeeded
//! ```
//!
//! Once validation passes there is no failure path that reaches the user
//! except one: a submission whose signature payload cannot be decoded or
//! whose document cannot be produced, which yields a generic retryable
//! error (a document that cannot be assembled cannot honestly be confirmed
//! as sent). Every step from `Uploading` onward degrades instead of
//! aborting - a failed upload becomes an empty URL, a failed insert or CRM
//! call is logged and skipped - so the machine always reaches `Succeeded`.
//!
//! The two artifact uploads have no data dependency on each other and run
//! concurrently; everything from persistence onward runs strictly after
//! both settle. Each step only writes data forward, so a hung call delays
//! progress without corrupting state.

use chrono::Utc;
use consent_core::{
    validate, ClinicIdentity, ConsentCatalog, ConsentSubmission, FormState,
};
use consent_crm::{build_contact, build_payload, note_body, tags_for, CrmClient};
use consent_document::assemble;
use consent_records::{build_record, RecordStore};
use consent_storage::{
    consent_object_path, signature_object_path, ObjectStore, StorageError,
};
use consent_types::ConsentKind;
use std::sync::Arc;
use uuid::Uuid;

/// Message shown for the single fatal failure class. Deliberately generic:
/// downstream detail is operator-facing only.
const GENERIC_ERROR: &str = "Error submitting form. Please try again.";

/// Pipeline phases, in order. `Idle` exists only as the rest state between
/// submissions; the submit control is disabled for the duration of a run,
/// so one controller never interleaves two submissions for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Assembling,
    Uploading,
    Persisting,
    Syncing,
    Succeeded,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Assembling => "assembling",
            Phase::Uploading => "uploading",
            Phase::Persisting => "persisting",
            Phase::Syncing => "syncing",
            Phase::Succeeded => "succeeded",
        }
    }
}

/// What the caller renders after a submission attempt.
#[derive(Debug)]
pub enum SubmissionOutcome {
    /// Validation failed; every problem is reported in one pass and shown
    /// together. Nothing downstream was touched.
    Invalid { errors: Vec<String> },
    /// The pipeline ran to completion (possibly with degraded steps).
    Succeeded(Box<SubmissionReceipt>),
    /// Document assembly failed; the submit control is re-armed.
    Failed { message: String },
}

/// Summary of a completed submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub first_name: String,
    pub critical_flag: bool,
    pub page_count: usize,
    /// Empty string when the upload failed; internal linkage only.
    pub signature_url: String,
    /// Empty string when the upload failed; internal linkage only.
    pub pdf_url: String,
    pub record_id: Option<String>,
    pub crm_contact_id: Option<String>,
}

/// Sequences one submission through the pipeline.
///
/// The three collaborators are narrow trait objects so the whole pipeline
/// can run against in-memory fakes in tests.
pub struct SubmissionController {
    clinic: ClinicIdentity,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    crm: Arc<dyn CrmClient>,
}

impl SubmissionController {
    pub fn new(
        clinic: ClinicIdentity,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        crm: Arc<dyn CrmClient>,
    ) -> Self {
        Self {
            clinic,
            objects,
            records,
            crm,
        }
    }

    fn enter(&self, phase: Phase) {
        tracing::info!(phase = phase.as_str(), "submission pipeline");
    }

    /// Runs one submission to its outcome.
    pub async fn submit(&self, kind: ConsentKind, state: &FormState) -> SubmissionOutcome {
        self.enter(Phase::Validating);
        let catalog = ConsentCatalog::for_kind(kind);
        let report = validate(state, &catalog);
        if !report.is_valid() {
            tracing::info!(
                errors = report.errors.len(),
                "submission rejected by validation"
            );
            return SubmissionOutcome::Invalid {
                errors: report.errors,
            };
        }

        self.enter(Phase::Assembling);
        let submission = match ConsentSubmission::from_validated(state, &catalog, Utc::now()) {
            Ok(submission) => submission,
            Err(error) => {
                tracing::error!(%error, "failed to build submission from validated form");
                return SubmissionOutcome::Failed {
                    message: GENERIC_ERROR.to_string(),
                };
            }
        };
        let document = match assemble(&submission, &self.clinic) {
            Ok(document) => document,
            Err(error) => {
                tracing::error!(%error, "document assembly failed");
                return SubmissionOutcome::Failed {
                    message: GENERIC_ERROR.to_string(),
                };
            }
        };

        self.enter(Phase::Uploading);
        let millis = submission.submitted_at.timestamp_millis();
        let identity = &submission.identity;
        let signature_path =
            signature_object_path(&identity.first_name, &identity.last_name, millis);
        let document_path =
            consent_object_path(kind, &identity.first_name, &identity.last_name, millis);
        let (signature_result, document_result) = tokio::join!(
            self.objects.put(
                &signature_path,
                submission.signature.bytes().to_vec(),
                submission.signature.content_type(),
            ),
            self.objects
                .put(&document_path, document.bytes.clone(), "application/pdf"),
        );
        let signature_url = url_or_empty(signature_result, "signature");
        let pdf_url = url_or_empty(document_result, "document");

        self.enter(Phase::Persisting);
        let record = build_record(&submission, &signature_url, &pdf_url);
        let record_id = match self.records.insert(&record).await {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::error!(%error, "consent row insert failed; continuing");
                None
            }
        };

        self.enter(Phase::Syncing);
        let payload = build_payload(&submission, &signature_url, &pdf_url);
        tracing::debug!(?payload, "syncing consent to CRM");
        let crm_contact_id = match self.crm.upsert_contact(&build_contact(&submission)).await {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!(%error, "CRM contact upsert failed; continuing");
                None
            }
        };
        if let Some(contact_id) = &crm_contact_id {
            let note = note_body(&submission, &signature_url, &pdf_url);
            if let Err(error) = self.crm.add_note(contact_id, &note).await {
                tracing::warn!(%error, "CRM note failed; continuing");
            }
            if let Err(error) = self
                .crm
                .add_tags(contact_id, &tags_for(&submission))
                .await
            {
                tracing::warn!(%error, "CRM tagging failed; continuing");
            }
            if let Some(record_id) = &record_id {
                let mut updated = record.additional_data.clone();
                updated.crm_contact_id = Some(contact_id.clone());
                if let Err(error) =
                    self.records.attach_crm_contact(record_id, &updated).await
                {
                    tracing::warn!(%error, "attaching CRM contact id to record failed");
                }
            }
        }

        self.enter(Phase::Succeeded);
        SubmissionOutcome::Succeeded(Box::new(SubmissionReceipt {
            submission_id: submission.id,
            first_name: identity.first_name.clone(),
            critical_flag: submission.critical_flag,
            page_count: document.page_count,
            signature_url,
            pdf_url,
            record_id: record_id.map(|id| id.0),
            crm_contact_id,
        }))
    }
}

/// Degrades a failed upload to an empty URL; the user-visible outcome does
/// not depend on these links.
fn url_or_empty(result: Result<String, StorageError>, artifact: &str) -> String {
    match result {
        Ok(url) => url,
        Err(error) => {
            tracing::warn!(%error, artifact, "artifact upload failed; continuing with empty URL");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use consent_crm::{CrmContact, CrmError};
    use consent_records::{AdditionalData, ConsentRecord, RecordError, RecordId};
    use consent_types::{ScreeningAnswer, ScreeningKey};
    use std::sync::Mutex;

    const TINY_PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4z8AAAAMBAQDJ/pLvAAAAAElFTkSuQmCC";

    #[derive(Default)]
    struct FakeStore {
        puts: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<String, StorageError> {
            if self.fail {
                return Err(StorageError::UploadRejected {
                    status: 503,
                    body: "bucket unavailable".to_string(),
                });
            }
            self.puts
                .lock()
                .unwrap()
                .push((path.to_string(), content_type.to_string()));
            Ok(format!("https://cdn.test/{path}"))
        }
    }

    #[derive(Default)]
    struct FakeRecords {
        rows: Mutex<Vec<ConsentRecord>>,
        attached: Mutex<Vec<(RecordId, AdditionalData)>>,
        fail_insert: bool,
    }

    #[async_trait]
    impl RecordStore for FakeRecords {
        async fn insert(&self, record: &ConsentRecord) -> Result<RecordId, RecordError> {
            if self.fail_insert {
                return Err(RecordError::Rejected {
                    status: 500,
                    body: "insert failed".to_string(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            rows.push(record.clone());
            Ok(RecordId(format!("row-{}", rows.len())))
        }

        async fn attach_crm_contact(
            &self,
            id: &RecordId,
            additional_data: &AdditionalData,
        ) -> Result<(), RecordError> {
            self.attached
                .lock()
                .unwrap()
                .push((id.clone(), additional_data.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeCrm {
        contacts: Mutex<Vec<CrmContact>>,
        notes: Mutex<Vec<(String, String)>>,
        tags: Mutex<Vec<(String, Vec<String>)>>,
        fail_upsert: bool,
    }

    #[async_trait]
    impl CrmClient for FakeCrm {
        async fn upsert_contact(&self, contact: &CrmContact) -> Result<String, CrmError> {
            if self.fail_upsert {
                return Err(CrmError::Rejected {
                    status: 502,
                    body: "crm down".to_string(),
                });
            }
            self.contacts.lock().unwrap().push(contact.clone());
            Ok("contact-1".to_string())
        }

        async fn add_note(&self, contact_id: &str, body: &str) -> Result<(), CrmError> {
            self.notes
                .lock()
                .unwrap()
                .push((contact_id.to_string(), body.to_string()));
            Ok(())
        }

        async fn add_tags(&self, contact_id: &str, tags: &[String]) -> Result<(), CrmError> {
            self.tags
                .lock()
                .unwrap()
                .push((contact_id.to_string(), tags.to_vec()));
            Ok(())
        }
    }

    struct Harness {
        store: Arc<FakeStore>,
        records: Arc<FakeRecords>,
        crm: Arc<FakeCrm>,
        controller: SubmissionController,
    }

    fn harness(store: FakeStore, records: FakeRecords, crm: FakeCrm) -> Harness {
        let store = Arc::new(store);
        let records = Arc::new(records);
        let crm = Arc::new(crm);
        let controller = SubmissionController::new(
            ClinicIdentity::default(),
            store.clone(),
            records.clone(),
            crm.clone(),
        );
        Harness {
            store,
            records,
            crm,
            controller,
        }
    }

    fn valid_state() -> FormState {
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
        for statement in catalog.acknowledgments() {
            state.set_acknowledgment(statement.id, true);
        }
        state.signature_data = TINY_PNG_DATA_URL.into();
        state
    }

    fn receipt(outcome: SubmissionOutcome) -> SubmissionReceipt {
        match outcome {
            SubmissionOutcome::Succeeded(receipt) => *receipt,
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn happy_path_reaches_succeeded_with_all_steps_recorded() {
        let h = harness(FakeStore::default(), FakeRecords::default(), FakeCrm::default());
        let receipt = receipt(h.controller.submit(ConsentKind::IvInjection, &valid_state()).await);

        assert_eq!(receipt.first_name, "Jane");
        assert!(!receipt.critical_flag);
        assert!(receipt.page_count > 1);
        assert!(receipt.signature_url.starts_with("https://cdn.test/signatures/"));
        assert!(receipt.pdf_url.starts_with("https://cdn.test/consents/"));
        assert_eq!(receipt.record_id.as_deref(), Some("row-1"));
        assert_eq!(receipt.crm_contact_id.as_deref(), Some("contact-1"));

        let puts = h.store.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0].1, "image/png");
        assert_eq!(puts[1].1, "application/pdf");

        let rows = h.records.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].consent_given);
        assert_eq!(
            rows[0].additional_data.health_screening["g6pdCritical"],
            false
        );

        assert_eq!(h.crm.contacts.lock().unwrap().len(), 1);
        assert_eq!(h.crm.notes.lock().unwrap().len(), 1);
        assert_eq!(
            h.crm.tags.lock().unwrap()[0].1,
            vec!["iv-signed".to_string()]
        );

        let attached = h.records.attached.lock().unwrap();
        assert_eq!(attached.len(), 1);
        assert_eq!(attached[0].0, RecordId("row-1".into()));
        assert_eq!(
            attached[0].1.crm_contact_id.as_deref(),
            Some("contact-1")
        );
    }

    #[tokio::test]
    async fn critical_answer_propagates_to_record_and_note() {
        let h = harness(FakeStore::default(), FakeRecords::default(), FakeCrm::default());
        let mut state = valid_state();
        state.set_answer(ScreeningKey::G6pd, ScreeningAnswer::Unsure);

        let receipt = receipt(h.controller.submit(ConsentKind::IvInjection, &state).await);
        assert!(receipt.critical_flag);

        let rows = h.records.rows.lock().unwrap();
        assert_eq!(
            rows[0].additional_data.health_screening["g6pdCritical"],
            true
        );
        let notes = h.crm.notes.lock().unwrap();
        assert!(notes[0].1.contains("G6PD ALERT"));
    }

    #[tokio::test]
    async fn invalid_form_touches_no_collaborator() {
        let h = harness(FakeStore::default(), FakeRecords::default(), FakeCrm::default());
        let outcome = h
            .controller
            .submit(ConsentKind::IvInjection, &FormState::default())
            .await;

        match outcome {
            SubmissionOutcome::Invalid { errors } => {
                assert_eq!(errors.len(), 16);
                assert_eq!(errors.last().unwrap(), "Signature");
            }
            other => panic!("expected invalid, got {other:?}"),
        }
        assert!(h.store.puts.lock().unwrap().is_empty());
        assert!(h.records.rows.lock().unwrap().is_empty());
        assert!(h.crm.contacts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_uploads_degrade_to_empty_urls_and_still_succeed() {
        let h = harness(
            FakeStore {
                fail: true,
                ..FakeStore::default()
            },
            FakeRecords::default(),
            FakeCrm::default(),
        );
        let receipt = receipt(h.controller.submit(ConsentKind::IvInjection, &valid_state()).await);

        assert_eq!(receipt.signature_url, "");
        assert_eq!(receipt.pdf_url, "");

        let rows = h.records.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].signature_url, "");
        assert_eq!(rows[0].pdf_url, "");
        // CRM sync still attempted.
        assert_eq!(h.crm.contacts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn undecodable_signature_fails_without_reaching_uploads() {
        let h = harness(FakeStore::default(), FakeRecords::default(), FakeCrm::default());
        let mut state = valid_state();
        state.signature_data = "data:image/png;base64,@@@not-base64@@@".into();

        let outcome = h.controller.submit(ConsentKind::IvInjection, &state).await;
        match outcome {
            SubmissionOutcome::Failed { message } => {
                assert_eq!(message, GENERIC_ERROR);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(h.store.puts.lock().unwrap().is_empty());
        assert!(h.records.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_is_non_fatal_and_skips_the_patch() {
        let h = harness(
            FakeStore::default(),
            FakeRecords {
                fail_insert: true,
                ..FakeRecords::default()
            },
            FakeCrm::default(),
        );
        let receipt = receipt(h.controller.submit(ConsentKind::IvInjection, &valid_state()).await);

        assert!(receipt.record_id.is_none());
        assert_eq!(receipt.crm_contact_id.as_deref(), Some("contact-1"));
        assert!(h.records.attached.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn crm_failure_is_non_fatal_and_skips_note_tags_and_patch() {
        let h = harness(
            FakeStore::default(),
            FakeRecords::default(),
            FakeCrm {
                fail_upsert: true,
                ..FakeCrm::default()
            },
        );
        let receipt = receipt(h.controller.submit(ConsentKind::IvInjection, &valid_state()).await);

        assert!(receipt.crm_contact_id.is_none());
        assert_eq!(receipt.record_id.as_deref(), Some("row-1"));
        assert!(h.crm.notes.lock().unwrap().is_empty());
        assert!(h.crm.tags.lock().unwrap().is_empty());
        assert!(h.records.attached.lock().unwrap().is_empty());
    }
}
