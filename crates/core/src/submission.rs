//! The consent submission aggregate.
//!
//! A [`ConsentSubmission`] is built exactly once, from a form-state
//! snapshot that has already passed validation, and is read-only from then
//! on. Downstream components (document assembler, uploader, persistence,
//! CRM sync) all consume this one value; none of them reach back into the
//! mutable form state.

use crate::catalog::ConsentCatalog;
use crate::error::{ConsentError, ConsentResult};
use crate::form::FormState;
use crate::safety;
use crate::signature::SignatureImage;
use crate::validation;
use chrono::{DateTime, Utc};
use consent_types::{ConsentKind, ScreeningAnswer, ScreeningKey};
use uuid::Uuid;

/// The patient identity fields as entered on the form, trimmed.
#[derive(Debug, Clone)]
pub struct PatientIdentity {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
}

impl PatientIdentity {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Uppercased first-letter-of-first-name plus first-letter-of-last-name,
    /// stamped into each checked acknowledgment glyph as an auditable mark
    /// distinct from the drawn signature.
    pub fn initials(&self) -> String {
        let mut initials = String::new();
        for name in [&self.first_name, &self.last_name] {
            if let Some(c) = name.chars().next() {
                initials.extend(c.to_uppercase());
            }
        }
        initials
    }
}

/// One answered screening question within a submission.
#[derive(Debug, Clone)]
pub struct ScreeningResponse {
    pub key: ScreeningKey,
    pub answer: ScreeningAnswer,
    /// Detail text, if any was entered. Present even when the final answer
    /// would hide the detail field on the form.
    pub detail: Option<String>,
    /// Derived flag; true only on a critical question answered Yes/Unsure.
    pub critical: bool,
}

/// One acknowledgment statement with its catalog text and checked state.
#[derive(Debug, Clone)]
pub struct AcknowledgedStatement {
    pub id: String,
    pub text: String,
    pub checked: bool,
}

/// The aggregate root: one completed, validated consent form.
#[derive(Debug, Clone)]
pub struct ConsentSubmission {
    pub id: Uuid,
    pub kind: ConsentKind,
    pub identity: PatientIdentity,
    pub submitted_at: DateTime<Utc>,
    /// Responses in catalog (form) order.
    pub screening: Vec<ScreeningResponse>,
    /// The full catalog with checked state; all checked on a valid
    /// submission.
    pub acknowledgments: Vec<AcknowledgedStatement>,
    pub signature: SignatureImage,
    pub critical_flag: bool,
}

impl ConsentSubmission {
    /// Builds the immutable submission from a validated form state.
    ///
    /// # Errors
    ///
    /// - [`ConsentError::NotValidated`] when the snapshot still has
    ///   validation errors (callers must run the validation engine first);
    /// - a signature error when the payload cannot be decoded. This is the
    ///   fatal assembly-time class: the form passed validation, but no
    ///   document can be produced from it.
    pub fn from_validated(
        state: &FormState,
        catalog: &ConsentCatalog,
        submitted_at: DateTime<Utc>,
    ) -> ConsentResult<Self> {
        let report = validation::validate(state, catalog);
        if !report.is_valid() {
            return Err(ConsentError::NotValidated(report.errors.len()));
        }

        let signature = SignatureImage::from_data_url(&state.signature_data)?;

        let mut screening = Vec::with_capacity(catalog.screening().len());
        for question in catalog.screening() {
            let answer = state.answer(question.key).ok_or_else(|| {
                ConsentError::InvalidInput(format!(
                    "screening question {} lost its answer",
                    question.key.wire_name()
                ))
            })?;
            let detail = match state.detail(question.key).trim() {
                "" => None,
                text => Some(text.to_string()),
            };
            screening.push(ScreeningResponse {
                key: question.key,
                answer,
                detail,
                critical: question.key.is_critical()
                    && safety::answer_raises_flag(Some(answer)),
            });
        }

        let acknowledgments = catalog
            .acknowledgments()
            .iter()
            .map(|statement| AcknowledgedStatement {
                id: statement.id.to_string(),
                text: statement.text.to_string(),
                checked: state.acknowledgment_checked(statement.id),
            })
            .collect();

        Ok(Self {
            id: Uuid::new_v4(),
            kind: catalog.kind(),
            identity: PatientIdentity {
                first_name: state.first_name.trim().to_string(),
                last_name: state.last_name.trim().to_string(),
                email: state.email.trim().to_string(),
                phone: state.phone.trim().to_string(),
                date_of_birth: state.date_of_birth.trim().to_string(),
            },
            submitted_at,
            screening,
            acknowledgments,
            signature,
            critical_flag: report.critical_flag,
        })
    }

    /// Consent date as shown on the document and in the CRM note
    /// (`M/D/YYYY`).
    pub fn consent_date_display(&self) -> String {
        self.submitted_at.format("%-m/%-d/%Y").to_string()
    }

    /// Consent date as stored in the database row (`YYYY-MM-DD`).
    pub fn consent_date_iso(&self) -> String {
        self.submitted_at.format("%Y-%m-%d").to_string()
    }

    /// The critical question's response, if the catalog has one.
    pub fn critical_response(&self) -> Option<&ScreeningResponse> {
        self.screening.iter().find(|r| r.key.is_critical())
    }
}
