//! The validation engine.
//!
//! Pure function from a form-state snapshot to an ordered list of
//! human-readable problems. Every rule is evaluated independently; there
//! is no early return, so a patient sees every missing field, unanswered
//! question, unticked acknowledgment and the missing signature in a single
//! corrective pass. The report also carries the freshly evaluated safety
//! flag so callers never act on a stale one.

use crate::catalog::ConsentCatalog;
use crate::form::FormState;
use crate::safety;

/// Result of validating a form-state snapshot.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Human-readable labels of everything missing or invalid, in form
    /// order.
    pub errors: Vec<String>,
    /// Safety flag evaluated from the current critical answer.
    pub critical_flag: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Labels for the required identity fields, in form order.
const IDENTITY_FIELDS: [(&str, fn(&FormState) -> &str); 5] = [
    ("First Name", |s| &s.first_name),
    ("Last Name", |s| &s.last_name),
    ("Email", |s| &s.email),
    ("Phone", |s| &s.phone),
    ("Date of Birth", |s| &s.date_of_birth),
];

/// Validates a form-state snapshot against the catalog.
///
/// Rules, each evaluated unconditionally:
/// - every identity field present and non-blank after trimming;
/// - every screening question answered (detail text is advisory and never
///   required, even for Yes/Unsure answers);
/// - every acknowledgment in the catalog ticked, reported as one aggregate
///   error because the form marks each unticked box visually;
/// - a non-blank signature payload.
pub fn validate(state: &FormState, catalog: &ConsentCatalog) -> ValidationReport {
    let mut errors = Vec::new();

    for (label, field) in IDENTITY_FIELDS {
        if field(state).trim().is_empty() {
            errors.push(label.to_string());
        }
    }

    for question in catalog.screening() {
        if state.answer(question.key).is_none() {
            errors.push(question.key.question_label().to_string());
        }
    }

    let all_acknowledged = catalog
        .acknowledgments()
        .iter()
        .all(|statement| state.acknowledgment_checked(statement.id));
    if !all_acknowledged {
        errors.push("All acknowledgment checkboxes".to_string());
    }

    if state.signature_data.trim().is_empty() {
        errors.push("Signature".to_string());
    }

    ValidationReport {
        errors,
        critical_flag: safety::critical_flag(state),
    }
}
