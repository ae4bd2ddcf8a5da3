//! The form state store.
//!
//! [`FormState`] holds the current values of the identity fields, the
//! screening answers with their detail text, the acknowledgment ticks and
//! the raw signature payload. It is the single source of truth for the
//! rest of the pipeline: the validation engine, the safety-flag evaluator
//! and the submission builder are all pure functions over a snapshot of
//! this store, and every mutation goes through the setters here.
//!
//! The serde shape mirrors the browser payload field-for-field (camelCase
//! identity fields, `screening` keyed by question, `acknowledgments` as an
//! ordered tick list, `signatureData` as a data URL), so the HTTP layer
//! can deserialize a request body straight into a `FormState`.

use consent_types::{ScreeningAnswer, ScreeningKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored answer and detail text for one screening question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreeningEntry {
    #[serde(default)]
    pub answer: Option<ScreeningAnswer>,
    #[serde(default)]
    pub detail: String,
}

/// One acknowledgment checkbox as ticked (or not) on the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgmentTick {
    pub id: String,
    pub checked: bool,
}

/// Current state of the intake form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: String,
    pub screening: BTreeMap<ScreeningKey, ScreeningEntry>,
    pub acknowledgments: Vec<AcknowledgmentTick>,
    pub signature_data: String,
}

impl FormState {
    /// Records an answer for a screening question.
    ///
    /// Previously entered detail text is deliberately left in place: a
    /// patient who answers Yes, types an explanation, then switches to No
    /// has still told us something, and that text is carried into the
    /// generated document and the persisted record rather than silently
    /// discarded.
    pub fn set_answer(&mut self, key: ScreeningKey, answer: ScreeningAnswer) {
        self.screening.entry(key).or_default().answer = Some(answer);
    }

    /// Records detail text for a screening question.
    pub fn set_detail(&mut self, key: ScreeningKey, detail: impl Into<String>) {
        self.screening.entry(key).or_default().detail = detail.into();
    }

    /// Current answer for a question, if one has been selected.
    pub fn answer(&self, key: ScreeningKey) -> Option<ScreeningAnswer> {
        self.screening.get(&key).and_then(|entry| entry.answer)
    }

    /// Current detail text for a question (possibly stale, see
    /// [`FormState::set_answer`]).
    pub fn detail(&self, key: ScreeningKey) -> &str {
        self.screening
            .get(&key)
            .map(|entry| entry.detail.as_str())
            .unwrap_or("")
    }

    /// Whether the detail field for a question should currently be shown.
    ///
    /// Display toggle only: visibility never gates validation, and hiding
    /// a field does not clear its text.
    pub fn detail_visible(&self, key: ScreeningKey) -> bool {
        key.has_detail_field()
            && self
                .answer(key)
                .is_some_and(ScreeningAnswer::is_affirmative)
    }

    /// The questions whose detail fields are currently visible.
    pub fn visible_detail_fields(&self) -> Vec<ScreeningKey> {
        ScreeningKey::ALL
            .into_iter()
            .filter(|key| self.detail_visible(*key))
            .collect()
    }

    /// Sets an acknowledgment checkbox.
    pub fn set_acknowledgment(&mut self, id: impl Into<String>, checked: bool) {
        let id = id.into();
        match self.acknowledgments.iter_mut().find(|t| t.id == id) {
            Some(tick) => tick.checked = checked,
            None => self.acknowledgments.push(AcknowledgmentTick { id, checked }),
        }
    }

    /// Whether an acknowledgment has been ticked.
    pub fn acknowledgment_checked(&self, id: &str) -> bool {
        self.acknowledgments
            .iter()
            .any(|tick| tick.id == id && tick.checked)
    }
}
