//! Shared vocabulary for the consent intake pipeline.
//!
//! These types are the wire-level and domain-level constants every other
//! crate agrees on: the screening answer options, the fixed set of
//! screening question keys, and the consent-type discriminator. Keeping
//! them in one small crate means the form state, the generated document,
//! the persisted record and the CRM payload can never disagree about a
//! field name.

use serde::{Deserialize, Serialize};

/// Errors raised when parsing wire values into the shared vocabulary.
#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    /// The string did not name a known consent type.
    #[error("unknown consent type: {0}")]
    UnknownConsentKind(String),
}

/// One answer to a health-screening question.
///
/// Serialized exactly as the intake form submits it (`"Yes"`, `"No"`,
/// `"Unsure"`, `"N/A"`), so responses round-trip unchanged into the
/// persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreeningAnswer {
    Yes,
    No,
    Unsure,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl ScreeningAnswer {
    /// The label shown on the form and reproduced in the document.
    pub fn as_str(self) -> &'static str {
        match self {
            ScreeningAnswer::Yes => "Yes",
            ScreeningAnswer::No => "No",
            ScreeningAnswer::Unsure => "Unsure",
            ScreeningAnswer::NotApplicable => "N/A",
        }
    }

    /// Whether this answer opens the supplementary detail field and, on the
    /// critical question, raises the safety flag.
    pub fn is_affirmative(self) -> bool {
        matches!(self, ScreeningAnswer::Yes | ScreeningAnswer::Unsure)
    }
}

impl std::fmt::Display for ScreeningAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of one of the nine health-screening questions, in form order.
///
/// The serde names are the original intake form's field names; they are
/// used as JSON object keys in the submitted form and inside the persisted
/// record's `health_screening` payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ScreeningKey {
    G6pd,
    Allergies,
    Pregnant,
    Medications,
    HeartCondition,
    KidneyLiver,
    Diabetes,
    Bleeding,
    RecentSurgery,
}

impl ScreeningKey {
    /// All nine questions in the order they appear on the form and in the
    /// generated document.
    pub const ALL: [ScreeningKey; 9] = [
        ScreeningKey::G6pd,
        ScreeningKey::Allergies,
        ScreeningKey::Pregnant,
        ScreeningKey::Medications,
        ScreeningKey::HeartCondition,
        ScreeningKey::KidneyLiver,
        ScreeningKey::Diabetes,
        ScreeningKey::Bleeding,
        ScreeningKey::RecentSurgery,
    ];

    /// Wire name of the answer field (`g6pd`, `heartCondition`, ...).
    pub fn wire_name(self) -> &'static str {
        match self {
            ScreeningKey::G6pd => "g6pd",
            ScreeningKey::Allergies => "allergies",
            ScreeningKey::Pregnant => "pregnant",
            ScreeningKey::Medications => "medications",
            ScreeningKey::HeartCondition => "heartCondition",
            ScreeningKey::KidneyLiver => "kidneyLiver",
            ScreeningKey::Diabetes => "diabetes",
            ScreeningKey::Bleeding => "bleeding",
            ScreeningKey::RecentSurgery => "recentSurgery",
        }
    }

    /// Wire name of the optional detail field, where the question has one.
    pub fn detail_wire_name(self) -> Option<&'static str> {
        match self {
            ScreeningKey::G6pd => Some("g6pdDetails"),
            ScreeningKey::Allergies => Some("allergyDetails"),
            ScreeningKey::Pregnant => None,
            ScreeningKey::Medications => Some("medicationDetails"),
            ScreeningKey::HeartCondition => Some("heartDetails"),
            ScreeningKey::KidneyLiver => Some("kidneyLiverDetails"),
            ScreeningKey::Diabetes => Some("diabetesDetails"),
            ScreeningKey::Bleeding => Some("bleedingDetails"),
            ScreeningKey::RecentSurgery => Some("surgeryDetails"),
        }
    }

    /// Short label used in the document's screening summary.
    pub fn summary_label(self) -> &'static str {
        match self {
            ScreeningKey::G6pd => "G6PD Deficiency",
            ScreeningKey::Allergies => "Known Allergies",
            ScreeningKey::Pregnant => "Pregnant or Nursing",
            ScreeningKey::Medications => "Current Medications",
            ScreeningKey::HeartCondition => "Heart Condition",
            ScreeningKey::KidneyLiver => "Kidney/Liver Disease",
            ScreeningKey::Diabetes => "Diabetes",
            ScreeningKey::Bleeding => "Bleeding Disorder",
            ScreeningKey::RecentSurgery => "Recent Surgery (past 30 days)",
        }
    }

    /// Label reported by the validation engine when the question is
    /// unanswered.
    pub fn question_label(self) -> &'static str {
        match self {
            ScreeningKey::G6pd => "G6PD deficiency question",
            ScreeningKey::Allergies => "Allergies question",
            ScreeningKey::Pregnant => "Pregnant/nursing question",
            ScreeningKey::Medications => "Medications question",
            ScreeningKey::HeartCondition => "Heart condition question",
            ScreeningKey::KidneyLiver => "Kidney/liver question",
            ScreeningKey::Diabetes => "Diabetes question",
            ScreeningKey::Bleeding => "Bleeding disorder question",
            ScreeningKey::RecentSurgery => "Recent surgery question",
        }
    }

    /// Answer options offered for this question, in display order.
    pub fn allowed_answers(self) -> &'static [ScreeningAnswer] {
        match self {
            ScreeningKey::G6pd => &[
                ScreeningAnswer::Yes,
                ScreeningAnswer::No,
                ScreeningAnswer::Unsure,
            ],
            ScreeningKey::Pregnant => &[
                ScreeningAnswer::Yes,
                ScreeningAnswer::No,
                ScreeningAnswer::NotApplicable,
            ],
            _ => &[ScreeningAnswer::Yes, ScreeningAnswer::No],
        }
    }

    /// Whether this question carries a free-text detail field.
    pub fn has_detail_field(self) -> bool {
        self.detail_wire_name().is_some()
    }

    /// Whether an affirmative answer to this question raises the safety
    /// flag (high-dose Vitamin C contraindication).
    pub fn is_critical(self) -> bool {
        matches!(self, ScreeningKey::G6pd)
    }
}

/// Discriminator for the consent form variant a submission belongs to.
///
/// Carried into the persisted row (`consent_type`), the artifact names and
/// the CRM payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsentKind {
    #[serde(rename = "iv-injection")]
    IvInjection,
}

impl ConsentKind {
    /// Slug stored in the database row and embedded in the document
    /// artifact name.
    pub fn slug(self) -> &'static str {
        match self {
            ConsentKind::IvInjection => "iv-injection",
        }
    }

    /// Human-readable treatment title.
    pub fn title(self) -> &'static str {
        match self {
            ConsentKind::IvInjection => "IV & Injection Therapy",
        }
    }

    /// Short code used as the CRM payload's `consentType`.
    pub fn crm_code(self) -> &'static str {
        match self {
            ConsentKind::IvInjection => "iv",
        }
    }

    /// Segmentation tag applied to the CRM contact after a signed consent.
    pub fn signed_tag(self) -> &'static str {
        match self {
            ConsentKind::IvInjection => "iv-signed",
        }
    }

    /// Classification line stamped in the running document footer.
    pub fn classification(self) -> &'static str {
        match self {
            ConsentKind::IvInjection => "CONFIDENTIAL — IV & Injection Therapy Informed Consent",
        }
    }
}

impl std::fmt::Display for ConsentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for ConsentKind {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iv-injection" => Ok(ConsentKind::IvInjection),
            other => Err(VocabularyError::UnknownConsentKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_serializes_to_form_labels() {
        assert_eq!(
            serde_json::to_string(&ScreeningAnswer::Yes).unwrap(),
            "\"Yes\""
        );
        assert_eq!(
            serde_json::to_string(&ScreeningAnswer::NotApplicable).unwrap(),
            "\"N/A\""
        );
        let parsed: ScreeningAnswer = serde_json::from_str("\"Unsure\"").unwrap();
        assert_eq!(parsed, ScreeningAnswer::Unsure);
    }

    #[test]
    fn affirmative_answers_are_yes_and_unsure() {
        assert!(ScreeningAnswer::Yes.is_affirmative());
        assert!(ScreeningAnswer::Unsure.is_affirmative());
        assert!(!ScreeningAnswer::No.is_affirmative());
        assert!(!ScreeningAnswer::NotApplicable.is_affirmative());
    }

    #[test]
    fn key_serializes_to_wire_name() {
        for key in ScreeningKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.wire_name()));
        }
    }

    #[test]
    fn only_g6pd_is_critical() {
        let critical: Vec<ScreeningKey> = ScreeningKey::ALL
            .into_iter()
            .filter(|k| k.is_critical())
            .collect();
        assert_eq!(critical, vec![ScreeningKey::G6pd]);
    }

    #[test]
    fn pregnant_has_no_detail_field() {
        assert!(!ScreeningKey::Pregnant.has_detail_field());
        for key in ScreeningKey::ALL {
            if key != ScreeningKey::Pregnant {
                assert!(key.has_detail_field(), "{key:?} should carry a detail field");
            }
        }
    }

    #[test]
    fn consent_kind_round_trips_through_slug() {
        let kind: ConsentKind = "iv-injection".parse().unwrap();
        assert_eq!(kind, ConsentKind::IvInjection);
        assert_eq!(kind.to_string(), "iv-injection");
        assert!("hyperbaric".parse::<ConsentKind>().is_err());
    }
}
