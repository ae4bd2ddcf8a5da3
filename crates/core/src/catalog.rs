//! Versioned consent catalogs.
//!
//! The screening questions, the risk-disclosure list and the acknowledgment
//! statements are a fixed, versioned catalog consumed by both the public
//! form (served over `GET /consents/{kind}/catalog`) and the document
//! assembler. Because both sides read the same catalog, the rendered
//! document always matches exactly what the patient was shown and ticked.

use consent_types::{ConsentKind, ScreeningKey};
use serde::Serialize;

/// Catalog revision stamp. Bump when any statement text changes so that
/// stored submissions can be traced back to the wording in force.
pub const CATALOG_VERSION: &str = "2026-02";

/// One health-screening question as presented on the form.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningQuestion {
    pub key: ScreeningKey,
    /// Full question text.
    pub prompt: &'static str,
    /// Safety note shown under the question, if any.
    pub note: Option<&'static str>,
    /// Prompt for the conditional detail field, if the question has one.
    pub detail_prompt: Option<&'static str>,
}

/// One legal statement the patient must individually acknowledge.
#[derive(Debug, Clone, Serialize)]
pub struct AcknowledgmentStatement {
    pub id: &'static str,
    pub text: &'static str,
}

/// The complete catalog for one consent kind.
#[derive(Debug, Clone)]
pub struct ConsentCatalog {
    kind: ConsentKind,
    version: &'static str,
    treatment_description: &'static [&'static str],
    risk_disclosures: &'static [&'static str],
    screening: &'static [ScreeningQuestion],
    acknowledgments: &'static [AcknowledgmentStatement],
}

impl ConsentCatalog {
    /// Resolves the catalog for a consent kind.
    pub fn for_kind(kind: ConsentKind) -> Self {
        match kind {
            ConsentKind::IvInjection => Self::iv_injection(),
        }
    }

    /// The IV & Injection Therapy catalog.
    pub fn iv_injection() -> Self {
        Self {
            kind: ConsentKind::IvInjection,
            version: CATALOG_VERSION,
            treatment_description: IV_TREATMENT_DESCRIPTION,
            risk_disclosures: IV_RISK_DISCLOSURES,
            screening: IV_SCREENING,
            acknowledgments: IV_ACKNOWLEDGMENTS,
        }
    }

    pub fn kind(&self) -> ConsentKind {
        self.kind
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn treatment_description(&self) -> &'static [&'static str] {
        self.treatment_description
    }

    pub fn risk_disclosures(&self) -> &'static [&'static str] {
        self.risk_disclosures
    }

    pub fn screening(&self) -> &'static [ScreeningQuestion] {
        self.screening
    }

    pub fn acknowledgments(&self) -> &'static [AcknowledgmentStatement] {
        self.acknowledgments
    }

    /// Looks up an acknowledgment statement by id.
    pub fn statement(&self, id: &str) -> Option<&AcknowledgmentStatement> {
        self.acknowledgments.iter().find(|s| s.id == id)
    }
}

const IV_TREATMENT_DESCRIPTION: &[&str] = &[
    "Intravenous (IV) therapy involves the administration of fluids, vitamins, minerals, \
     amino acids, and other therapeutic substances directly into the bloodstream through a \
     peripheral venous catheter. Injection therapy involves the intramuscular (IM) or \
     subcutaneous (SubQ) administration of vitamins, peptides, medications, or other \
     therapeutic agents.",
    "These therapies are provided for wellness optimization, nutrient repletion, hydration \
     support, immune function, athletic recovery, and general well-being. IV and injection \
     therapies offered by Range Medical are classified as elective wellness services and are \
     not intended to diagnose, treat, cure, or prevent any disease.",
];

const IV_RISK_DISCLOSURES: &[&str] = &[
    "Pain, bruising, swelling, redness, or tenderness at the injection or IV insertion site",
    "Infiltration or extravasation (leakage of fluid into surrounding tissue)",
    "Phlebitis (inflammation of the vein), thrombophlebitis, or localized infection",
    "Hematoma formation at the venipuncture site",
    "Allergic or hypersensitivity reactions to administered substances, including anaphylaxis \
     in rare cases",
    "Vasovagal response (lightheadedness, dizziness, nausea, or fainting)",
    "Air embolism (extremely rare with standard protocols)",
    "Nerve irritation or injury near the injection site",
    "Fluid overload, electrolyte imbalance, or alterations in blood chemistry",
    "Hemolytic crisis in patients with undiagnosed or undisclosed G6PD deficiency receiving \
     high-dose Vitamin C",
    "Adverse drug interactions with current medications or supplements",
    "Cardiac arrhythmia associated with rapid electrolyte infusion (rare)",
    "Systemic infection or sepsis if sterile technique is compromised (extremely rare)",
    "Unforeseen complications or side effects not listed above",
];

const IV_SCREENING: &[ScreeningQuestion] = &[
    ScreeningQuestion {
        key: ScreeningKey::G6pd,
        prompt: "Do you have G6PD (Glucose-6-Phosphate Dehydrogenase) deficiency?",
        note: Some(
            "This is critical for your safety. High-dose Vitamin C is contraindicated in \
             patients with G6PD deficiency and may cause a life-threatening hemolytic crisis.",
        ),
        detail_prompt: Some("Please provide details:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::Allergies,
        prompt: "Do you have any known allergies to medications, vitamins, minerals, foods, \
                 latex, or adhesives?",
        note: None,
        detail_prompt: Some("Please list all allergies and reactions:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::Pregnant,
        prompt: "Are you currently pregnant or nursing?",
        note: None,
        detail_prompt: None,
    },
    ScreeningQuestion {
        key: ScreeningKey::Medications,
        prompt: "Are you currently taking any prescription medications, over-the-counter \
                 medications, or supplements?",
        note: None,
        detail_prompt: Some("Please list all medications and supplements:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::HeartCondition,
        prompt: "Have you been diagnosed with any heart or cardiovascular condition?",
        note: None,
        detail_prompt: Some("Please describe:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::KidneyLiver,
        prompt: "Have you been diagnosed with kidney disease or liver disease?",
        note: None,
        detail_prompt: Some("Please describe:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::Diabetes,
        prompt: "Have you been diagnosed with diabetes (Type 1, Type 2, or gestational)?",
        note: None,
        detail_prompt: Some("Please describe:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::Bleeding,
        prompt: "Do you have a known bleeding disorder or are you taking blood thinners \
                 (e.g., warfarin, Eliquis, Xarelto)?",
        note: None,
        detail_prompt: Some("Please describe:"),
    },
    ScreeningQuestion {
        key: ScreeningKey::RecentSurgery,
        prompt: "Have you had any surgical procedure within the past 30 days?",
        note: None,
        detail_prompt: Some("Please describe:"),
    },
];

const IV_ACKNOWLEDGMENTS: &[AcknowledgmentStatement] = &[
    AcknowledgmentStatement {
        id: "ack1",
        text: "I understand that IV and injection therapies provided by Range Medical are \
               elective wellness services. These services are not intended to diagnose, treat, \
               cure, or prevent any disease, medical condition, or pathology. I acknowledge \
               that these therapies do not replace evaluation, diagnosis, or treatment by my \
               primary care physician or any specialist.",
    },
    AcknowledgmentStatement {
        id: "ack2",
        text: "I understand that individual results from IV and injection therapy vary and are \
               not guaranteed. Range Medical makes no representations, warranties, or \
               guarantees regarding the specific outcomes, efficacy, or therapeutic benefit of \
               any treatment administered.",
    },
    AcknowledgmentStatement {
        id: "ack3",
        text: "I have been informed of the risks and potential complications associated with \
               IV and injection therapy, as detailed in the Risks & Potential Complications \
               section above. I accept these risks voluntarily and understand that \
               complications may occur even when all procedures are performed correctly and \
               with appropriate medical oversight.",
    },
    AcknowledgmentStatement {
        id: "ack4",
        text: "I confirm that I have disclosed all relevant medical history, current \
               medications (including over-the-counter drugs and supplements), known \
               allergies, and pre-existing health conditions to Range Medical staff. I \
               understand that failure to disclose accurate and complete medical information \
               may compromise the safety of my treatment and that Range Medical shall not be \
               held liable for complications arising from undisclosed medical information.",
    },
    AcknowledgmentStatement {
        id: "ack5",
        text: "I understand that some substances administered via IV or injection may be used \
               in an off-label capacity. Off-label use refers to the medically accepted \
               practice of using FDA-approved substances for purposes, dosages, or routes of \
               administration not specifically included in the FDA-approved labeling. I \
               consent to such off-label use when recommended by Range Medical's clinical \
               staff.",
    },
    AcknowledgmentStatement {
        id: "ack6",
        text: "I acknowledge that IV and injection therapy is not a substitute for routine \
               medical care. I understand that I should continue to see my primary care \
               physician and any specialists for the management of existing health \
               conditions, preventive care, and medical concerns unrelated to the wellness \
               services provided by Range Medical.",
    },
    AcknowledgmentStatement {
        id: "ack7",
        text: "I agree to immediately notify Range Medical staff during or after treatment if \
               I experience any adverse reaction, unusual symptoms, discomfort, or change in \
               my condition, including but not limited to difficulty breathing, chest pain, \
               severe headache, swelling, rash, or any symptom that concerns me.",
    },
    AcknowledgmentStatement {
        id: "ack8",
        text: "I understand that I have the right to refuse or discontinue treatment at any \
               time without penalty. I acknowledge that refusing or discontinuing treatment \
               may affect the anticipated outcome of the therapy.",
    },
    AcknowledgmentStatement {
        id: "ack9",
        text: "I voluntarily assume full responsibility for any risks associated with the IV \
               and/or injection therapy services I receive at Range Medical. I release, \
               discharge, and hold harmless Range Medical, its medical director, physicians, \
               nurse practitioners, registered nurses, medical assistants, staff, and \
               affiliated entities from any and all claims, liabilities, damages, or causes of \
               action arising out of or related to the services provided, except in cases of \
               gross negligence or willful misconduct.",
    },
    AcknowledgmentStatement {
        id: "ack10",
        text: "I acknowledge that I am financially responsible for all services rendered. I \
               understand that IV and injection therapy services are generally not covered by \
               health insurance, and that payment is due at the time of service. Refunds are \
               not provided for completed treatments.",
    },
    AcknowledgmentStatement {
        id: "ack11",
        text: "I authorize Range Medical to contact me via phone, text message, and/or email \
               at the contact information provided above for purposes related to my care, \
               including appointment reminders, follow-up communications, and health-related \
               information.",
    },
    AcknowledgmentStatement {
        id: "ack12",
        text: "I confirm that I am at least 18 years of age (or that the consent of a \
               parent/legal guardian has been obtained), that I have read this consent form in \
               its entirety, that I have had the opportunity to ask questions, and that I am \
               signing this form voluntarily and of my own free will.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn iv_catalog_has_nine_questions_in_form_order() {
        let catalog = ConsentCatalog::iv_injection();
        let keys: Vec<ScreeningKey> = catalog.screening().iter().map(|q| q.key).collect();
        assert_eq!(keys, ScreeningKey::ALL.to_vec());
    }

    #[test]
    fn iv_catalog_acknowledgment_ids_are_unique_and_non_blank() {
        let catalog = ConsentCatalog::iv_injection();
        let mut seen = HashSet::new();
        for statement in catalog.acknowledgments() {
            assert!(!statement.id.trim().is_empty());
            assert!(!statement.text.trim().is_empty());
            assert!(seen.insert(statement.id), "duplicate id {}", statement.id);
        }
        assert_eq!(catalog.acknowledgments().len(), 12);
    }

    #[test]
    fn detail_prompts_match_key_detail_fields() {
        let catalog = ConsentCatalog::iv_injection();
        for question in catalog.screening() {
            assert_eq!(
                question.detail_prompt.is_some(),
                question.key.has_detail_field(),
                "{:?} detail prompt does not match its detail field",
                question.key
            );
        }
    }

    #[test]
    fn statement_lookup_finds_by_id() {
        let catalog = ConsentCatalog::iv_injection();
        assert!(catalog.statement("ack12").is_some());
        assert!(catalog.statement("ack13").is_none());
    }

    #[test]
    fn risk_list_is_the_full_disclosure() {
        let catalog = ConsentCatalog::iv_injection();
        assert_eq!(catalog.risk_disclosures().len(), 14);
    }
}
