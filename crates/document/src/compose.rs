//! Composition of the consent document plan.
//!
//! Section order is fixed and is itself part of the contract: identity
//! banner, patient information, treatment description, screening responses
//! (with the safety alert when flagged), the risk-disclosure list, the
//! acknowledgment list, and finally the signature block. A compliance
//! document must present risks before it presents the signature.

use crate::layout::{
    max_chars, wrap_text, Block, Composer, DocumentPlan, FooterPlan, BANNER_CONTENT_START,
    CONTENT_WIDTH,
};
use consent_core::{ClinicIdentity, ConsentCatalog, ConsentSubmission};

/// Alert text inserted after the screening summary when the safety flag is
/// raised. Not optional: this and the CRM flag are the two mandatory
/// consequences of a critical answer.
const G6PD_ALERT_TEXT: &str = "G6PD ALERT: Patient reported G6PD deficiency or uncertain \
     status. High-dose Vitamin C IV is contraindicated. Staff must confirm G6PD status via \
     lab work before administering any Vitamin C-containing IV formulations.";

/// Width of the embedded signature raster box, mm.
const SIGNATURE_WIDTH: f32 = 60.0;
/// Height of the embedded signature raster box, mm.
const SIGNATURE_HEIGHT: f32 = 25.0;

fn paragraph(text: &str, size: f32) -> Block {
    Block::Paragraph {
        lines: wrap_text(text, max_chars(size, CONTENT_WIDTH)),
        size,
        bold: false,
    }
}

fn label_value(label: &str, value: impl Into<String>) -> Block {
    Block::LabelValue {
        label: label.to_string(),
        value: value.into(),
    }
}

/// Composes the full document plan for a validated submission.
pub fn compose(submission: &ConsentSubmission, clinic: &ClinicIdentity) -> DocumentPlan {
    let catalog = ConsentCatalog::for_kind(submission.kind);
    let consent_date = submission.consent_date_display();
    let initials = submission.identity.initials();

    let mut composer = Composer::new();

    // Banner pins the top of page one.
    composer.set_cursor(0.0);
    composer.push(Block::Banner {
        clinic_name: clinic.name.to_uppercase(),
        subtitle: format!("{} — Informed Consent", submission.kind.title()),
        date_line: format!("Document Date: {consent_date}"),
        address: clinic.address.clone(),
    });
    composer.set_cursor(BANNER_CONTENT_START);

    composer.push(Block::SectionHeader("Patient Information".to_string()));
    composer.push(label_value(
        "Patient Name: ",
        submission.identity.full_name(),
    ));
    composer.push(label_value(
        "Date of Birth: ",
        submission.identity.date_of_birth.clone(),
    ));
    composer.push(label_value("Email: ", submission.identity.email.clone()));
    composer.push(label_value("Phone: ", submission.identity.phone.clone()));
    composer.push(label_value("Consent Date: ", consent_date.clone()));
    composer.gap(2.0);

    composer.push(Block::SectionHeader(format!(
        "Description of {}",
        submission.kind.title()
    )));
    for text in catalog.treatment_description() {
        composer.push(paragraph(text, 8.5));
        composer.gap(2.0);
    }

    composer.push(Block::SectionHeader(
        "Health Screening Responses".to_string(),
    ));
    for response in &submission.screening {
        let mut value = response.answer.to_string();
        if let Some(detail) = &response.detail {
            value.push_str(" — ");
            value.push_str(detail);
        }
        composer.push(label_value(
            &format!("{}: ", response.key.summary_label()),
            value,
        ));
    }
    if submission.critical_flag {
        composer.gap(2.0);
        composer.push(Block::Alert {
            lines: wrap_text(G6PD_ALERT_TEXT, max_chars(8.0, CONTENT_WIDTH - 6.0)),
        });
    }
    composer.gap(2.0);

    composer.push(Block::SectionHeader(
        "Risks & Potential Complications".to_string(),
    ));
    composer.push(paragraph(
        "The following risks and potential complications have been disclosed to the patient. \
         IV and injection therapy, while generally well-tolerated, carries inherent medical \
         risks including but not limited to:",
        8.5,
    ));
    composer.gap(1.0);
    for risk in catalog.risk_disclosures() {
        composer.push(Block::Bullet {
            lines: wrap_text(&format!("• {risk}"), max_chars(8.0, CONTENT_WIDTH - 5.0)),
        });
    }
    composer.gap(2.0);

    composer.push(Block::SectionHeader(
        "Patient Acknowledgments & Agreement".to_string(),
    ));
    composer.push(paragraph(
        "By signing below, the patient affirms that each of the following statements has been \
         read, understood, and individually acknowledged:",
        8.5,
    ));
    composer.gap(3.0);
    for statement in &submission.acknowledgments {
        composer.push(Block::Checkbox {
            lines: wrap_text(&statement.text, max_chars(8.0, CONTENT_WIDTH - 10.0)),
            checked: statement.checked,
            initials: initials.clone(),
        });
    }
    composer.gap(4.0);

    composer.push(Block::SectionHeader("Patient Signature".to_string()));
    composer.push(paragraph(
        "By affixing my signature below, I certify that I have read this consent form in its \
         entirety, that all of my questions have been answered to my satisfaction, and that I \
         voluntarily consent to the services described herein.",
        8.5,
    ));
    composer.gap(3.0);
    composer.push(label_value("Signed by: ", submission.identity.full_name()));
    composer.push(label_value("Date: ", consent_date));
    composer.gap(2.0);
    composer.push(Block::Signature {
        width: SIGNATURE_WIDTH,
        height: SIGNATURE_HEIGHT,
    });

    composer.finish(FooterPlan {
        clinic_line: clinic.footer_line(),
        classification: submission.kind.classification().to_string(),
    })
}
