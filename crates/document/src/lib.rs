//! # Consent Document
//!
//! The document assembler: a pure transform from a validated
//! [`ConsentSubmission`] to a paginated PDF reproducing every answer and
//! acknowledgment verbatim.
//!
//! Assembly runs in two stages so that pagination is measured, never
//! positional:
//!
//! 1. [`compose`](compose::compose) walks the fixed section order with a
//!    running vertical cursor, measures every block before placing it, and
//!    emits page breaks when a block would overflow the remaining page
//!    height. The result is a [`DocumentPlan`]: per-page positioned blocks
//!    plus the resolved page count. No block is ever split across a page
//!    boundary.
//! 2. [`render`](render::render) draws the plan with `printpdf`, then makes
//!    a final pass over all pages stamping the running footer and the
//!    "Page X of N" marks. The second pass exists because N is only known
//!    once composition has finished.
//!
//! No network or storage access happens anywhere in this crate.

pub mod compose;
pub mod layout;
pub mod render;

use consent_core::{ClinicIdentity, ConsentSubmission};

/// Failures while producing the PDF byte stream.
///
/// Composition itself cannot fail; only the PDF writer can.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to prepare PDF font: {0}")]
    Font(String),
    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// The assembled document payload plus incidental metadata.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Assembles the full consent document for a validated submission.
pub fn assemble(
    submission: &ConsentSubmission,
    clinic: &ClinicIdentity,
) -> Result<AssembledDocument, DocumentError> {
    let plan = compose::compose(submission, clinic);
    let title = format!("{} — Informed Consent", submission.kind.title());
    let bytes = render::render(&plan, &title, &submission.signature)?;
    Ok(AssembledDocument {
        bytes,
        page_count: plan.page_count(),
    })
}
