//! # Consent Core
//!
//! Core business logic for the consent intake pipeline:
//! - The form state store, single source of truth for everything downstream
//! - The versioned screening/acknowledgment/risk catalogs
//! - The validation engine and the safety-flag evaluator
//! - The signature payload decoder
//! - The immutable [`ConsentSubmission`] aggregate built from a validated form
//!
//! **No API or I/O concerns**: HTTP handling belongs in `api-rest`, PDF
//! rendering in `consent-document`, and the outbound collaborators in
//! `consent-storage`, `consent-records` and `consent-crm`. Everything here
//! is a pure function over a snapshot of the form state.

pub mod catalog;
pub mod clinic;
mod error;
pub mod form;
pub mod safety;
pub mod signature;
pub mod submission;
pub mod validation;

pub use catalog::{AcknowledgmentStatement, ConsentCatalog, ScreeningQuestion, CATALOG_VERSION};
pub use clinic::ClinicIdentity;
pub use error::{ConsentError, ConsentResult};
pub use form::{AcknowledgmentTick, FormState, ScreeningEntry};
pub use signature::{SignatureFormat, SignatureImage};
pub use submission::{
    AcknowledgedStatement, ConsentSubmission, PatientIdentity, ScreeningResponse,
};
pub use validation::{validate, ValidationReport};
