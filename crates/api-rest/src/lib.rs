//! # API REST
//!
//! REST surface for the consent intake pipeline.
//!
//! Handles:
//! - `POST /consents/{kind}` - run one submission through the pipeline
//! - `GET /consents/{kind}/catalog` - the versioned screening and
//!   acknowledgment catalog the form renders from
//! - `GET /health` - liveness probe
//! - OpenAPI/Swagger documentation
//!
//! The submit endpoint maps pipeline outcomes onto the client contract:
//! a 200 thank-you payload on success, a 422 aggregated error list on
//! validation failure, and a 500 generic retryable message for the one
//! fatal failure class. Downstream (storage, database, CRM) failures are
//! operator-facing only and never change the response.
//!
//! The consent form is served from the public marketing site, so CORS is
//! permissive.

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use consent_core::{ClinicIdentity, ConsentCatalog, FormState};
use consent_crm::LeadConnectorClient;
use consent_pipeline::{SubmissionController, SubmissionOutcome};
use consent_records::SupabaseRecords;
use consent_storage::SupabaseStorage;
use consent_types::ConsentKind;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SubmissionController>,
    pub clinic: ClinicIdentity,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_catalog, submit_consent),
    components(schemas(
        HealthRes,
        CatalogRes,
        ScreeningQuestionRes,
        AcknowledgmentRes,
        ThankYouRes,
        ValidationErrorsRes,
        SubmitErrorRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router for the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/consents/:kind", post(submit_consent))
        .route("/consents/:kind/catalog", get(get_catalog))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolves the application state from the environment.
///
/// Read once at startup and passed into the services; no environment reads
/// happen during request handling.
///
/// # Environment Variables
/// - `SUPABASE_URL`, `SUPABASE_ANON_KEY`: object storage and record store
/// - `SUPABASE_BUCKET`: storage bucket (default: "medical-documents")
/// - `GHL_API_KEY`, `GHL_LOCATION_ID`: CRM credentials
/// - `GHL_BASE_URL`: CRM endpoint override (tests/staging)
///
/// # Errors
/// Fails when a required variable is missing or the HTTP client cannot be
/// constructed.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let supabase_url = require_env("SUPABASE_URL")?;
    let supabase_key = require_env("SUPABASE_ANON_KEY")?;
    let bucket =
        std::env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "medical-documents".into());
    let ghl_api_key = require_env("GHL_API_KEY")?;
    let ghl_location_id = require_env("GHL_LOCATION_ID")?;

    let client = reqwest::Client::builder().build()?;

    let storage = SupabaseStorage::new(client.clone(), &supabase_url, bucket, &supabase_key);
    let records = SupabaseRecords::new(client.clone(), &supabase_url, &supabase_key);
    let crm = match std::env::var("GHL_BASE_URL") {
        Ok(base) => {
            LeadConnectorClient::with_base_url(client, base, ghl_api_key, ghl_location_id)
        }
        Err(_) => LeadConnectorClient::new(client, ghl_api_key, ghl_location_id),
    };

    let clinic = ClinicIdentity::default();
    let controller = SubmissionController::new(
        clinic.clone(),
        Arc::new(storage),
        Arc::new(records),
        Arc::new(crm),
    );

    Ok(AppState {
        controller: Arc::new(controller),
        clinic,
    })
}

fn require_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).map_err(|_| anyhow::anyhow!("missing required environment variable {name}"))
}

#[derive(Serialize, ToSchema)]
struct HealthRes {
    ok: bool,
    message: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ScreeningQuestionRes {
    key: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail_prompt: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct AcknowledgmentRes {
    id: String,
    text: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CatalogRes {
    version: String,
    consent_type: String,
    title: String,
    treatment_description: Vec<String>,
    screening: Vec<ScreeningQuestionRes>,
    risk_disclosures: Vec<String>,
    acknowledgments: Vec<AcknowledgmentRes>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct ThankYouRes {
    status: String,
    first_name: String,
    message: String,
    details: String,
    contact_email: String,
}

#[derive(Serialize, ToSchema)]
struct ValidationErrorsRes {
    status: String,
    errors: Vec<String>,
}

#[derive(Serialize, ToSchema)]
struct SubmitErrorRes {
    status: String,
    message: String,
}

fn parse_kind(kind: &str) -> Result<ConsentKind, Response> {
    kind.parse::<ConsentKind>().map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            Json(SubmitErrorRes {
                status: "error".into(),
                message: format!("unknown consent type: {kind}"),
            }),
        )
            .into_response()
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "consent intake API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/consents/{kind}/catalog",
    params(("kind" = String, Path, description = "Consent type slug")),
    responses(
        (status = 200, description = "Catalog for the consent type", body = CatalogRes),
        (status = 404, description = "Unknown consent type")
    )
)]
/// The versioned catalog the form renders from.
///
/// Serving the screening questions, risk disclosures and acknowledgment
/// statements from here keeps the UI and the generated document reading
/// the same wording; neither can drift.
#[axum::debug_handler]
async fn get_catalog(
    State(_state): State<AppState>,
    AxumPath(kind): AxumPath<String>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let catalog = ConsentCatalog::for_kind(kind);

    let response = CatalogRes {
        version: catalog.version().to_string(),
        consent_type: kind.slug().to_string(),
        title: kind.title().to_string(),
        treatment_description: catalog
            .treatment_description()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        screening: catalog
            .screening()
            .iter()
            .map(|q| ScreeningQuestionRes {
                key: q.key.wire_name().to_string(),
                prompt: q.prompt.to_string(),
                note: q.note.map(str::to_string),
                options: q
                    .key
                    .allowed_answers()
                    .iter()
                    .map(|a| a.to_string())
                    .collect(),
                detail_prompt: q.detail_prompt.map(str::to_string),
            })
            .collect(),
        risk_disclosures: catalog
            .risk_disclosures()
            .iter()
            .map(|s| s.to_string())
            .collect(),
        acknowledgments: catalog
            .acknowledgments()
            .iter()
            .map(|a| AcknowledgmentRes {
                id: a.id.to_string(),
                text: a.text.to_string(),
            })
            .collect(),
    };
    Json(response).into_response()
}

#[utoipa::path(
    post,
    path = "/consents/{kind}",
    params(("kind" = String, Path, description = "Consent type slug")),
    responses(
        (status = 200, description = "Submission accepted", body = ThankYouRes),
        (status = 404, description = "Unknown consent type"),
        (status = 422, description = "Validation failed", body = ValidationErrorsRes),
        (status = 500, description = "Document could not be generated", body = SubmitErrorRes)
    )
)]
/// Runs one consent submission through the pipeline.
///
/// The request body is the form state exactly as the browser holds it:
/// camelCase identity fields, `screening` keyed by question, the
/// acknowledgment tick list, and the signature as a base64 data URL.
#[axum::debug_handler]
async fn submit_consent(
    State(state): State<AppState>,
    AxumPath(kind): AxumPath<String>,
    Json(form): Json<FormState>,
) -> Response {
    let kind = match parse_kind(&kind) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    match state.controller.submit(kind, &form).await {
        SubmissionOutcome::Succeeded(receipt) => {
            tracing::info!(
                submission = %receipt.submission_id,
                pages = receipt.page_count,
                critical = receipt.critical_flag,
                "consent submission completed"
            );
            (
                StatusCode::OK,
                Json(ThankYouRes {
                    status: "ok".into(),
                    first_name: receipt.first_name.clone(),
                    message: "Your form has been sent.".into(),
                    details: format!(
                        "We received your {} consent form. Our team will review it before \
                         your treatment.",
                        kind.title()
                    ),
                    contact_email: state.clinic.contact_email.clone(),
                }),
            )
                .into_response()
        }
        SubmissionOutcome::Invalid { errors } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ValidationErrorsRes {
                status: "invalid".into(),
                errors,
            }),
        )
            .into_response(),
        SubmissionOutcome::Failed { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SubmitErrorRes {
                status: "error".into(),
                message,
            }),
        )
            .into_response(),
    }
}
