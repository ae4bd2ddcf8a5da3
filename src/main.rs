//! Consent intake service binary.
//!
//! Resolves configuration from the environment once, wires the three
//! outbound collaborators (object storage, record store, CRM) into the
//! submission controller, and serves the REST API.
//!
//! # Environment Variables
//! - `CONSENT_REST_ADDR`: server address (default: "0.0.0.0:3000")
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_BUCKET`: storage and
//!   record store
//! - `GHL_API_KEY`, `GHL_LOCATION_ID`, `GHL_BASE_URL`: CRM
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("range_consent=info".parse()?)
                .add_directive("consent_pipeline=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CONSENT_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting consent intake API on {}", addr);

    let state = api_rest::state_from_env()?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
