use chrono::Utc;
use clap::{Parser, Subcommand};
use consent_core::{
    validate, ClinicIdentity, ConsentCatalog, ConsentSubmission, FormState,
};
use consent_types::ConsentKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "consent")]
#[command(about = "Consent intake pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the screening and acknowledgment catalog
    Catalog {
        /// Consent type slug (default: iv-injection)
        #[arg(long, default_value = "iv-injection")]
        kind: String,
    },
    /// Validate a form-state JSON file
    Validate {
        /// Path to the form-state JSON
        file: PathBuf,
        /// Consent type slug
        #[arg(long, default_value = "iv-injection")]
        kind: String,
    },
    /// Render the consent PDF from a form-state JSON file
    Render {
        /// Path to the form-state JSON
        file: PathBuf,
        /// Output PDF path
        #[arg(short, long, default_value = "consent.pdf")]
        out: PathBuf,
        /// Consent type slug
        #[arg(long, default_value = "iv-injection")]
        kind: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Catalog { kind }) => {
            let catalog = ConsentCatalog::for_kind(kind.parse::<ConsentKind>()?);
            println!(
                "{} catalog (version {})",
                catalog.kind().title(),
                catalog.version()
            );
            println!("\nScreening questions:");
            for question in catalog.screening() {
                println!("  [{}] {}", question.key.wire_name(), question.prompt);
            }
            println!("\nAcknowledgments:");
            for statement in catalog.acknowledgments() {
                println!("  [{}] {}", statement.id, statement.text);
            }
            println!("\nRisk disclosures:");
            for risk in catalog.risk_disclosures() {
                println!("  - {risk}");
            }
        }
        Some(Commands::Validate { file, kind }) => {
            let catalog = ConsentCatalog::for_kind(kind.parse::<ConsentKind>()?);
            let state = read_form(&file)?;
            let report = validate(&state, &catalog);
            if report.is_valid() {
                println!("Form is complete.");
                if report.critical_flag {
                    println!("Note: the critical screening answer raises the safety flag.");
                }
            } else {
                println!("Please complete the following required fields:");
                for error in &report.errors {
                    println!("  - {error}");
                }
                std::process::exit(1);
            }
        }
        Some(Commands::Render { file, out, kind }) => {
            let catalog = ConsentCatalog::for_kind(kind.parse::<ConsentKind>()?);
            let state = read_form(&file)?;
            let submission = ConsentSubmission::from_validated(&state, &catalog, Utc::now())?;
            let document = consent_document::assemble(&submission, &ClinicIdentity::default())?;
            std::fs::write(&out, &document.bytes)?;
            println!(
                "Wrote {} ({} pages) for {}",
                out.display(),
                document.page_count,
                submission.identity.full_name()
            );
        }
        None => {
            println!("consent: use --help to list commands");
        }
    }

    Ok(())
}

fn read_form(path: &PathBuf) -> Result<FormState, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
