use anyhow::Context;
use clap::{Parser, Subcommand};
use consult_core::constants::{AUDIT_ENABLED_ENV, CONNECT_TIMEOUT_ENV, FHIR_BASE_URL_ENV};
use consult_core::{
    compose, total_quantity, AuditSink, ConsultationDraft, ConsultationStores,
    ConsultationSubmitter, CoreConfig, DurationUnit, EncounterSession, Frequency, HttpTransport,
    IgnoreReason, NoopAuditSink, SubmitOutcome, TracingAuditSink, TracingNotifier,
};
use consult_types::ConceptId;
use fhir::TransactionBundle;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "consult")]
#[command(about = "Compose and submit clinical consultations as FHIR transaction bundles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the transaction bundle for a consultation draft without submitting it
    Compose {
        /// Path to the YAML consultation draft
        draft: PathBuf,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Run the validation gate over a consultation draft
    Validate {
        /// Path to the YAML consultation draft
        draft: PathBuf,
    },
    /// Compute the total quantity to dispense
    Quantity {
        /// Dose per administration
        #[arg(long)]
        dose: f64,
        /// Frequency name, e.g. "Twice a day" or "Immediately"
        #[arg(long)]
        frequency: String,
        /// Doses per day, for frequencies outside the standard list
        #[arg(long)]
        per_day: Option<f64>,
        /// Duration value
        #[arg(long, default_value_t = 0.0)]
        duration: f64,
        /// Duration unit (minutes, hours, days, weeks, months, years)
        #[arg(long, default_value = "days")]
        unit: String,
    },
    /// Submit a consultation draft to the configured FHIR server
    Submit {
        /// Path to the YAML consultation draft
        draft: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("consult=info".parse()?)
                .add_directive("audit=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Compose { draft, pretty }) => {
            println!("{}", compose_draft(&draft, pretty)?);
        }
        Some(Commands::Validate { draft }) => {
            let report = validate_draft(&draft)?;
            print!("{report}");
            if !report.is_valid() {
                anyhow::bail!("consultation draft is not ready to submit");
            }
        }
        Some(Commands::Quantity {
            dose,
            frequency,
            per_day,
            duration,
            unit,
        }) => {
            let total = quantity(dose, &frequency, per_day, duration, &unit)?;
            println!("{total}");
        }
        Some(Commands::Submit { draft }) => {
            let cfg = CoreConfig::from_env_values(
                std::env::var(FHIR_BASE_URL_ENV).ok(),
                std::env::var(CONNECT_TIMEOUT_ENV).ok(),
                std::env::var(AUDIT_ENABLED_ENV).ok(),
            )?;
            submit_draft(&draft, &cfg).await?;
        }
        None => {
            println!("Use 'consult --help' for commands");
        }
    }

    Ok(())
}

fn load_draft(path: &Path) -> anyhow::Result<(EncounterSession, ConsultationStores)> {
    let draft = ConsultationDraft::load(path)
        .with_context(|| format!("failed to load draft {}", path.display()))?;
    let session = EncounterSession::new();
    let stores = ConsultationStores::new();
    draft.apply(&session, &stores, chrono::Utc::now())?;
    Ok((session, stores))
}

fn compose_draft(path: &Path, pretty: bool) -> anyhow::Result<String> {
    let (session, stores) = load_draft(path)?;
    let context = session
        .snapshot()
        .context("draft did not open an encounter session")?;
    let encounter = context.complete().map_err(|missing| {
        anyhow::anyhow!("encounter is missing: {}", join(missing.iter()))
    })?;

    let composed = compose(&encounter, &stores, chrono::Utc::now());
    let json = if pretty {
        TransactionBundle::render_pretty(&composed.bundle)?
    } else {
        TransactionBundle::render(&composed.bundle)?
    };
    Ok(json)
}

/// Outcome of the validation gate for one draft.
#[derive(Debug)]
struct ValidationReport {
    missing: Vec<String>,
    field_errors: Vec<String>,
}

impl ValidationReport {
    fn is_valid(&self) -> bool {
        self.missing.is_empty() && self.field_errors.is_empty()
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return writeln!(f, "Consultation is ready to submit.");
        }
        for field in &self.missing {
            writeln!(f, "encounter: {field} is required")?;
        }
        for line in &self.field_errors {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

fn validate_draft(path: &Path) -> anyhow::Result<ValidationReport> {
    let (session, stores) = load_draft(path)?;
    let missing = match session.snapshot().map(|ctx| ctx.complete()) {
        Some(Ok(_)) => Vec::new(),
        Some(Err(missing)) => missing.iter().map(ToString::to_string).collect(),
        None => vec!["encounter".to_owned()],
    };

    stores.validate_all();
    let field_errors = stores
        .field_errors()
        .into_iter()
        .map(|e| format!("{} '{}' ({}): {}", e.category, e.name, e.concept, join(e.errors.iter())))
        .collect();

    Ok(ValidationReport {
        missing,
        field_errors,
    })
}

fn quantity(
    dose: f64,
    frequency: &str,
    per_day: Option<f64>,
    duration: f64,
    unit: &str,
) -> anyhow::Result<f64> {
    let unit = DurationUnit::parse(unit).with_context(|| format!("unknown duration unit '{unit}'"))?;
    let concept = ConceptId::new("cli")?;
    let frequency = match per_day {
        Some(per_day) => Frequency::per_day(concept, frequency, per_day),
        None => Frequency::standard(concept, frequency)
            .with_context(|| format!("unknown frequency '{frequency}'; pass --per-day"))?,
    };
    Ok(total_quantity(dose, &frequency, duration, unit))
}

async fn submit_draft(path: &Path, cfg: &CoreConfig) -> anyhow::Result<()> {
    let (session, stores) = load_draft(path)?;
    let transport = HttpTransport::new(cfg)?;
    tracing::info!(
        draft = %path.display(),
        base_url = %transport.base_url(),
        audit = cfg.audit_enabled(),
        "submitting consultation draft"
    );
    let notifier = TracingNotifier;
    let audit: &dyn AuditSink = if cfg.audit_enabled() {
        &TracingAuditSink
    } else {
        &NoopAuditSink
    };
    let submitter = ConsultationSubmitter::new(&session, &stores, &transport, &notifier, audit);

    match submitter.submit().await {
        SubmitOutcome::Submitted(receipt) => {
            println!(
                "Submitted {} entries; encounter {}",
                receipt.entry_count,
                receipt.encounter_id.as_deref().unwrap_or(&receipt.encounter_token)
            );
            for location in &receipt.locations {
                println!("  {}/{}", location.resource_type, location.id);
            }
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for e in &errors {
                eprintln!("{} '{}': {}", e.category, e.name, join(e.errors.iter()));
            }
            anyhow::bail!("consultation failed validation; nothing was submitted")
        }
        SubmitOutcome::Ignored(IgnoreReason::Incomplete(missing)) => {
            anyhow::bail!("encounter is missing: {}", join(missing.iter()))
        }
        SubmitOutcome::Ignored(reason) => anyhow::bail!("submission ignored: {reason:?}"),
        SubmitOutcome::Failed(err) => Err(err.into()),
    }
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DRAFT: &str = r#"
encounter:
  patient: patient-1
  visit: visit-1
  location: opd-1
  type: consultation
  practitioner: dr-1
  participants: [dr-1]
diagnoses:
  - concept: dx-1
    name: Malaria
    certainty: provisional
allergies:
  - concept: alg-1
    name: Penicillin
    category: medication
    severity: mild
    reactions: [rash]
"#;

    fn draft_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write draft");
        file
    }

    #[test]
    fn compose_prints_a_transaction_bundle() {
        let file = draft_file(DRAFT);
        let json = compose_draft(file.path(), false).expect("compose");
        assert!(json.contains(r#""resourceType":"Bundle""#));
        assert!(json.contains(r#""type":"transaction""#));
        assert_eq!(json.matches(r#""resourceType":"Encounter""#).count(), 1);
        assert_eq!(json.matches(r#""method":"POST""#).count(), 3);
    }

    #[test]
    fn compose_refuses_incomplete_encounter() {
        let file = draft_file("encounter:\n  patient: p-1\n");
        let err = compose_draft(file.path(), true).expect_err("incomplete");
        assert!(err.to_string().contains("location"), "{err}");
    }

    #[test]
    fn validate_reports_field_errors() {
        let file = draft_file(&DRAFT.replace("    certainty: provisional\n", ""));
        let report = validate_draft(file.path()).expect("validate");
        assert!(!report.is_valid());
        assert!(report.missing.is_empty());
        assert_eq!(report.field_errors.len(), 1);
        assert!(report.field_errors[0].contains("certainty is required"));
    }

    #[test]
    fn validate_accepts_a_complete_draft() {
        let file = draft_file(DRAFT);
        let report = validate_draft(file.path()).expect("validate");
        assert!(report.is_valid());
        assert_eq!(report.to_string(), "Consultation is ready to submit.\n");
    }

    #[test]
    fn missing_draft_file_is_reported() {
        let err = validate_draft(Path::new("/nonexistent/consult.yaml")).expect_err("missing");
        assert!(err.to_string().contains("failed to load draft"));
    }

    #[test]
    fn quantity_uses_standard_frequencies() {
        assert_eq!(quantity(1.0, "Twice a day", None, 5.0, "days").expect("total"), 10.0);
        assert_eq!(quantity(2.0, "Immediately", None, 0.0, "days").expect("total"), 2.0);
        assert_eq!(quantity(1.0, "Custom", Some(5.0), 2.0, "d").expect("total"), 10.0);
        assert!(quantity(1.0, "Whenever", None, 2.0, "days").is_err());
        assert!(quantity(1.0, "Once a day", None, 2.0, "fortnights").is_err());
    }
}
