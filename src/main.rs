use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use incidentflow::config::{AppConfig, LoggingConfig};
use incidentflow::workflow::{run_workflow, WorkflowOutcome};

#[derive(Parser)]
#[command(
    name = "incidentflow",
    about = "Incident detection and response pipeline for service metrics and logs",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "INCIDENTFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a metrics document and print the incident, if any
    Detect {
        /// Metrics document (JSON)
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Detect and, when an incident exists, run the full response pipeline
    Run {
        /// Metrics document (JSON)
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Service log file
        #[arg(long)]
        logs: Option<PathBuf>,

        /// Directory for reports and the incident index
        #[arg(long)]
        reports_dir: Option<PathBuf>,
    },

    /// List recorded incidents
    History,

    /// Print the stored report for an incident
    Show {
        /// Incident ID (e.g. INC-1A2B3C)
        id: String,
    },

    /// Serve the read-only incident API
    Serve {
        /// Bind address
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default()?,
    };
    init_tracing(&config.logging);
    tracing::debug!(reports_dir = %config.paths.reports_dir.display(), "Configuration loaded");

    match cli.command {
        Commands::Detect { metrics, json } => {
            let path = metrics.unwrap_or(config.paths.metrics);
            match incidentflow::detect::detect_incident(&path)? {
                Some(incident) if json => {
                    println!("{}", serde_json::to_string_pretty(&incident)?);
                }
                Some(incident) => {
                    println!("\n=== Incident {} ===", incident.incident_id);
                    println!("Service:     {}", incident.service);
                    println!("Severity:    {}", incident.severity);
                    println!("Detected at: {}", timestamp(&incident.detected_at));
                    println!("\nSymptoms:");
                    for symptom in &incident.symptoms {
                        println!(" - {}", symptom);
                    }
                    println!();
                }
                None => println!("No incident detected"),
            }
        }
        Commands::Run {
            metrics,
            logs,
            reports_dir,
        } => {
            if let Some(p) = metrics {
                config.paths.metrics = p;
            }
            if let Some(p) = logs {
                config.paths.logs = p;
            }
            if let Some(p) = reports_dir {
                config.paths.reports_dir = p;
            }

            tracing::info!(metrics = %config.paths.metrics.display(), "Running incident workflow");
            let generator = incidentflow::reasoning::openrouter::from_config(&config.textgen);
            match run_workflow(&config, generator).await? {
                WorkflowOutcome::NoIncident => println!("No incident detected. Workflow skipped."),
                WorkflowOutcome::Completed(state) => {
                    println!("\n=== Incident {} ===", state.incident.incident_id);
                    println!("Severity:   {}", state.incident.severity);
                    println!(
                        "Root cause: {}",
                        state.root_cause.as_deref().unwrap_or("n/a")
                    );
                    println!("\nRecommended actions:");
                    for r in &state.recommendations {
                        println!(" - [{}] {} ({:.2})", r.kind, r.action, r.confidence);
                    }
                    if let Some(report) = &state.report {
                        println!("\nReport: {}", report.markdown.display());
                    }
                    println!();
                }
            }
        }
        Commands::History => {
            let store = incidentflow::storage::ReportStore::new(&config.paths.reports_dir);
            let entries = store.index().load()?;
            if entries.is_empty() {
                println!("No incidents recorded.");
            } else {
                println!(
                    "{:<12} | {:<20} | {:<9} | Detected At",
                    "Incident", "Service", "Severity"
                );
                println!("{:-<12}-|-{:-<20}-|-{:-<9}-|-{:-<27}", "", "", "", "");
                for e in entries {
                    println!(
                        "{:<12} | {:<20} | {:<9} | {}",
                        e.incident_id,
                        e.service,
                        e.severity.as_str(),
                        timestamp(&e.detected_at)
                    );
                }
            }
        }
        Commands::Show { id } => {
            let store = incidentflow::storage::ReportStore::new(&config.paths.reports_dir);
            let entry = store
                .index()
                .find(&id)?
                .with_context(|| format!("incident {} not found in index", id))?;
            println!("{}", store.read_markdown(&entry)?);
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.api.bind.clone());
            tracing::info!(%bind, "Starting incidentflow API");
            incidentflow::serve(&bind, &config).await?;
        }
    }

    Ok(())
}
