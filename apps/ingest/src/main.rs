use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ingest::config::Config;
use ingest::models::{AcceptCandidate, CvDocument, Job};
use ingest::state::ClientState;

#[derive(Parser)]
#[command(name = "ingest", version, about = "Bulk CV ingestion and job matching client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload CVs one at a time and wait for the worker to parse them
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Rank every known candidate against a job
    MatchAll { job_id: i64 },
    /// Score ad-hoc CVs against a job definition
    Match {
        /// Path to the job definition (JSON)
        #[arg(long)]
        job: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List candidates already accepted for a job
    Preselected { job_id: i64 },
    /// Accept a candidate for an interview
    Accept {
        #[arg(long)]
        cv: i64,
        #[arg(long)]
        job: i64,
        /// YYYY-MM-DD or YYYY-MM-DDTHH:MM
        #[arg(long)]
        date: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Ingest client v{} -> {}", env!("CARGO_PKG_VERSION"), config.api_url);
    let state = ClientState::from_config(config)?;

    let output = match cli.command {
        Command::Upload { files } => {
            let mut session = state.session();
            session.add(load_documents(&files).await?)?;
            let report = session.run_batch().await?;
            to_json(&report)?
        }
        Command::MatchAll { job_id } => to_json(&state.matcher().match_all(job_id).await?)?,
        Command::Match { job, files } => {
            let job = load_job(&job).await?;
            let batch = state
                .matcher()
                .match_many(&job, load_documents(&files).await?)
                .await?;
            let outcomes: Vec<Value> = batch
                .outcomes
                .iter()
                .map(|o| match &o.result {
                    Ok(result) => json!({ "file": o.file_name, "result": result }),
                    Err(e) => json!({ "file": o.file_name, "error": e.to_string() }),
                })
                .collect();
            json!({ "outcomes": outcomes, "ranked": batch.ranked() })
        }
        Command::Preselected { job_id } => {
            to_json(&state.matcher().preselected_candidates(job_id).await?)?
        }
        Command::Accept { cv, job, date } => {
            let form = AcceptCandidate {
                candidate_id: cv,
                job_id: job,
                interview_date: date,
            };
            state.matcher().accept_candidate(&form).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn load_documents(paths: &[PathBuf]) -> Result<Vec<CvDocument>> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let doc = CvDocument::from_path(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        documents.push(doc);
    }
    Ok(documents)
}

async fn load_job(path: &Path) -> Result<Job> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read job file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid job JSON in {}", path.display()))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
