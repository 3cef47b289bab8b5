//! End-to-end trigger: detect, then run the pipeline when an incident exists.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::analysis::FileLogSource;
use crate::config::AppConfig;
use crate::detect::detect_incident;
use crate::pipeline::{Pipeline, PipelineState};
use crate::reasoning::TextGenerator;
use crate::storage::ReportStore;

#[derive(Debug)]
pub enum WorkflowOutcome {
    /// Metrics are below the incident threshold; the pipeline was skipped.
    NoIncident,
    Completed(Box<PipelineState>),
}

/// Build the pipeline described by `config`.
pub fn build_pipeline(config: &AppConfig, generator: Arc<dyn TextGenerator>) -> Pipeline {
    let logs = Arc::new(FileLogSource::new(&config.paths.logs));
    let store = ReportStore::new(&config.paths.reports_dir);
    let pipeline = Pipeline::new(logs, generator, store)
        .with_generation_timeout(config.textgen.timeout());
    match config.paths.checkpoint_path() {
        Some(path) => pipeline.with_checkpoint(path),
        None => pipeline,
    }
}

pub async fn run_workflow(
    config: &AppConfig,
    generator: Arc<dyn TextGenerator>,
) -> Result<WorkflowOutcome> {
    let Some(incident) = detect_incident(&config.paths.metrics)? else {
        info!("No incident detected. Workflow skipped.");
        return Ok(WorkflowOutcome::NoIncident);
    };

    let pipeline = build_pipeline(config, generator);
    let state = pipeline.run(PipelineState::new(incident)).await?;
    Ok(WorkflowOutcome::Completed(Box::new(state)))
}
