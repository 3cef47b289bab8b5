//! Linear incident-response pipeline.
//!
//! Stages run strictly in [`Stage::ORDER`] over one shared [`PipelineState`].
//! A failing stage aborts the run and no later stage executes. Text
//! generation failures never reach this level: they are replaced by fallback
//! text inside the stage.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, Instrument};

use crate::analysis::{analyze_logs, analyze_metrics, LogAnalysis, LogSource, MetricsAnalysis};
use crate::detect::Incident;
use crate::reasoning::{determine_root_cause, TextGenerator};
use crate::recommend::{generate_recommendations, Recommendation};
use crate::storage::{write_replace, ReportLocations, ReportStore};

const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    MetricsAnalysis,
    LogAnalysis,
    RootCause,
    Recommendations,
    Report,
}

impl Stage {
    /// Execution order. The run ends after the last stage.
    pub const ORDER: [Stage; 5] = [
        Stage::MetricsAnalysis,
        Stage::LogAnalysis,
        Stage::RootCause,
        Stage::Recommendations,
        Stage::Report,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::MetricsAnalysis => "metrics_analysis",
            Stage::LogAnalysis => "log_analysis",
            Stage::RootCause => "root_cause",
            Stage::Recommendations => "recommendations",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared by every stage. Stages fill fields in; none are cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub incident: Incident,
    #[serde(default)]
    pub metrics_analysis: Option<MetricsAnalysis>,
    #[serde(default)]
    pub log_analysis: Option<LogAnalysis>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub report: Option<ReportLocations>,
}

impl PipelineState {
    pub fn new(incident: Incident) -> Self {
        Self {
            incident,
            metrics_analysis: None,
            log_analysis: None,
            root_cause: None,
            recommendations: Vec::new(),
            report: None,
        }
    }
}

pub struct Pipeline {
    logs: Arc<dyn LogSource>,
    generator: Arc<dyn TextGenerator>,
    store: ReportStore,
    generation_timeout: Duration,
    checkpoint: Option<PathBuf>,
}

impl Pipeline {
    pub fn new(
        logs: Arc<dyn LogSource>,
        generator: Arc<dyn TextGenerator>,
        store: ReportStore,
    ) -> Self {
        Self {
            logs,
            generator,
            store,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            checkpoint: None,
        }
    }

    /// Bound on each text generation call.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Rewrite the full state to `path` after every completed stage.
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    /// Run every stage in order and return the final state.
    pub async fn run(&self, mut state: PipelineState) -> Result<PipelineState> {
        let span = info_span!("pipeline", incident_id = %state.incident.incident_id);
        async move {
            for stage in Stage::ORDER {
                self.run_stage(stage, &mut state)
                    .await
                    .with_context(|| format!("stage `{}` failed", stage))?;
                info!(%stage, "Stage complete");
                self.write_checkpoint(&state)?;
            }
            Ok(state)
        }
        .instrument(span)
        .await
    }

    async fn run_stage(&self, stage: Stage, state: &mut PipelineState) -> Result<()> {
        match stage {
            Stage::MetricsAnalysis => {
                state.metrics_analysis = Some(analyze_metrics(&state.incident.metrics_snapshot));
            }
            Stage::LogAnalysis => {
                let lines = self.logs.read_lines()?;
                state.log_analysis = Some(analyze_logs(lines.as_slice()));
            }
            Stage::RootCause => {
                let metrics = state
                    .metrics_analysis
                    .as_ref()
                    .context("metrics analysis has not run")?;
                let logs = state
                    .log_analysis
                    .as_ref()
                    .context("log analysis has not run")?;
                let root_cause = determine_root_cause(
                    self.generator.as_ref(),
                    metrics,
                    logs,
                    self.generation_timeout,
                )
                .await;
                state.root_cause = Some(root_cause);
            }
            Stage::Recommendations => {
                let root_cause = state
                    .root_cause
                    .as_deref()
                    .context("root cause has not been determined")?;
                state.recommendations = generate_recommendations(
                    self.generator.as_ref(),
                    root_cause,
                    state.incident.severity,
                    self.generation_timeout,
                )
                .await;
            }
            Stage::Report => {
                self.store.persist(state)?;
            }
        }
        Ok(())
    }

    fn write_checkpoint(&self, state: &PipelineState) -> Result<()> {
        let Some(path) = &self.checkpoint else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(state)?;
        write_replace(path, &json)
            .with_context(|| format!("failed to write checkpoint: {}", path.display()))?;
        Ok(())
    }
}
