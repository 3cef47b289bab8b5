//! Incident report rendering and persistence.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use super::{write_replace, IncidentIndex, IndexEntry, ReportLocations};
use crate::pipeline::PipelineState;

/// Render the final pipeline state as a markdown report.
pub fn render_markdown(state: &PipelineState, generated_at: DateTime<Utc>) -> String {
    let incident = &state.incident;
    let mut md = String::new();

    let _ = writeln!(md, "# Incident Report - {}\n", incident.incident_id);

    md.push_str("## Incident Summary\n");
    let _ = writeln!(md, "- **Service:** {}", incident.service);
    let _ = writeln!(md, "- **Severity:** {}", incident.severity);
    let _ = writeln!(md, "- **Detected At:** {}", timestamp(incident.detected_at));
    let _ = writeln!(md, "- **Symptoms:** {}\n", incident.symptoms.join(", "));

    md.push_str("## Metrics Analysis\n");
    match &state.metrics_analysis {
        Some(metrics) => {
            for (label, value) in metrics.fields() {
                let _ = writeln!(md, "- **{}:** {}", label, value);
            }
        }
        None => md.push_str("_Not available_\n"),
    }
    md.push('\n');

    md.push_str("## Log Analysis\n");
    match &state.log_analysis {
        Some(logs) => {
            let _ = writeln!(md, "- **Error Count:** {}", logs.error_count);
            let _ = writeln!(md, "- **Warning Count:** {}", logs.warning_count);
            md.push_str("- **Key Errors:**\n");
            for err in &logs.key_errors {
                let _ = writeln!(md, "  - {}", err);
            }
        }
        None => md.push_str("_Not available_\n"),
    }
    md.push('\n');

    md.push_str("## Root Cause\n");
    let _ = writeln!(md, "{}\n", state.root_cause.as_deref().unwrap_or("_Not available_"));

    md.push_str("## Recommended Actions\n");
    for r in &state.recommendations {
        let _ = writeln!(
            md,
            "- **{}** (type: {}, confidence: {})  \n  _{}_",
            r.action, r.kind, r.confidence, r.explanation
        );
    }

    md.push_str("\n---\n");
    let _ = write!(md, "_Report generated on {}_", timestamp(generated_at));
    md
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Writes report artifacts into one directory and records them in its index.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
    index: IncidentIndex,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let index = IncidentIndex::in_dir(&dir);
        Self { dir, index }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn index(&self) -> &IncidentIndex {
        &self.index
    }

    pub fn locations_for(&self, incident_id: &str) -> ReportLocations {
        ReportLocations {
            markdown: self.dir.join(format!("{}.md", incident_id)),
            state: self.dir.join(format!("{}.json", incident_id)),
        }
    }

    /// Write the markdown report and the state document, then append one
    /// index entry. Sets `state.report` to the written locations.
    ///
    /// Files written before a failed index append are left in place.
    pub fn persist(&self, state: &mut PipelineState) -> Result<IndexEntry> {
        let incident_id = state.incident.incident_id.clone();
        let locations = self.locations_for(&incident_id);
        state.report = Some(locations.clone());

        let markdown = render_markdown(state, Utc::now());
        write_replace(&locations.markdown, markdown.as_bytes())
            .context("failed to write markdown report")?;

        let state_json = serde_json::to_vec_pretty(&*state)?;
        write_replace(&locations.state, &state_json).context("failed to write state document")?;

        let entry = IndexEntry {
            incident_id: incident_id.clone(),
            service: state.incident.service.clone(),
            severity: state.incident.severity,
            detected_at: state.incident.detected_at,
            report_locations: locations,
        };
        let total = self
            .index
            .append(entry.clone())
            .context("failed to append to incident index")?;

        info!(
            incident_id = %incident_id,
            report = %entry.report_locations.markdown.display(),
            index_entries = total,
            "Report persisted"
        );
        Ok(entry)
    }

    pub fn read_markdown(&self, entry: &IndexEntry) -> Result<String> {
        let path = &entry.report_locations.markdown;
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_logs, analyze_metrics};
    use crate::detect::{decide, MetricsDocument};
    use crate::recommend::{ActionKind, Recommendation};
    use serde_json::json;

    fn final_state() -> PipelineState {
        let doc = MetricsDocument::from_value(json!({
            "service": "auth-service",
            "compute": { "cpu_percent": { "value": 97, "severity": "CRITICAL" } },
            "traffic": { "error_rate_percent": { "value": 9, "severity": "HIGH" } }
        }))
        .unwrap();
        let incident = decide(&doc).unwrap();
        let mut state = PipelineState::new(incident);
        state.metrics_analysis = Some(analyze_metrics(&state.incident.metrics_snapshot));
        state.log_analysis = Some(analyze_logs(&[
            "12:00 ERROR db timeout",
            "12:01 WARN retrying",
        ]));
        state.root_cause = Some("Database connection pool exhausted.".to_string());
        state.recommendations = vec![Recommendation {
            action: "Check database connection pool saturation".to_string(),
            kind: ActionKind::Investigate,
            confidence: 0.95,
            explanation: "The pool ran dry.".to_string(),
        }];
        state
    }

    #[test]
    fn test_render_markdown_sections() {
        let state = final_state();
        let md = render_markdown(&state, Utc::now());

        assert!(md.starts_with(&format!("# Incident Report - {}", state.incident.incident_id)));
        assert!(md.contains("- **Service:** auth-service"));
        assert!(md.contains("- **Severity:** CRITICAL"));
        assert!(md.contains(
            "- **Symptoms:** Compute Cpu Percent is CRITICAL, Traffic Error Rate Percent is HIGH"
        ));
        assert!(md.contains("- **Cpu Status:** CRITICAL"));
        assert!(md.contains("- **Latency Status:** UNKNOWN"));
        assert!(md.contains("- **Error Count:** 1"));
        assert!(md.contains("  - db timeout"));
        assert!(md.contains("## Root Cause\nDatabase connection pool exhausted."));
        assert!(md.contains(
            "- **Check database connection pool saturation** (type: INVESTIGATE, confidence: 0.95)"
        ));
        assert!(md.contains("  _The pool ran dry._"));
        assert!(md.contains("_Report generated on "));
    }

    #[test]
    fn test_render_incomplete_state() {
        let mut state = final_state();
        state.metrics_analysis = None;
        state.root_cause = None;
        let md = render_markdown(&state, Utc::now());
        assert!(md.contains("## Metrics Analysis\n_Not available_"));
        assert!(md.contains("## Root Cause\n_Not available_"));
    }

    #[test]
    fn test_persist_writes_artifacts_and_index() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));
        let mut state = final_state();

        let entry = store.persist(&mut state).unwrap();

        assert_eq!(entry.incident_id, state.incident.incident_id);
        assert_eq!(state.report.as_ref(), Some(&entry.report_locations));
        assert!(entry.report_locations.markdown.exists());

        let saved: PipelineState = serde_json::from_str(
            &std::fs::read_to_string(&entry.report_locations.state).unwrap(),
        )
        .unwrap();
        assert_eq!(saved.report, state.report);
        assert_eq!(saved.recommendations.len(), 1);

        let md = store.read_markdown(&entry).unwrap();
        assert!(md.contains("auth-service"));
        assert_eq!(store.index().load().unwrap(), vec![entry]);
    }
}
