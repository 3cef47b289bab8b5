use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::tree::MetricsDocument;
use super::walker::walk;
use super::Incident;

/// Decide whether `doc` describes an incident.
///
/// Returns `None` when no leaf reaches `HIGH`. That is the normal healthy
/// outcome, not an error.
pub fn decide(doc: &MetricsDocument) -> Option<Incident> {
    let outcome = walk(&doc.tree);
    let severity = outcome.max.filter(|sev| sev.is_incident())?;

    Some(Incident {
        incident_id: new_incident_id(),
        service: doc.service.clone(),
        severity,
        detected_at: Utc::now(),
        symptoms: outcome.symptoms,
        metrics_snapshot: doc.raw.clone(),
    })
}

/// Read a metrics document from disk, validate it and decide.
pub fn detect_incident(path: &Path) -> Result<Option<Incident>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read metrics file: {}", path.display()))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse metrics file: {}", path.display()))?;
    let doc = MetricsDocument::from_value(raw)
        .with_context(|| format!("invalid metrics document: {}", path.display()))?;

    let incident = decide(&doc);
    match &incident {
        Some(i) => info!(
            incident_id = %i.incident_id,
            service = %i.service,
            severity = %i.severity,
            symptoms = i.symptoms.len(),
            "Incident detected"
        ),
        None => debug!(service = %doc.service, "No incident detected"),
    }
    Ok(incident)
}

fn new_incident_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("INC-{}", hex[..6].to_uppercase())
}
