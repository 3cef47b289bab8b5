//! Severity aggregation over a metrics document and incident detection.

pub mod incident;
pub mod tree;
pub mod walker;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use incident::{decide, detect_incident};
pub use tree::{MetricLeaf, MetricNode, MetricTree, MetricsDocument};
pub use walker::{walk, WalkOutcome};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("metrics document must be a JSON object")]
    NotAnObject,

    #[error("metrics document has no string `service` field")]
    MissingService,

    #[error("unknown severity label {label:?} at `{path}`")]
    UnknownSeverity { path: String, label: String },

    #[error("malformed metric leaf at `{path}`: {reason}")]
    MalformedLeaf { path: String, reason: String },
}

/// Severity levels carried by metric leaves, ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Lowest severity that raises an incident.
    pub const INCIDENT_THRESHOLD: Severity = Severity::High;

    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn rank(self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Medium => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }

    pub fn is_incident(self) -> bool {
        self >= Self::INCIDENT_THRESHOLD
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.as_str() == s)
            .ok_or_else(|| DetectError::UnknownSeverity {
                path: String::new(),
                label: s.to_string(),
            })
    }
}

/// A detected incident. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub service: String,
    pub severity: Severity,
    pub detected_at: chrono::DateTime<chrono::Utc>,
    pub symptoms: Vec<String>,
    pub metrics_snapshot: serde_json::Value,
}
