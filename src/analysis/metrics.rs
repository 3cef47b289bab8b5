use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status label used when a tracked metric is absent from the snapshot.
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Per-category status digest of a metrics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsAnalysis {
    pub cpu_status: String,
    pub error_rate_status: String,
    pub latency_status: String,
    pub summary: String,
}

impl MetricsAnalysis {
    /// Label/value pairs in report order.
    pub fn fields(&self) -> [(&'static str, &str); 4] {
        [
            ("Cpu Status", self.cpu_status.as_str()),
            ("Error Rate Status", self.error_rate_status.as_str()),
            ("Latency Status", self.latency_status.as_str()),
            ("Summary", self.summary.as_str()),
        ]
    }
}

pub fn analyze_metrics(snapshot: &Value) -> MetricsAnalysis {
    let cpu_status = severity_at(snapshot, "/compute/cpu_percent/severity");
    let error_rate_status = severity_at(snapshot, "/traffic/error_rate_percent/severity");
    let latency_status = severity_at(snapshot, "/latency/latency_ms_p95/severity");

    let summary = format!(
        "CPU: {}, Errors: {}, Latency: {}",
        cpu_status, error_rate_status, latency_status
    );

    MetricsAnalysis {
        cpu_status,
        error_rate_status,
        latency_status,
        summary,
    }
}

fn severity_at(snapshot: &Value, pointer: &str) -> String {
    snapshot
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_STATUS)
        .to_string()
}
