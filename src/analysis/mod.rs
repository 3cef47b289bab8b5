//! Metrics and log analysis stages.

pub mod logs;
pub mod metrics;

pub use logs::{analyze_logs, FileLogSource, LogAnalysis, LogSource};
pub use metrics::{analyze_metrics, MetricsAnalysis};
