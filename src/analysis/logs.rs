use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const ERROR_MARKER: &str = "ERROR";
const WARN_MARKER: &str = "WARN";

/// Source of raw log lines for the service under investigation.
pub trait LogSource: Send + Sync {
    fn read_lines(&self) -> Result<Vec<String>>;
}

/// Reads every line of a log file.
#[derive(Debug, Clone)]
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LogSource for FileLogSource {
    fn read_lines(&self) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read log file: {}", self.path.display()))?;
        Ok(content.lines().map(str::to_string).collect())
    }
}

/// Error/warning counts over a batch of log lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub error_count: usize,
    pub warning_count: usize,
    /// Text following the first `ERROR` marker of each error line.
    pub key_errors: Vec<String>,
    pub summary: String,
}

pub fn analyze_logs<S: AsRef<str>>(lines: &[S]) -> LogAnalysis {
    let mut analysis = LogAnalysis::default();

    for line in lines {
        let line = line.as_ref();
        if let Some((_, rest)) = line.split_once(ERROR_MARKER) {
            analysis.error_count += 1;
            analysis.key_errors.push(rest.trim().to_string());
        } else if line.contains(WARN_MARKER) {
            analysis.warning_count += 1;
        }
    }

    analysis.summary = if analysis.error_count > 0 {
        "Multiple errors detected in logs".to_string()
    } else {
        "No critical log errors".to_string()
    };
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_example() {
        let lines = ["2024 ERROR disk full", "2024 WARN high latency", "2024 INFO ok"];
        let analysis = analyze_logs(&lines);
        assert_eq!(analysis.error_count, 1);
        assert_eq!(analysis.warning_count, 1);
        assert_eq!(analysis.key_errors, vec!["disk full"]);
        assert_eq!(analysis.summary, "Multiple errors detected in logs");
    }

    #[test]
    fn test_error_wins_over_warn_and_keeps_remainder() {
        let lines = ["WARN then ERROR connection refused ERROR again"];
        let analysis = analyze_logs(&lines);
        assert_eq!(analysis.error_count, 1);
        assert_eq!(analysis.warning_count, 0);
        assert_eq!(analysis.key_errors, vec!["connection refused ERROR again"]);
    }

    #[test]
    fn test_clean_logs() {
        let analysis = analyze_logs::<&str>(&[]);
        assert_eq!(analysis.error_count, 0);
        assert!(analysis.key_errors.is_empty());
        assert_eq!(analysis.summary, "No critical log errors");

        let analysis = analyze_logs(&["WARNING: slow query"]);
        assert_eq!(analysis.warning_count, 1);
        assert_eq!(analysis.summary, "No critical log errors");
    }

    #[test]
    fn test_file_log_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("service.log");
        std::fs::write(&path, "a ERROR x\nb INFO y\n").unwrap();

        let lines = FileLogSource::new(&path).read_lines().unwrap();
        assert_eq!(lines, vec!["a ERROR x", "b INFO y"]);

        let missing = FileLogSource::new(dir.path().join("nope.log"));
        assert!(missing.read_lines().is_err());
    }
}
