//! Durable incident index and report files.
//!
//! The index is one JSON document holding every [`IndexEntry`]. Appending
//! reads the whole collection, pushes one entry and writes the whole
//! collection back. Concurrent writers can race and lose entries.

pub mod report;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::detect::Severity;

pub use report::{render_markdown, ReportStore};

pub const INDEX_FILE: &str = "index.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed index document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the artifacts of one incident report live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLocations {
    /// Rendered markdown report.
    pub markdown: PathBuf,
    /// Final pipeline state as JSON.
    pub state: PathBuf,
}

/// One record of the append-only incident index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub incident_id: String,
    pub service: String,
    pub severity: Severity,
    pub detected_at: DateTime<Utc>,
    pub report_locations: ReportLocations,
}

#[derive(Debug, Clone)]
pub struct IncidentIndex {
    path: PathBuf,
}

impl IncidentIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(INDEX_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full collection. A missing file is an empty index.
    pub fn load(&self) -> Result<Vec<IndexEntry>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Read-modify-write append. Returns the new number of entries.
    pub fn append(&self, entry: IndexEntry) -> Result<usize, StoreError> {
        let mut entries = self.load()?;
        entries.push(entry);
        let json = serde_json::to_vec_pretty(&entries)?;
        write_replace(&self.path, &json)?;
        debug!(path = %self.path.display(), entries = entries.len(), "Index updated");
        Ok(entries.len())
    }

    pub fn find(&self, incident_id: &str) -> Result<Option<IndexEntry>, StoreError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|e| e.incident_id == incident_id))
    }

    /// Most recently appended entry.
    pub fn latest(&self) -> Result<Option<IndexEntry>, StoreError> {
        Ok(self.load()?.pop())
    }
}

/// Replace `path` with `bytes` through a uniquely named sibling file so
/// readers never observe a half-written document.
pub(crate) fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        io_err(source)
    })
}
