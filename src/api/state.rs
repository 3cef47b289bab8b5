use std::path::PathBuf;

use crate::config::AppConfig;
use crate::storage::ReportStore;

#[derive(Clone)]
pub struct AppState {
    pub store: ReportStore,
    /// Latest pipeline checkpoint, if checkpointing is enabled.
    pub checkpoint: Option<PathBuf>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            store: ReportStore::new(&config.paths.reports_dir),
            checkpoint: config.paths.checkpoint_path(),
        }
    }
}
