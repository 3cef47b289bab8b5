//! TOML configuration for incidentflow.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration. The config file path can be overridden with the
//! `INCIDENTFLOW_CONFIG` environment variable.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "INCIDENTFLOW_CONFIG";
const LOCAL_CONFIG: &str = "incidentflow.toml";
const CHECKPOINT_FILE: &str = "latest_incident.json";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub textgen: TextGenConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Try, in order: `$INCIDENTFLOW_CONFIG`, `./incidentflow.toml`, defaults.
    ///
    /// A config file that exists but cannot be read or parsed is an error;
    /// only the absence of every candidate falls back to defaults.
    pub fn load_or_default() -> Result<Self> {
        if let Some(env_path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Self::load(Path::new(&env_path));
        }

        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            return Self::load(local);
        }

        Ok(Self::default())
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Metrics document to evaluate.
    pub metrics: PathBuf,
    /// Service log file scanned by the log analysis stage.
    pub logs: PathBuf,
    /// Directory holding rendered reports and `index.json`.
    pub reports_dir: PathBuf,
    /// State checkpoint rewritten after every pipeline stage. Unset means
    /// `latest_incident.json` inside `reports_dir`; empty disables it.
    pub checkpoint: Option<PathBuf>,
}

impl PathsConfig {
    pub fn checkpoint_path(&self) -> Option<PathBuf> {
        match &self.checkpoint {
            None => Some(self.reports_dir.join(CHECKPOINT_FILE)),
            Some(p) if p.as_os_str().is_empty() => None,
            Some(p) => Some(p.clone()),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            metrics: PathBuf::from("data/metrics/service_metrics.json"),
            logs: PathBuf::from("data/logs/service.log"),
            reports_dir: PathBuf::from("reports"),
            checkpoint: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Text generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGenConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl TextGenConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TextGenConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "meta-llama/llama-3.3-70b-instruct:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
