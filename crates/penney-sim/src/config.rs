use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_DECKS_PER_BATCH: usize = 10_000;
const DEFAULT_COMMIT_EVERY: usize = 10_000;
const DEFAULT_PROGRESS_EVERY: usize = 10_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root simulation configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub run_id: String,
    pub decks: DeckConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub commit: CommitConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate a configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        let mut cfg: SimulationConfig = serde_yaml::from_reader(BufReader::new(file))
            .map_err(|source| ConfigError::Parse {
                source,
                path: path.to_path_buf(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without touching the filesystem.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.decks.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.commit.validate()?;
        self.progress.validate()?;
        self.logging.normalize();
        Ok(())
    }

    /// Expand `{run_id}` placeholders in the output paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            data_dir: resolve_template(&self.run_id, &self.outputs.data_dir),
            results_dir: resolve_template(&self.run_id, &self.outputs.results_dir),
            plots_dir: self
                .outputs
                .plots_dir
                .as_ref()
                .map(|dir| resolve_template(&self.run_id, dir)),
        }
    }
}

/// Deck generation configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeckConfig {
    /// Decks to generate before scoring; zero means score whatever is
    /// already pending.
    pub count: usize,
    /// Base seed for batch generation; defaults to one past the
    /// highest seed already present in the data directory.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_decks_per_batch")]
    pub per_batch: usize,
}

impl DeckConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.per_batch == 0 {
            return Err(invalid("decks.per_batch", "batch size must be at least 1"));
        }
        Ok(())
    }
}

fn default_decks_per_batch() -> usize {
    DEFAULT_DECKS_PER_BATCH
}

/// Output directory configuration. `plots_dir` is optional; omit it to
/// skip heatmap rendering.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub data_dir: String,
    pub results_dir: String,
    #[serde(default)]
    pub plots_dir: Option<String>,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        let mut entries = vec![
            ("outputs.data_dir", &self.data_dir),
            ("outputs.results_dir", &self.results_dir),
        ];
        if let Some(plots) = self.plots_dir.as_ref() {
            entries.push(("outputs.plots_dir", plots));
        }

        for (label, value) in entries {
            if value.trim().is_empty() {
                return Err(invalid(label, "path must not be empty"));
            }
            if resolve_template(run_id, value).components().count() == 0 {
                return Err(invalid(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Commit cadence: the table is persisted after any batch that brings
/// the number of uncommitted decks to this threshold, and at end of
/// input.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CommitConfig {
    #[serde(default = "default_commit_every")]
    pub every_decks: usize,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            every_decks: DEFAULT_COMMIT_EVERY,
        }
    }
}

impl CommitConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.every_decks == 0 {
            return Err(invalid(
                "commit.every_decks",
                "commit cadence must be at least 1 deck",
            ));
        }
        Ok(())
    }
}

fn default_commit_every() -> usize {
    DEFAULT_COMMIT_EVERY
}

/// Progress reporting cadence, informational only.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProgressConfig {
    #[serde(default = "default_progress_every")]
    pub every_decks: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            every_decks: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl ProgressConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.every_decks == 0 {
            return Err(invalid(
                "progress.every_decks",
                "progress cadence must be at least 1 deck",
            ));
        }
        Ok(())
    }
}

fn default_progress_every() -> usize {
    DEFAULT_PROGRESS_EVERY
}

/// Structured logging is opt-in; the level falls back to "info".
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        self.tracing_level.trim().parse().ok()
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(invalid("run_id", "run_id must not be empty"));
    }
    if let Some(bad) = run_id.chars().find(|c| !RUN_ID_ALLOWED.contains(*c)) {
        return Err(invalid(
            "run_id",
            format!("character '{bad}' is not allowed (alphanumerics, '.', '_' and '-' only)"),
        ));
    }
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Output directories with all placeholders expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub data_dir: PathBuf,
    pub results_dir: PathBuf,
    pub plots_dir: Option<PathBuf>,
}

/// Failures while reading or parsing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// A field-level validation failure.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
