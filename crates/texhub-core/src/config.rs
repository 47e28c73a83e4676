/// TexHub configuration with layered resolution.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied by the caller on the returned struct)
/// 2. Environment variables (`TEXHUB_*`)
/// 3. Project config (`texhub.toml` in the project root)
/// 4. Compiled defaults
use crate::error::ConfigError;
use crate::features::SpreadMetric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the per-project config file.
pub const CONFIG_FILE_NAME: &str = "texhub.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TexHubConfig {
    pub scan: ScanConfig,
    pub paths: PathConfig,
}

/// Scan pacing and feature-extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Continuous work allowed before the scan yields and reports progress.
    pub frame_budget_ms: u64,
    /// Longest edge of the preview the colour analysis samples.
    pub preview_size: u32,
    /// Dispersion metric. Pinned for the whole catalog.
    pub spread_metric: SpreadMetric,
    /// Size of the analysis worker pool. 0 means one per CPU.
    pub worker_threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: 10,
            preview_size: 128,
            spread_metric: SpreadMetric::Hue,
            worker_threads: 0,
        }
    }
}

impl ScanConfig {
    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    /// Worker count with the "0 = all CPUs" default resolved.
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }
}

/// Project-relative locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub assets_dir: PathBuf,
    pub hub_dir: PathBuf,
    pub library_dir: PathBuf,
    pub catalog_file: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("Assets"),
            hub_dir: PathBuf::from("Assets/TexHub"),
            library_dir: PathBuf::from("Assets/TexHub/Library"),
            catalog_file: PathBuf::from("Library/TexHub/catalog.json"),
        }
    }
}

impl TexHubConfig {
    /// Load configuration for the project at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join(CONFIG_FILE_NAME);
        if project_config_path.exists() {
            let content = std::fs::read_to_string(&project_config_path).map_err(|source| {
                ConfigError::Io {
                    path: project_config_path.clone(),
                    source,
                }
            })?;
            config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: project_config_path.display().to_string(),
                message: e.to_string(),
            })?;
            debug!("Loaded {}", project_config_path.display());
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `TEXHUB_*` environment variables.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("TEXHUB_FRAME_BUDGET_MS") {
            self.scan.frame_budget_ms = parse_env("TEXHUB_FRAME_BUDGET_MS", &val)?;
        }
        if let Ok(val) = std::env::var("TEXHUB_WORKER_THREADS") {
            self.scan.worker_threads = parse_env("TEXHUB_WORKER_THREADS", &val)?;
        }
        if let Ok(val) = std::env::var("TEXHUB_SPREAD_METRIC") {
            self.scan.spread_metric = parse_env("TEXHUB_SPREAD_METRIC", &val)?;
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.frame_budget_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "scan.frame_budget_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.scan.preview_size < 4 {
            return Err(ConfigError::Invalid {
                field: "scan.preview_size".to_string(),
                message: "must be at least 4".to_string(),
            });
        }
        Ok(())
    }

    /// Absolute path of the catalog file for the project at `root`.
    pub fn catalog_path(&self, root: &Path) -> PathBuf {
        root.join(&self.paths.catalog_file)
    }
}

fn parse_env<T: std::str::FromStr>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        field: field.to_string(),
        message: e.to_string(),
    })
}
