use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{CustomizationError, Result};
use crate::logging::{FileSink, LogLevel, Logger};

use super::audit::{HostAudit, NullHostAudit};

/// Engine version reported to plugins when the host does not override it.
pub const DEFAULT_ENGINE_VERSION: Version = Version::new(8, 12, 0);

const DEFAULT_METRICS_TARGET: &str = "dashboard::host.metrics";
const DEFAULT_LOG_MAX_BYTES: u64 = 1024 * 1024;

/// Runtime configuration for [`PluginHost`](super::PluginHost).
#[derive(Clone)]
pub struct HostConfig {
    pub engine_version: Version,
    /// Optional structured logger shared with every session the host opens.
    pub logger: Option<Logger>,
    pub audit: Arc<dyn HostAudit>,
    /// Reject plugins whose descriptor engine range excludes `engine_version`.
    pub enforce_engine_range: bool,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engine_version: DEFAULT_ENGINE_VERSION,
            logger: None,
            audit: Arc::new(NullHostAudit),
            enforce_engine_range: true,
            metrics_target: DEFAULT_METRICS_TARGET.to_string(),
        }
    }
}

impl HostConfig {
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_audit<A>(mut self, audit: A) -> Self
    where
        A: HostAudit + 'static,
    {
        self.audit = Arc::new(audit);
        self
    }

    pub fn with_engine_version(mut self, version: Version) -> Self {
        self.engine_version = version;
        self
    }
}

impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("engine_version", &self.engine_version)
            .field("logger", &self.logger)
            .field("enforce_engine_range", &self.enforce_engine_range)
            .field("metrics_target", &self.metrics_target)
            .finish_non_exhaustive()
    }
}

/// Serializable host settings, typically read from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub engine_version: Version,
    pub enforce_engine_range: bool,
    pub log_file: Option<PathBuf>,
    /// File sink truncates once this size would be exceeded. Zero disables it.
    pub log_max_bytes: u64,
    pub log_level: LogLevel,
    pub metrics_target: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            engine_version: DEFAULT_ENGINE_VERSION,
            enforce_engine_range: true,
            log_file: None,
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            log_level: LogLevel::Info,
            metrics_target: DEFAULT_METRICS_TARGET.to_string(),
        }
    }
}

impl HostSettings {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load settings from `path`. A missing or empty file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Self::from_json_str(&raw)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Build a [`HostConfig`], opening the log file when one is configured.
    pub fn into_config(self) -> Result<HostConfig> {
        if self.metrics_target.trim().is_empty() {
            return Err(CustomizationError::Config(
                "metrics_target must not be empty".to_string(),
            ));
        }

        let logger = match &self.log_file {
            Some(path) => {
                let sink = FileSink::new(path, self.log_max_bytes).map_err(|err| {
                    CustomizationError::Config(format!(
                        "cannot open log file {}: {err}",
                        path.display()
                    ))
                })?;
                Some(Logger::new(sink).with_min_level(self.log_level))
            }
            None => None,
        };

        Ok(HostConfig {
            engine_version: self.engine_version,
            logger,
            audit: Arc::new(NullHostAudit),
            enforce_engine_range: self.enforce_engine_range,
            metrics_target: self.metrics_target,
        })
    }
}
