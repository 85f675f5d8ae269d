use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_VERSION: u32 = 1;
const MIN_CAPABILITY_TIMEOUT_MS: u64 = 100;
const MAX_CAPABILITY_TIMEOUT_MS: u64 = 10 * 60 * 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read sequencer config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse sequencer config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize sequencer config {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write sequencer config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Identifies the submitting application to the printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_version")]
    pub app_version: String,
    #[serde(default = "default_os_name")]
    pub os_name: String,
}

fn default_app_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_os_name() -> String {
    std::env::consts::OS.to_string()
}

impl Default for SourceInfo {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            app_version: default_app_version(),
            os_name: default_os_name(),
        }
    }
}

impl SourceInfo {
    fn sanitize(&mut self) {
        if self.app_name.trim().is_empty() {
            self.app_name = default_app_name();
        }
        if self.app_version.trim().is_empty() {
            self.app_version = default_app_version();
        }
        if self.os_name.trim().is_empty() {
            self.os_name = default_os_name();
        }
    }
}

/// Settings of the job sequencer, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencerConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub source: SourceInfo,
    #[serde(default = "default_capability_timeout_ms")]
    pub capability_timeout_ms: u64,
    /// Directory the transport may dump job data into.
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_capability_timeout_ms() -> u64 {
    2 * 60 * 1000
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            source: SourceInfo::default(),
            capability_timeout_ms: default_capability_timeout_ms(),
            debug_dir: None,
        }
    }
}

impl SequencerConfig {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = CONFIG_VERSION;
        }
        self.source.sanitize();
        self.capability_timeout_ms = self
            .capability_timeout_ms
            .clamp(MIN_CAPABILITY_TIMEOUT_MS, MAX_CAPABILITY_TIMEOUT_MS);
        if matches!(&self.debug_dir, Some(dir) if dir.as_os_str().is_empty()) {
            self.debug_dir = None;
        }
    }

    pub fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config: SequencerConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;
        config.sanitize();
        Ok(config)
    }

    /// Loads `path`, or returns the defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let payload =
            serde_json::to_string_pretty(self).map_err(|source| ConfigError::Serialize {
                path: path.clone(),
                source,
            })?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| ConfigError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| ConfigError::Write { path, source })
    }
}
