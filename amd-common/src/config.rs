//! Configuration loading and resolution
//!
//! Bootstrap configuration comes from a TOML file. Every field has a compiled
//! default, so a missing file is not fatal.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`AMD_*`, applied by the binary through clap)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default sample budget fed to the classifier (5 seconds at 16 kHz)
pub const DEFAULT_MAX_LENGTH: usize = 80_000;

/// Default upload limit for a single audio part (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart
/// to pick up changes.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub fallback: FallbackConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on the request body size accepted by the prediction routes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Classification engine settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: Backend,
    /// Model file. When absent the engine never becomes ready and the
    /// service answers with simulated results.
    pub path: Option<PathBuf>,
    /// Number of 16 kHz samples in every model input (pad or truncate)
    pub max_length: usize,
    /// Zero-mean / unit-variance normalisation of the real samples
    pub normalize: bool,
    pub device: DevicePreference,
    /// Feed `attention_mask` alongside `input_values` (onnx backend only)
    pub use_attention_mask: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Probe,
            path: None,
            max_length: DEFAULT_MAX_LENGTH,
            normalize: true,
            device: DevicePreference::Auto,
            use_attention_mask: true,
        }
    }
}

/// Simulated-result settings
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FallbackConfig {
    /// Fixed RNG seed; OS entropy when unset
    pub seed: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Engine implementation selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Built-in dense probe over pooled frame statistics (JSON weights)
    Probe,
    /// ONNX Runtime session (requires the `onnx` feature of amd-service)
    Onnx,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Probe => write!(f, "probe"),
            Backend::Onnx => write!(f, "onnx"),
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probe" => Ok(Backend::Probe),
            "onnx" => Ok(Backend::Onnx),
            other => Err(Error::InvalidInput(format!(
                "unknown backend '{}' (expected probe or onnx)",
                other
            ))),
        }
    }
}

/// Requested compute device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cpu,
    Cuda,
}

impl FromStr for DevicePreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cpu" => Ok(DevicePreference::Cpu),
            "cuda" => Ok(DevicePreference::Cuda),
            other => Err(Error::InvalidInput(format!(
                "unknown device '{}' (expected auto, cpu or cuda)",
                other
            ))),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl TomlConfig {
    /// Parse a TOML file. Missing or malformed files are configuration errors.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve the configuration file and load it.
    ///
    /// An explicitly requested file must exist. Without one, the per-user
    /// default location is tried; when nothing is found the compiled defaults
    /// are used. The returned [`ConfigSource`] tells the caller which.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, ConfigSource)> {
        if let Some(path) = explicit {
            let config = Self::load(path)?;
            return Ok((config, ConfigSource::File(path.to_path_buf())));
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                let config = Self::load(&path)?;
                Ok((config, ConfigSource::File(path)))
            }
            _ => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(Error::Config(
                "server.max_upload_bytes must be non-zero".to_string(),
            ));
        }
        if self.model.max_length == 0 {
            return Err(Error::Config("model.max_length must be non-zero".to_string()));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::Config(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Where the resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Per-user configuration file location (`<config_dir>/amd/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("amd").join("config.toml"))
}
