//! Command-line arguments
//!
//! Every option can also come from an `AMD_*` environment variable. Values
//! given here override the TOML file.

use amd_common::config::{Backend, DevicePreference, TomlConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "amd-service")]
#[command(about = "Answering-machine detection inference service")]
#[command(version)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "AMD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "AMD_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "AMD_PORT")]
    pub port: Option<u16>,

    /// Model file (probe JSON or ONNX)
    #[arg(short, long, env = "AMD_MODEL")]
    pub model: Option<PathBuf>,

    /// Engine backend: probe or onnx
    #[arg(long, env = "AMD_BACKEND")]
    pub backend: Option<Backend>,

    /// Samples per model input at 16 kHz
    #[arg(long, env = "AMD_MAX_LENGTH")]
    pub max_length: Option<usize>,

    /// Compute device: auto, cpu or cuda
    #[arg(long, env = "AMD_DEVICE")]
    pub device: Option<DevicePreference>,

    /// Seed for simulated results
    #[arg(long, env = "AMD_FALLBACK_SEED")]
    pub fallback_seed: Option<u64>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "AMD_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    /// Overlay command-line values onto a loaded configuration
    pub fn apply(&self, config: &mut TomlConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(model) = &self.model {
            config.model.path = Some(model.clone());
        }
        if let Some(backend) = self.backend {
            config.model.backend = backend;
        }
        if let Some(max_length) = self.max_length {
            config.model.max_length = max_length;
        }
        if let Some(device) = self.device {
            config.model.device = device;
        }
        if let Some(seed) = self.fallback_seed {
            config.fallback.seed = Some(seed);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_apply_overrides_file_values() {
        let args = Args::try_parse_from([
            "amd-service",
            "--port",
            "9000",
            "--model",
            "/models/probe.json",
            "--backend",
            "onnx",
            "--fallback-seed",
            "3",
        ])
        .unwrap();

        let mut config = TomlConfig::default();
        config.server.host = "127.0.0.1".to_string();
        args.apply(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.path, Some(PathBuf::from("/models/probe.json")));
        assert_eq!(config.model.backend, Backend::Onnx);
        assert_eq!(config.fallback.seed, Some(3));
    }

    #[test]
    fn test_no_arguments_change_nothing() {
        let mut config = TomlConfig::default();
        Args::default().apply(&mut config);
        assert_eq!(config, TomlConfig::default());
    }

    #[test]
    fn test_invalid_backend_rejected() {
        assert!(Args::try_parse_from(["amd-service", "--backend", "tflite"]).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_variables() {
        std::env::set_var("AMD_PORT", "8123");
        std::env::set_var("AMD_DEVICE", "cpu");
        let args = Args::try_parse_from(["amd-service"]);
        std::env::remove_var("AMD_PORT");
        std::env::remove_var("AMD_DEVICE");

        let args = args.unwrap();
        assert_eq!(args.port, Some(8123));
        assert_eq!(args.device, Some(DevicePreference::Cpu));
    }

    #[test]
    #[serial]
    fn test_argument_beats_environment() {
        std::env::set_var("AMD_PORT", "8123");
        let args = Args::try_parse_from(["amd-service", "--port", "9001"]);
        std::env::remove_var("AMD_PORT");

        assert_eq!(args.unwrap().port, Some(9001));
    }
}
