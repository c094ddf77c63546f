//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `AIPP_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `AIPP_LOG_LEVEL` | info | Log filter directive |
//! | `AIPP_LOG_FORMAT` | pretty | `json` or `pretty` |
//! | `AIPP_LOG_FILE` | unset | Log output file (stderr if unset) |
//! | `AIPP_MAX_MODEL_BYTES` | 2147483648 | Max model buffer/file size (bytes) |

use std::path::PathBuf;

use serde::Serialize;

use crate::telemetry::{LogConfig, LogFormat};

/// Default upper bound on model buffers and files (2 GiB).
pub const DEFAULT_MAX_MODEL_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Smallest accepted model size limit (1 KiB).
pub const MIN_MAX_MODEL_BYTES: u64 = 1024;

/// Effective runtime configuration summary (serializable).
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<String>,
    pub max_model_bytes: u64,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log: LogConfig,
    pub max_model_bytes: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log: default_log_config(),
            max_model_bytes: DEFAULT_MAX_MODEL_BYTES,
        }
    }
}

fn default_log_config() -> LogConfig {
    LogConfig {
        format: LogFormat::Pretty,
        ..LogConfig::default()
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a log format name, returning `default` on missing or unknown.
fn parse_log_format(key: &str, default: LogFormat) -> LogFormat {
    match std::env::var(key) {
        Ok(val) => match val.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let defaults = default_log_config();
    let level = std::env::var("AIPP_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(defaults.level);
    let format = parse_log_format("AIPP_LOG_FORMAT", defaults.format);
    let output_path = std::env::var("AIPP_LOG_FILE")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    LogConfig {
        format,
        level,
        output_path,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let max_model_bytes = parse_u64("AIPP_MAX_MODEL_BYTES", DEFAULT_MAX_MODEL_BYTES);
    let max_model_bytes = max_model_bytes.max(MIN_MAX_MODEL_BYTES);

    EnvConfig {
        log: load_log_config(),
        max_model_bytes,
    }
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            log_level: self.log.level.clone(),
            log_format: match self.log.format {
                LogFormat::Json => "json".to_string(),
                LogFormat::Pretty => "pretty".to_string(),
            },
            log_file: self
                .log
                .output_path
                .as_ref()
                .map(|p| p.display().to_string()),
            max_model_bytes: self.max_model_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "AIPP_LOG_LEVEL",
        "AIPP_LOG_FORMAT",
        "AIPP_LOG_FILE",
        "AIPP_MAX_MODEL_BYTES",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        assert!(cfg.log.output_path.is_none());
        assert_eq!(cfg.max_model_bytes, 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("AIPP_LOG_LEVEL", "aipp_runtime=debug");
        std::env::set_var("AIPP_LOG_FORMAT", "JSON");
        std::env::set_var("AIPP_LOG_FILE", "/tmp/aipp.log");
        std::env::set_var("AIPP_MAX_MODEL_BYTES", "1048576");
        let cfg = load();
        assert_eq!(cfg.log.level, "aipp_runtime=debug");
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert_eq!(cfg.log.output_path, Some(PathBuf::from("/tmp/aipp.log")));
        assert_eq!(cfg.max_model_bytes, 1_048_576);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("AIPP_MAX_MODEL_BYTES", "lots");
        std::env::set_var("AIPP_LOG_FORMAT", "xml");
        std::env::set_var("AIPP_LOG_LEVEL", "  ");
        let cfg = load();
        assert_eq!(cfg.max_model_bytes, DEFAULT_MAX_MODEL_BYTES);
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        assert_eq!(cfg.log.level, "info");
        clear_env_vars();
    }

    #[test]
    fn test_model_size_floor() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("AIPP_MAX_MODEL_BYTES", "0");
        let cfg = load();
        assert!(cfg.max_model_bytes >= 1024, "model size limit must have floor");
        clear_env_vars();
    }

    #[test]
    fn test_effective_config_contains_all_fields() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let eff = load().effective_config();
        assert_eq!(eff.log_format, "pretty");
        assert!(eff.log_file.is_none());
        assert!(eff.max_model_bytes >= MIN_MAX_MODEL_BYTES);
        let json = serde_json::to_value(&eff).unwrap();
        assert_eq!(json["log_level"], "info");
    }
}
