//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables.

use tracing_subscriber::EnvFilter;

use crate::config::{self, EffectiveConfig, DEFAULT_MAX_MODEL_BYTES};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    for line in config_lines(&cfg) {
        println!("{}", line);
    }
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("AIPP_LOG_LEVEL=info");
    println!("AIPP_LOG_FORMAT=pretty");
    println!("AIPP_LOG_FILE=");
    println!("AIPP_MAX_MODEL_BYTES={}", DEFAULT_MAX_MODEL_BYTES);
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let warnings = validate(&config::load().effective_config());
    for w in &warnings {
        eprintln!("WARNING: {}", w);
    }
    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        1
    }
}

fn validate(cfg: &EffectiveConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Err(e) = EnvFilter::try_new(&cfg.log_level) {
        warnings.push(format!("AIPP_LOG_LEVEL ({}) is not a valid filter: {}", cfg.log_level, e));
    }

    if let Some(file) = &cfg.log_file {
        let parent = std::path::Path::new(file).parent();
        if let Some(dir) = parent.filter(|d| !d.as_os_str().is_empty()) {
            if !dir.is_dir() {
                warnings.push(format!("AIPP_LOG_FILE directory {} does not exist", dir.display()));
            }
        }
    }

    warnings
}

fn config_lines(cfg: &EffectiveConfig) -> Vec<String> {
    vec![
        format!("AIPP_LOG_LEVEL={}", cfg.log_level),
        format!("AIPP_LOG_FORMAT={}", cfg.log_format),
        format!("AIPP_LOG_FILE={}", cfg.log_file.as_deref().unwrap_or("")),
        format!("AIPP_MAX_MODEL_BYTES={}", cfg.max_model_bytes),
    ]
}
