//! Structured logging setup for the library and the `aipp-cli` binary.

mod logging;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
