//! CLI module for `aipp-cli` subcommands.
//!
//! ## Usage
//!
//! ```bash
//! aipp-cli probe model.om          # Exit 0 if the file carries custom data
//! aipp-cli inspect model.om        # Envelope, payload digest, AIPP layout
//! aipp-cli inspect model.om --json # Same, as JSON
//! aipp-cli config show             # Effective AIPP_* settings
//! ```

pub mod config_cmd;
pub mod inspect_cmd;

pub use inspect_cmd::{build_report, run_inspect, run_probe, InspectReport};

/// Exit code for malformed command lines.
pub const EXIT_USAGE: i32 = 2;
