//! `aipp-cli` entry point.
//!
//! ## CLI Subcommands
//!
//! - `aipp-cli probe <FILE>` - Check for a custom-data envelope (exit 0/1)
//! - `aipp-cli inspect <FILE>` - Summarize custom data and AIPP layout
//! - `aipp-cli config show|defaults|validate` - Environment configuration

use std::process::ExitCode;

use aipp_runtime::cli::{config_cmd, run_inspect, run_probe, EXIT_USAGE};
use aipp_runtime::config;
use aipp_runtime::telemetry::init_logging;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    let env = config::load();
    if let Err(e) = init_logging(&env.log) {
        eprintln!("Logging disabled: {}", e);
    }

    match command {
        "probe" => match args.get(2) {
            Some(path) => exit(run_probe(path)),
            None => usage_error("probe"),
        },
        "inspect" => run_inspect_command(&args),
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => exit(config_cmd::run_validate()),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    exit(EXIT_USAGE)
                }
            }
        }
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("aipp-cli {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            exit(EXIT_USAGE)
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

fn usage_error(command: &str) -> ExitCode {
    print_command_help(command);
    exit(EXIT_USAGE)
}

/// Parse `inspect <FILE> [--json] [--data-inputs N]`.
fn run_inspect_command(args: &[String]) -> ExitCode {
    let mut path = None;
    let mut json = false;
    let mut data_inputs = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => {
                json = true;
                i += 1;
            }
            "--data-inputs" => match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                Some(n) => {
                    data_inputs = Some(n);
                    i += 2;
                }
                None => {
                    eprintln!("Missing or invalid value for --data-inputs");
                    return usage_error("inspect");
                }
            },
            arg if path.is_none() && !arg.starts_with("--") => {
                path = Some(arg.to_string());
                i += 1;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                return usage_error("inspect");
            }
        }
    }

    match path {
        Some(path) => exit(run_inspect(&path, json, data_inputs)),
        None => usage_error("inspect"),
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "aipp-cli - AIPP model custom-data tool v{}

USAGE:
    aipp-cli [COMMAND] [OPTIONS]

COMMANDS:
    probe        Check whether a model file carries custom data
    inspect      Show custom data, payload digest and AIPP input layout
    config       Show configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

ENVIRONMENT:
    AIPP_LOG_LEVEL        Log filter (default: info)
    AIPP_LOG_FORMAT       json or pretty (default: pretty)
    AIPP_LOG_FILE         Log output file (default: stderr)
    AIPP_MAX_MODEL_BYTES  Largest model file accepted (default: 2 GiB)

EXIT CODES:
    0  Success
    1  Failure / no custom data
    2  Usage error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "probe" => {
            eprintln!(
                "aipp-cli probe - Check for custom data

USAGE:
    aipp-cli probe <FILE>

DESCRIPTION:
    Reads only the first four bytes of FILE and reports whether they are
    the custom-data magic.

EXIT CODES:
    0  Custom data present
    1  No custom data, or the file cannot be read
"
            );
        }
        "inspect" => {
            eprintln!(
                "aipp-cli inspect - Summarize a model file

USAGE:
    aipp-cli inspect <FILE> [OPTIONS]

OPTIONS:
    --json             Output in JSON format
    --data-inputs N    Inputs the compiled graph consumes
                       (default: smallest count the configs allow)

DESCRIPTION:
    Decodes the custom-data envelope, hashes the model payload with
    SHA-256 and, for AIPP models, lists each node's static features,
    dynamic parameter inputs and the caller-facing input layout.

EXAMPLES:
    aipp-cli inspect resnet.om
    aipp-cli inspect resnet.om --json --data-inputs 2
"
            );
        }
        "config" => {
            eprintln!(
                "aipp-cli config - Show configuration

USAGE:
    aipp-cli config <SUBCOMMAND>

SUBCOMMANDS:
    show           Show current configuration
    defaults       Show default configuration
    validate       Check the log filter and log file directory
"
            );
        }
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'aipp-cli help' for general usage.",
                command
            );
        }
    }
}
