//! # fourc CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fourc_cli::config::{run_config, ConfigArgs};
use fourc_cli::edit::{run_get, run_set, GetArgs, SetArgs};
use fourc_cli::roundtrip::{run_roundtrip, RoundtripArgs};
use fourc_cli::validate::{run_validate, ValidateArgs};

/// Exit code for operational errors.
const EXIT_ERROR: u8 = 2;

/// 4C input file toolkit.
///
/// Validates input files against the 4C metadata artifact, checks lossless
/// round-trips, and edits single values with schema-aware coercion.
#[derive(Parser, Debug)]
#[command(name = "fourc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file (default: $FOURC_CONFIG or ./fourc.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate input files against the schema.
    Validate(ValidateArgs),

    /// Check that input files serialize back to their exact text.
    Roundtrip(RoundtripArgs),

    /// Print a value, or its schema default, as JSON.
    Get(GetArgs),

    /// Write a value, coerced to its declared type.
    Set(SetArgs),

    /// Show or switch schema profiles.
    Config(ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, config),
        Commands::Roundtrip(args) => run_roundtrip(&args),
        Commands::Get(args) => run_get(&args, config),
        Commands::Set(args) => run_set(&args, config),
        Commands::Config(args) => run_config(&args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourc_cli::config::ConfigCommand;

    #[test]
    fn cli_parse_validate_files() {
        let cli = Cli::try_parse_from([
            "fourc",
            "validate",
            "a.4C.yaml",
            "b.4C.yaml",
            "--metadata",
            "meta.yaml",
        ])
        .unwrap();
        if let Commands::Validate(args) = cli.command {
            assert_eq!(args.files.len(), 2);
            assert_eq!(args.schema.metadata, Some(PathBuf::from("meta.yaml")));
            assert!(args.schema.json_schema.is_none());
            assert!(!args.audit);
        } else {
            panic!("expected validate");
        }
    }

    #[test]
    fn cli_parse_validate_requires_a_file() {
        assert!(Cli::try_parse_from(["fourc", "validate"]).is_err());
    }

    #[test]
    fn cli_parse_set_with_output() {
        let cli = Cli::try_parse_from([
            "fourc",
            "set",
            "in.4C.yaml",
            "PROBLEM SIZE.DIM",
            "2",
            "-o",
            "out.4C.yaml",
            "--profile",
            "nightly",
        ])
        .unwrap();
        if let Commands::Set(args) = cli.command {
            assert_eq!(args.path, "PROBLEM SIZE.DIM");
            assert_eq!(args.value, "2");
            assert_eq!(args.output, Some(PathBuf::from("out.4C.yaml")));
            assert_eq!(args.schema.profile.as_deref(), Some("nightly"));
        } else {
            panic!("expected set");
        }
    }

    #[test]
    fn cli_parse_global_flags() {
        let cli =
            Cli::try_parse_from(["fourc", "config", "use", "pinned", "-vv", "--config", "c.yaml"])
                .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("c.yaml")));
        if let Commands::Config(args) = cli.command {
            assert!(matches!(args.command, ConfigCommand::Use { ref name } if name == "pinned"));
        } else {
            panic!("expected config");
        }
    }
}
