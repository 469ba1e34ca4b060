//! # Get and Set Subcommands
//!
//! Typed single-value access to an input file through the schema: `get`
//! prints the value (or its declared default) as JSON, `set` coerces a
//! JSON value to the declared type and writes the file back with every
//! other line untouched.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use fourc_core::DocPath;
use fourc_input::{DumpOptions, InputFile};
use serde_json::Value;

use crate::schema::SchemaArgs;

/// Arguments for the `fourc get` subcommand.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Input file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dotted path, e.g. `STRUCTURAL DYNAMIC.TIMESTEP` or `FUNCT1[0].COMPONENT`.
    #[arg(value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

/// Arguments for the `fourc set` subcommand.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Input file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dotted path of the value to write.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// New value as JSON. Text that is not valid JSON is taken as a string.
    #[arg(value_name = "JSON")]
    pub value: String,

    /// Write the result here instead of overwriting FILE.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,
}

/// Execute the get subcommand.
///
/// Returns exit code: 0 if a value (or default) was printed, 1 if the path
/// holds nothing and declares no default.
pub fn run_get(args: &GetArgs, config: Option<&Path>) -> Result<u8> {
    let path = parse_path(&args.path)?;
    let input = read_input(&args.file, &args.schema, config)?;
    match input.get(&path)? {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(0)
        }
        None => {
            eprintln!("{}: not set and no default", args.path);
            Ok(1)
        }
    }
}

/// Execute the set subcommand.
///
/// Returns exit code: 0 after writing. A value that cannot be coerced is
/// an operational error and leaves the file unchanged.
pub fn run_set(args: &SetArgs, config: Option<&Path>) -> Result<u8> {
    let path = parse_path(&args.path)?;
    let mut input = read_input(&args.file, &args.schema, config)?;
    input
        .set(&path, parse_value(&args.value))
        .with_context(|| format!("cannot set '{}'", args.path))?;

    let output = args.output.as_deref().unwrap_or(&args.file);
    input.dump(output, DumpOptions::default())?;
    println!("set {} in {}", args.path, output.display());
    Ok(0)
}

fn parse_path(text: &str) -> Result<DocPath> {
    text.parse::<DocPath>()
        .with_context(|| format!("invalid path '{text}'"))
}

/// JSON if it parses, otherwise the raw text as a string.
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn read_input(file: &Path, schema: &SchemaArgs, config: Option<&Path>) -> Result<InputFile> {
    let model = schema.resolve(config)?.load_model()?;
    InputFile::read(file, model).with_context(|| format!("failed to read '{}'", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1e-6"), json!(1e-6));
        assert_eq!(parse_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_value("\"Superlu\""), json!("Superlu"));
        assert_eq!(parse_value("Superlu"), json!("Superlu"));
        assert_eq!(parse_value("null"), Value::Null);
    }
}
