//! # Validate Subcommand
//!
//! Checks input files against the metadata-driven schema model and, when
//! one is configured, the derived JSON schema. Every issue of every file is
//! printed before the exit code signals failure.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use fourc_document::Document;
use fourc_schema::{audit_section_consistency, validate, JsonSchemaCheck, SchemaModel};
use tracing::warn;

use crate::schema::SchemaArgs;

/// Arguments for the `fourc validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input files to validate.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub schema: SchemaArgs,

    /// Also report sections known to only one of the two schema artifacts.
    #[arg(long)]
    pub audit: bool,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 if every file is valid, 1 if any file has issues or
/// cannot be parsed. Schema artifacts that fail to load are an operational
/// error.
pub fn run_validate(args: &ValidateArgs, config: Option<&Path>) -> Result<u8> {
    let sources = args.schema.resolve(config)?;
    let model = sources.load_model()?;
    let json_schema = sources.load_json_schema()?;

    if args.audit {
        match &json_schema {
            Some(check) => {
                let findings = audit_section_consistency(&model, check.schema());
                if !findings.is_empty() {
                    println!("Schema artifacts disagree on {} section(s):", findings.len());
                    for finding in &findings {
                        println!("{finding}");
                    }
                }
            }
            None => warn!("--audit needs a JSON schema; skipping the audit"),
        }
    }

    let total = args.files.len();
    let mut failed = 0usize;
    for path in &args.files {
        if !check_file(path, &model, json_schema.as_ref()) {
            failed += 1;
        }
    }

    println!("Inputs: {}/{} passed", total - failed, total);
    Ok(if failed == 0 { 0 } else { 1 })
}

/// Validate one file and print the outcome. Returns true if it passed.
fn check_file(path: &Path, model: &SchemaModel, json_schema: Option<&JsonSchemaCheck>) -> bool {
    let document = match Document::read(path) {
        Ok(document) => document,
        Err(e) => {
            println!("FAIL: {e}");
            return false;
        }
    };

    let issues = validate(document.root(), model);
    let violations = match json_schema.map(|check| check.check_document(document.root())) {
        None => Vec::new(),
        Some(Ok(violations)) => violations,
        Some(Err(e)) => {
            println!("FAIL: {}: {e}", path.display());
            return false;
        }
    };

    if issues.is_empty() && violations.is_empty() {
        println!("OK: {}", path.display());
        return true;
    }

    println!(
        "FAIL: {} ({} issue(s))",
        path.display(),
        issues.len() + violations.len()
    );
    if !issues.is_empty() {
        println!("{issues}");
    }
    if !violations.is_empty() {
        println!("  JSON schema:");
        for violation in &violations {
            println!("  {violation}");
        }
    }
    false
}
