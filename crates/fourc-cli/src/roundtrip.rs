//! # Roundtrip Subcommand
//!
//! Parses each file and serializes it again without edits. A representable
//! file must come back byte for byte; the first differing line is reported
//! otherwise. Needs no schema.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use fourc_document::{parse, serialize};

/// Arguments for the `fourc roundtrip` subcommand.
#[derive(Args, Debug)]
pub struct RoundtripArgs {
    /// Input files to check.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the roundtrip subcommand.
///
/// Returns exit code: 0 if every file round-trips, 1 otherwise.
pub fn run_roundtrip(args: &RoundtripArgs) -> Result<u8> {
    let mut failed = false;
    for path in &args.files {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                println!("FAIL: {}: {e}", path.display());
                failed = true;
                continue;
            }
        };
        let document = match parse(&text) {
            Ok(document) => document,
            Err(e) => {
                println!("FAIL: {}: {e}", path.display());
                failed = true;
                continue;
            }
        };
        let output = serialize(&document);
        match first_difference(&text, &output) {
            None => println!("OK: {}", path.display()),
            Some(line) => {
                println!("FAIL: {}: output differs at line {line}", path.display());
                failed = true;
            }
        }
    }
    Ok(u8::from(failed))
}

/// 1-based number of the first line that differs, if the texts differ.
pub fn first_difference(original: &str, output: &str) -> Option<usize> {
    if original == output {
        return None;
    }
    let mut a = original.split_inclusive('\n');
    let mut b = output.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => line += 1,
            _ => return Some(line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference("a\nb\n", "a\nb\n"), None);
        assert_eq!(first_difference("a\nb\n", "a\nc\n"), Some(2));
        assert_eq!(first_difference("a\nb\n", "a\nb"), Some(2));
        assert_eq!(first_difference("a\n", "a\nb\n"), Some(2));
    }
}
