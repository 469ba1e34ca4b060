//! # fourc-cli — Command-Line Interface for 4C Input Files
//!
//! Provides the `fourc` binary, a thin layer over the library crates.
//!
//! ## Subcommands
//!
//! - `fourc validate` — Check input files against the schema artifacts.
//! - `fourc roundtrip` — Verify that files survive parse and serialize unchanged.
//! - `fourc get` / `fourc set` — Typed access to single values.
//! - `fourc config` — Show, list, and switch schema profiles.
//!
//! ```bash
//! fourc validate input.4C.yaml --metadata 4C_metadata.yaml
//! fourc set input.4C.yaml "STRUCTURAL DYNAMIC.NUMSTEP" 20
//! fourc config use nightly
//! ```
//!
//! ## Exit Codes
//!
//! `0` success, `1` invalid input, `2` operational error (unreadable
//! schema, bad configuration, failed write).
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handler functions delegate to the library crates.
//! - Handlers return `anyhow::Result<u8>` with the exit code.

pub mod config;
pub mod edit;
pub mod roundtrip;
pub mod schema;
pub mod validate;
