//! # fourc-core — Foundational Types for the 4C Input Toolkit
//!
//! Leaf crate of the workspace. Every other `fourc-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One path type.** Documents and schemas are addressed with the same
//!    [`DocPath`] (`Solver.tolerance`, `FUNCT1[0].COMPONENT`). Validation
//!    issues, accessor errors, and schema lookups all speak it.
//!
//! 2. **Structural errors are values.** [`PathError`] describes impossible
//!    access (descending into a scalar, indexing a mapping) and is always
//!    recoverable by the caller.
//!
//! 3. **Tolerant comparison.** [`compare_values`] compares nested JSON views
//!    of two inputs with numeric tolerances, mirroring how simulation inputs
//!    are compared in practice.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `fourc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod compare;
pub mod error;
pub mod path;
pub mod suggest;

// Re-export primary types for ergonomic imports.
pub use compare::{compare_values, Mismatch, Tolerance};
pub use error::{PathError, PathParseError};
pub use path::{DocPath, PathSegment};
pub use suggest::{closest_match, similarity};
