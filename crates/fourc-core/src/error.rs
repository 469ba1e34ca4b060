//! # Path Errors
//!
//! Errors shared by every crate that navigates a document tree. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Path errors name the path at which navigation failed, rendered in
//!   dotted form, so that a caller can report them without extra context.
//! - Absence is not an error: a path that simply does not exist resolves to
//!   `None`. Only structural contradictions produce a [`PathError`].

use thiserror::Error;

/// Structurally impossible access to a document tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path continued below a scalar value.
    #[error("cannot descend into scalar value at '{path}'")]
    ThroughScalar {
        /// Path of the scalar that blocked navigation.
        path: String,
    },

    /// A key segment was applied to something other than a mapping.
    #[error("expected a mapping at '{path}', found a {found}")]
    NotAMapping {
        /// Path of the offending node.
        path: String,
        /// Kind of node actually found.
        found: &'static str,
    },

    /// An index segment was applied to something other than a sequence.
    #[error("expected a sequence at '{path}', found a {found}")]
    NotASequence {
        /// Path of the offending node.
        path: String,
        /// Kind of node actually found.
        found: &'static str,
    },

    /// An index was written past the end of a sequence.
    #[error("index {index} is out of range at '{path}' (length {len})")]
    IndexOutOfRange {
        /// Path of the sequence.
        path: String,
        /// Requested index.
        index: usize,
        /// Current sequence length.
        len: usize,
    },

    /// The root of a document cannot be removed.
    #[error("the document root cannot be removed")]
    RemoveRoot,

    /// The textual path could not be parsed.
    #[error(transparent)]
    Parse(#[from] PathParseError),
}

/// A dotted path string that does not follow the `a.b[0].c` grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid path '{path}': {reason}")]
pub struct PathParseError {
    /// The rejected input.
    pub path: String,
    /// Why it was rejected.
    pub reason: String,
}
