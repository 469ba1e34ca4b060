//! # Access and Input Errors
//!
//! [`AccessError`] covers single-path reads and writes through the
//! [`Editor`](crate::Editor); [`InputError`] covers whole-file and
//! section-level operations on an [`InputFile`](crate::InputFile).
//! [`LegacyError`] names the line of a legacy section that could not be read.

use fourc_core::{Mismatch, PathError};
use fourc_document::{DocumentError, SyntaxError};
use fourc_schema::ValidationIssues;
use thiserror::Error;

use crate::legacy::LegacyKind;

/// Failure of a typed get or set.
#[derive(Error, Debug)]
pub enum AccessError {
    /// The path contradicts the structure of the document.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A value could not be coerced to the declared type without guessing.
    #[error("type mismatch at '{path}': {reason}")]
    TypeMismatch {
        /// Location of the value.
        path: String,
        /// What was expected and what was found.
        reason: String,
    },

    /// The stored value has no JSON view (NaN or infinity).
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// A legacy section line that does not follow the section's format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line} of legacy section '{section}': {reason}")]
pub struct LegacyError {
    pub section: String,
    /// 1-based position in the section's list of lines.
    pub line: usize,
    pub reason: String,
}

/// Failure of a section-level operation.
#[derive(Error, Debug)]
pub enum InputError {
    /// The section name is not declared in the schema.
    #[error("unknown section '{name}'{}", hint(.suggestion))]
    UnknownSection {
        name: String,
        /// Closest declared section, if any is similar enough.
        suggestion: Option<String>,
    },

    /// The section is declared but not present in this input.
    #[error("section '{name}' is not set{}", hint(.suggestion))]
    SectionNotSet {
        name: String,
        /// Closest section that is set, if any is similar enough.
        suggestion: Option<String>,
    },

    /// The document root is not a mapping of sections.
    #[error("an input file must be a mapping of sections, found {found}")]
    NotSections {
        /// Kind of the root node.
        found: &'static str,
    },

    /// Two inputs define the same sections and cannot be joined.
    #[error("sections defined in both inputs: {}", .sections.join(", "))]
    Overlap { sections: Vec<String> },

    /// The `INCLUDES` section is not a list of file paths.
    #[error("invalid INCLUDES section: {reason}")]
    InvalidIncludes { reason: String },

    /// The root of an input can only be changed section by section.
    #[error("cannot replace the root of an input file")]
    RootReplace,

    /// The section has no known legacy line format.
    #[error("section '{name}' is not an interpretable legacy section")]
    NotLegacy { name: String },

    /// Interpreted data of one legacy format written to a section of another.
    #[error("section '{name}' holds {expected}, not {found}")]
    LegacyMismatch {
        name: String,
        expected: LegacyKind,
        found: LegacyKind,
    },

    #[error(transparent)]
    Legacy(#[from] LegacyError),

    /// Validation before writing failed.
    #[error("input failed validation:\n{issues}")]
    Invalid { issues: ValidationIssues },

    /// Input text could not be parsed.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Access(#[from] AccessError),

    /// Two inputs differ beyond the comparison tolerance.
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
}

fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!("; did you mean '{s}'?"),
        None => String::new(),
    }
}
