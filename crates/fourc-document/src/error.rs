//! # Document Errors
//!
//! [`SyntaxError`] is fatal for the one document being parsed and never
//! touches other documents or the schema. [`DocumentError`] wraps it
//! together with the I/O and conversion failures of the file helpers.

use thiserror::Error;

/// Malformed or unrepresentable input text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// The text is not well-formed.
    #[error("line {line}: {message}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The text is well-formed YAML but uses a feature the document model
    /// cannot represent losslessly.
    #[error("line {line}: unsupported YAML feature: {feature}")]
    Unsupported {
        /// 1-based line number.
        line: usize,
        /// The feature, e.g. "anchors".
        feature: String,
    },
}

impl SyntaxError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        SyntaxError::Malformed {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(line: usize, feature: impl Into<String>) -> Self {
        SyntaxError::Unsupported {
            line,
            feature: feature.into(),
        }
    }

    /// Line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            SyntaxError::Malformed { line, .. } | SyntaxError::Unsupported { line, .. } => *line,
        }
    }
}

/// Error from loading, saving, or converting a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document text could not be parsed.
    #[error("syntax error in '{path}': {source}")]
    Syntax {
        /// Source file, or `<memory>`.
        path: String,
        /// Underlying syntax error.
        #[source]
        source: SyntaxError,
    },

    /// A float that JSON cannot represent (NaN or infinity).
    #[error("value at '{path}' cannot be represented as JSON: {value}")]
    NotRepresentable {
        /// Location of the value.
        path: String,
        /// The offending value as written.
        value: String,
    },

    /// IO error reading or writing a document.
    #[error("io error for '{path}': {source}")]
    Io {
        /// File being read or written.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
