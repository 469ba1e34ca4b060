//! # Schema Errors
//!
//! Metadata loading is all-or-nothing: every [`MetadataFormatError`] aborts
//! construction of the schema model and names the metadata path at fault
//! (`sections.SOLVER 1.SOLVER`, `definitions.material[2]`).

use fourc_document::DocumentError;
use thiserror::Error;

/// The metadata artifact could not be turned into a schema model.
#[derive(Error, Debug)]
pub enum MetadataFormatError {
    /// The metadata text is not valid YAML, or does not have the expected
    /// top-level layout.
    #[error("invalid metadata: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The metadata file could not be read.
    #[error("cannot read metadata file '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An entry declares a `type` the loader does not know.
    #[error("unknown type '{type_name}' at '{path}'")]
    UnknownType {
        /// Metadata path of the entry.
        path: String,
        /// The declared type.
        type_name: String,
    },

    /// A named entry (section, mapping child, definition) has no name.
    #[error("entry at '{path}' has no name")]
    MissingName {
        /// Metadata path of the entry.
        path: String,
    },

    /// An entry lacks a field its type needs (`spec` of a list, `ref` of a
    /// reference, ...).
    #[error("entry at '{path}' is missing '{field}'")]
    MissingField {
        /// Metadata path of the entry.
        path: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// Two siblings (or two definitions) share a name.
    #[error("duplicate name '{name}' at '{path}'")]
    DuplicateName {
        /// Metadata path of the parent.
        path: String,
        /// The repeated name.
        name: String,
    },

    /// A reference names a definition that does not exist.
    #[error("reference to undefined '{reference}' at '{path}'")]
    DanglingReference {
        /// Metadata path of the reference.
        path: String,
        /// The referenced name.
        reference: String,
    },

    /// A legacy element or particle spec does not describe a line layout.
    #[error("invalid legacy spec at '{path}': {reason}")]
    InvalidLegacySpec {
        /// Metadata path of the spec.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Definitions reference each other in a loop.
    #[error("cyclic reference at '{path}': {chain}")]
    CyclicReference {
        /// Metadata path where the loop closed.
        path: String,
        /// The loop, written `a -> b -> a`.
        chain: String,
    },

    /// A default value does not have the declared type.
    #[error("invalid default at '{path}': {reason}")]
    InvalidDefault {
        /// Metadata path of the entry.
        path: String,
        /// What is wrong with the default.
        reason: String,
    },
}

/// The derived JSON schema could not be loaded, compiled, or applied.
#[derive(Error, Debug)]
pub enum JsonSchemaError {
    /// The schema file could not be read.
    #[error("cannot read JSON schema '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("invalid JSON schema '{path}': {source}")]
    Json {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The compiled validator could not be built.
    #[error("cannot compile JSON schema: {reason}")]
    Build {
        /// Reason reported by the schema compiler.
        reason: String,
    },

    /// The document has no JSON view (NaN or infinite floats).
    #[error(transparent)]
    Document(#[from] DocumentError),
}
