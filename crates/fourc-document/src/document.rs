//! # Document
//!
//! A parsed file: the root node plus everything outside it (directives, the
//! `---` line, trailing comments) and the line-ending style.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use fourc_core::{DocPath, PathError};
use serde_json::Value;
use tracing::debug;

use crate::error::{DocumentError, SyntaxError};
use crate::node::{Decor, DocumentNode, MappingNode};

/// One YAML document with its formatting.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) root: DocumentNode,
    /// Formatting of a root written inline (scalar or flow collection).
    pub(crate) root_decor: Decor,
    pub(crate) leading: Vec<String>,
    pub(crate) trailing: Vec<String>,
    pub(crate) crlf: bool,
    pub(crate) final_newline: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DocumentNode::Mapping(MappingNode::new()))
    }
}

impl Document {
    /// A generated document around `root`.
    pub fn new(root: DocumentNode) -> Self {
        Self {
            root,
            root_decor: Decor::default(),
            leading: Vec::new(),
            trailing: Vec::new(),
            crlf: false,
            final_newline: true,
        }
    }

    /// A generated document from JSON data.
    pub fn from_json(value: &Value) -> Self {
        Self::new(DocumentNode::from_json(value))
    }

    /// Parse document text. See [`crate::parse`].
    ///
    /// # Errors
    ///
    /// [`SyntaxError`] for malformed or unrepresentable text.
    pub fn parse(text: &str) -> Result<Self, SyntaxError> {
        crate::parse::parse(text)
    }

    /// Read and parse a file.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Io`] if the file cannot be read,
    /// [`DocumentError::Syntax`] if it cannot be parsed.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let document = Self::parse(&text).map_err(|source| DocumentError::Syntax {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "read document");
        Ok(document)
    }

    /// Serialize and write to a file.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Io`] if the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        std::fs::write(path, self.serialize()).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "wrote document");
        Ok(())
    }

    /// Serialize to text. See [`crate::serialize`].
    pub fn serialize(&self) -> String {
        crate::emit::serialize(self)
    }

    /// The root node.
    pub fn root(&self) -> &DocumentNode {
        &self.root
    }

    /// The mutable root node.
    pub fn root_mut(&mut self) -> &mut DocumentNode {
        &mut self.root
    }

    /// Consume the document, returning the root node.
    pub fn into_root(self) -> DocumentNode {
        self.root
    }

    /// True if the source used CRLF line endings.
    pub fn uses_crlf(&self) -> bool {
        self.crlf
    }

    /// See [`DocumentNode::get`].
    ///
    /// # Errors
    ///
    /// [`PathError`] on a structural contradiction.
    pub fn get(&self, path: &DocPath) -> Result<Option<&DocumentNode>, PathError> {
        self.root.get(path)
    }

    /// See [`DocumentNode::set`].
    ///
    /// # Errors
    ///
    /// [`PathError`] on a structural contradiction.
    pub fn set(
        &mut self,
        path: &DocPath,
        value: DocumentNode,
    ) -> Result<Option<DocumentNode>, PathError> {
        self.root.set(path, value)
    }

    /// See [`DocumentNode::remove`].
    ///
    /// # Errors
    ///
    /// [`PathError`] on a structural contradiction or for the root path.
    pub fn remove(&mut self, path: &DocPath) -> Result<Option<DocumentNode>, PathError> {
        self.root.remove(path)
    }

    /// JSON view of the root.
    ///
    /// # Errors
    ///
    /// [`DocumentError::NotRepresentable`] for NaN and infinite floats.
    pub fn to_json(&self) -> Result<Value, DocumentError> {
        self.root.to_json()
    }

    /// Structural equality of the roots. Formatting is ignored.
    pub fn content_eq(&self, other: &Document) -> bool {
        self.root.content_eq(&other.root)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Document {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.4C.yaml");
        std::fs::write(&path, "TITLE:\n  - demo # first\n").unwrap();

        let mut doc = Document::read(&path).unwrap();
        doc.set(&"PROBLEM SIZE.DIM".parse().unwrap(), DocumentNode::scalar(3))
            .unwrap();
        doc.write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "TITLE:\n  - demo # first\nPROBLEM SIZE:\n  DIM: 3\n");
    }

    #[test]
    fn test_read_missing_file() {
        let err = Document::read("/nonexistent/input.yaml").unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }

    #[test]
    fn test_read_reports_syntax_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "a: [1, 2\n").unwrap();
        let err = Document::read(&path).unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }

    #[test]
    fn test_display_matches_serialize() {
        let doc: Document = "a: 1\n".parse().unwrap();
        assert_eq!(doc.to_string(), "a: 1\n");
    }
}
