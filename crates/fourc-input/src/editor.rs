//! # Editor
//!
//! Typed access to a document tree through a [`SchemaModel`].
//!
//! Reads see the document as JSON and fall back to the declared default for
//! absent values. Writes coerce the value to the declared type (see
//! [`crate::coerce`]) and go through [`DocumentNode::set`], so existing keys
//! keep their position and formatting and new keys are appended.

use fourc_core::DocPath;
use fourc_document::DocumentNode;
use fourc_schema::{MetadataEntry, SchemaModel};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::coerce::coerce;
use crate::error::AccessError;

/// Schema-aware reader and writer for document trees.
#[derive(Debug, Clone, Copy)]
pub struct Editor<'m> {
    model: &'m SchemaModel,
}

impl<'m> Editor<'m> {
    pub fn new(model: &'m SchemaModel) -> Self {
        Self { model }
    }

    /// The schema this editor checks against.
    pub fn model(&self) -> &'m SchemaModel {
        self.model
    }

    /// The value at `path`.
    ///
    /// A present value is returned as is, including an explicit null. An
    /// absent value resolves to the schema default, or `None` if the path
    /// declares no default. The document is never modified.
    ///
    /// # Errors
    ///
    /// [`AccessError::Path`] if the path contradicts the document's
    /// structure, [`AccessError::Document`] if the value has no JSON view.
    pub fn get(&self, root: &DocumentNode, path: &DocPath) -> Result<Option<Value>, AccessError> {
        match root.get(path)? {
            Some(node) => Ok(Some(node.to_json()?)),
            None => Ok(self.default(path).cloned()),
        }
    }

    /// [`get`](Self::get), deserialized into `T`.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`AccessError::TypeMismatch`] if the
    /// value does not deserialize into `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        root: &DocumentNode,
        path: &DocPath,
    ) -> Result<Option<T>, AccessError> {
        let Some(value) = self.get(root, path)? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AccessError::TypeMismatch {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// The declared default at `path`, if any.
    pub fn default(&self, path: &DocPath) -> Option<&'m Value> {
        self.model.lookup(path).and_then(MetadataEntry::default)
    }

    /// Write `value` at `path`, returning the node it replaced.
    ///
    /// The value is coerced when the schema declares the path; undeclared
    /// paths are written unchanged and left for validation to report.
    /// Missing intermediate mappings are created.
    ///
    /// # Errors
    ///
    /// [`AccessError::TypeMismatch`] if coercion fails,
    /// [`AccessError::Path`] on a structural contradiction. The document is
    /// unchanged on error.
    pub fn set(
        &self,
        root: &mut DocumentNode,
        path: &DocPath,
        value: Value,
    ) -> Result<Option<DocumentNode>, AccessError> {
        let value = match self.model.lookup(path) {
            Some(entry) => coerce(&value, entry, path)?,
            None => value,
        };
        Ok(root.set(path, DocumentNode::from_json(&value))?)
    }

    /// Remove the node at `path`, returning it if it was present.
    ///
    /// # Errors
    ///
    /// [`AccessError::Path`] on a structural contradiction or for the root
    /// path.
    pub fn remove(
        &self,
        root: &mut DocumentNode,
        path: &DocPath,
    ) -> Result<Option<DocumentNode>, AccessError> {
        Ok(root.remove(path)?)
    }
}
