//! # Derived JSON Schema Check
//!
//! 4C ships a JSON schema generated from the same source as the metadata
//! artifact. [`JsonSchemaCheck`] compiles it with the `jsonschema` crate and
//! applies it to the JSON view of a document, as an independent second
//! opinion next to the metadata-driven validator.
//!
//! ## Schema Resolution
//!
//! The derived schema is self-contained: every `$ref` points into its own
//! `$defs`. The retriever installed here refuses all external URIs, so
//! compiling a schema never touches the network.

use std::fmt;
use std::path::Path;

use fourc_document::DocumentNode;
use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use tracing::debug;

use crate::error::JsonSchemaError;

/// Retriever that resolves nothing.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema '{}' is not available offline", uri.as_str()).into())
    }
}

/// A single violation of the derived schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating value in the document.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Compiled derived schema.
pub struct JsonSchemaCheck {
    schema: Value,
    validator: Validator,
}

impl fmt::Debug for JsonSchemaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaCheck")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl JsonSchemaCheck {
    /// Compile a schema value.
    ///
    /// # Errors
    ///
    /// [`JsonSchemaError::Build`] if the schema is invalid or references an
    /// external document.
    pub fn new(schema: Value) -> Result<Self, JsonSchemaError> {
        let mut opts = jsonschema::options();
        opts.with_retriever(OfflineRetriever);
        let validator = opts.build(&schema).map_err(|e| JsonSchemaError::Build {
            reason: e.to_string(),
        })?;
        Ok(Self { schema, validator })
    }

    /// Read and compile a schema file.
    ///
    /// # Errors
    ///
    /// [`JsonSchemaError::Io`] or [`JsonSchemaError::Json`] if the file
    /// cannot be read or parsed, otherwise as [`JsonSchemaCheck::new`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, JsonSchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| JsonSchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let schema: Value = serde_json::from_str(&text).map_err(|source| JsonSchemaError::Json {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "loaded JSON schema");
        Self::new(schema)
    }

    /// The schema as loaded.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// All violations of a JSON instance, in the order the validator
    /// reports them.
    pub fn check(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// All violations of a document's JSON view.
    ///
    /// # Errors
    ///
    /// [`JsonSchemaError::Document`] if the document contains NaN or
    /// infinite floats, which have no JSON view.
    pub fn check_document(&self, node: &DocumentNode) -> Result<Vec<Violation>, JsonSchemaError> {
        let instance = node.to_json()?;
        Ok(self.check(&instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourc_document::Document;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "properties": {
                "Solver": {
                    "type": "object",
                    "properties": {"tolerance": {"$ref": "#/$defs/positive"}},
                    "required": ["tolerance"],
                    "additionalProperties": false
                }
            },
            "$defs": {"positive": {"type": "number", "exclusiveMinimum": 0}}
        })
    }

    #[test]
    fn test_valid_document() {
        let check = JsonSchemaCheck::new(schema()).unwrap();
        let doc = Document::parse("Solver:\n  tolerance: 1e-6\n").unwrap();
        assert!(check.check_document(doc.root()).unwrap().is_empty());
    }

    #[test]
    fn test_reports_every_violation() {
        let check = JsonSchemaCheck::new(schema()).unwrap();
        let doc = Document::parse("Solver:\n  tolerance: -1\n  extra: 1\n").unwrap();
        let violations = check.check_document(doc.root()).unwrap();
        assert_eq!(violations.len(), 2, "{violations:?}");
        assert!(violations.iter().any(|v| v.instance_path == "/Solver/tolerance"));
    }

    #[test]
    fn test_external_reference_is_not_fetched() {
        let schema = json!({"$ref": "https://example.com/remote.schema.json"});
        let err = JsonSchemaCheck::new(schema).unwrap_err();
        assert!(matches!(err, JsonSchemaError::Build { .. }));
    }

    #[test]
    fn test_nan_has_no_json_view() {
        let check = JsonSchemaCheck::new(json!({})).unwrap();
        let doc = Document::parse("x: .nan\n").unwrap();
        let err = check.check_document(doc.root()).unwrap_err();
        assert!(matches!(err, JsonSchemaError::Document(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(&path, schema().to_string()).unwrap();
        let check = JsonSchemaCheck::from_path(&path).unwrap();
        assert_eq!(check.schema()["type"], "object");

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonSchemaCheck::from_path(&path),
            Err(JsonSchemaError::Json { .. })
        ));
    }
}
