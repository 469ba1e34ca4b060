//! # Artifact Consistency
//!
//! The metadata artifact and the derived JSON schema are generated from the
//! same source and refreshed together. A section present in only one of
//! them means the pair is out of sync.

use std::fmt;

use serde_json::Value;

use crate::model::SchemaModel;

/// Which artifact a section is missing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionSource {
    /// Declared in the metadata, absent from the JSON schema.
    MetadataOnly,
    /// Declared in the JSON schema, absent from the metadata.
    JsonSchemaOnly,
}

/// A section that only one artifact knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFinding {
    /// Section name (or pattern, for `FUNCT*`-style metadata sections).
    pub section: String,
    pub source: SectionSource,
}

impl fmt::Display for SectionFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = match self.source {
            SectionSource::MetadataOnly => "only in metadata",
            SectionSource::JsonSchemaOnly => "only in JSON schema",
        };
        write!(f, "  {}: {location}", self.section)
    }
}

/// Compare the sections of a schema model with the top-level `properties`
/// of a derived JSON schema.
///
/// A metadata pattern section such as `FUNCT*` counts as present if the
/// JSON schema has a property it matches or a `patternProperties` key
/// mentioning its prefix.
pub fn audit_section_consistency(model: &SchemaModel, json_schema: &Value) -> Vec<SectionFinding> {
    let properties: Vec<&str> = json_schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let patterns: Vec<&str> = json_schema
        .get("patternProperties")
        .and_then(Value::as_object)
        .map(|props| props.keys().map(String::as_str).collect())
        .unwrap_or_default();

    let mut findings = Vec::new();

    for section in model.root().children() {
        let name = section.name();
        let present = match name.strip_suffix('*') {
            Some(prefix) => {
                properties.iter().any(|p| p.starts_with(prefix))
                    || patterns.iter().any(|p| p.contains(prefix))
            }
            None => properties.contains(&name),
        };
        if !present {
            findings.push(SectionFinding {
                section: name.to_string(),
                source: SectionSource::MetadataOnly,
            });
        }
    }

    for name in properties {
        if !model.is_known_section(name) {
            findings.push(SectionFinding {
                section: name.to_string(),
                source: SectionSource::JsonSchemaOnly,
            });
        }
    }

    findings
}
