//! # Metadata Loader
//!
//! Reads the 4C metadata artifact and builds a [`SchemaModel`].
//!
//! ## Layout
//!
//! ```yaml
//! metadata:
//!   version: "2025.1"
//!   description_section_name: TITLE
//! legacy_string_sections: ["NODE COORDS", "DNODE-NODE TOPOLOGY"]
//! definitions:            # named entries, usable through `type: reference`
//!   - name: solver_params
//!     type: group
//!     specs: [...]
//! sections:               # a list, or `{ specs: [...] }`
//!   - name: PROBLEM SIZE
//!     type: group
//!     specs:
//!       - { name: DIM, type: int, default: 3 }
//! ```
//!
//! ## Resolution
//!
//! Loading runs in two passes. The first collects every definition by name;
//! the second builds the entry tree, resolving each reference on first use
//! and memoizing the result, so forward references are fine. Definitions
//! that no section uses are resolved too: a dangling reference anywhere in
//! the artifact fails the load.
//!
//! `all_of` splices its specs into the enclosing mapping. `one_of` splices
//! the entries of every alternative in as optional children; a name that
//! appears in several alternatives is kept once.
//!
//! The optional `legacy_element_specs` and `legacy_particle_specs` blocks
//! are built with the same resolver into [`LegacySpecs`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::error::MetadataFormatError;
use crate::legacy::{CellSpec, LegacySpecs};
use crate::model::{EntryKind, MetadataEntry, PrimitiveType, SchemaModel, WILDCARD};

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    metadata: RawHeader,
    #[serde(default)]
    legacy_string_sections: Vec<String>,
    #[serde(default)]
    definitions: Vec<RawEntry>,
    #[serde(default)]
    sections: RawSections,
    legacy_element_specs: Option<RawEntry>,
    legacy_particle_specs: Option<RawEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHeader {
    #[serde(default, deserialize_with = "text")]
    version: Option<String>,
    description_section_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSections {
    List(Vec<RawEntry>),
    Group { specs: Vec<RawEntry> },
}

impl Default for RawSections {
    fn default() -> Self {
        RawSections::List(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawEntry {
    name: Option<String>,
    #[serde(rename = "type")]
    type_name: Option<String>,
    required: Option<bool>,
    noneable: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    description: Option<String>,
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default)]
    specs: Vec<RawEntry>,
    spec: Option<Box<RawEntry>>,
    value_type: Option<Box<RawEntry>>,
    size: Option<usize>,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

impl RawEntry {
    fn splices(&self) -> bool {
        matches!(self.type_name.as_deref(), Some("all_of" | "one_of"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawChoice {
    Name(String),
    Named { name: String },
}

impl RawChoice {
    fn name(&self) -> &str {
        match self {
            RawChoice::Name(name) | RawChoice::Named { name } => name,
        }
    }
}

/// Distinguishes `default: null` from an absent default.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Accepts `version: 2025.1` as well as `version: "2025.1"`.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn join(path: &str, name: &str) -> String {
    format!("{path}.{name}")
}

/// Build a schema model from metadata text.
///
/// # Errors
///
/// Returns [`MetadataFormatError`] for malformed YAML, unknown types,
/// unnamed or duplicate entries, dangling or cyclic references, and
/// defaults that do not match their declared type.
pub fn load(text: &str) -> Result<SchemaModel, MetadataFormatError> {
    let raw: RawMetadata = serde_yaml::from_str(text)?;

    let mut definitions = HashMap::new();
    for (i, definition) in raw.definitions.iter().enumerate() {
        let Some(name) = definition.name.as_deref() else {
            return Err(MetadataFormatError::MissingName {
                path: format!("definitions[{i}]"),
            });
        };
        if definitions.insert(name, definition).is_some() {
            return Err(MetadataFormatError::DuplicateName {
                path: "definitions".to_string(),
                name: name.to_string(),
            });
        }
    }

    let mut resolver = Resolver {
        definitions,
        resolved: HashMap::new(),
        stack: Vec::new(),
    };

    let specs = match &raw.sections {
        RawSections::List(specs) | RawSections::Group { specs } => specs,
    };
    let mut sections = resolver.children(specs, "sections")?;

    for definition in &raw.definitions {
        if let Some(name) = definition.name.as_deref() {
            resolver.definition(name, &join("definitions", name))?;
        }
    }

    let mut legacy = LegacySpecs::default();
    if let Some(elements) = &raw.legacy_element_specs {
        legacy.elements = element_specs(&mut resolver, elements)?;
    }
    if let Some(particle) = &raw.legacy_particle_specs {
        legacy.particle = resolver.children(particle_specs(particle), "legacy_particle_specs")?;
    }

    let text_sections = raw
        .metadata
        .description_section_name
        .iter()
        .chain(&raw.legacy_string_sections);
    for name in text_sections {
        if sections.iter().any(|s| s.name == *name) {
            return Err(MetadataFormatError::DuplicateName {
                path: "sections".to_string(),
                name: name.clone(),
            });
        }
        sections.push(Arc::new(string_lines(name)));
    }

    debug!(
        sections = sections.len(),
        definitions = raw.definitions.len(),
        element_types = legacy.elements.len(),
        version = raw.metadata.version.as_deref().unwrap_or("unknown"),
        "loaded metadata"
    );

    let mut root = MetadataEntry::new("", EntryKind::Mapping);
    root.children = sections;
    Ok(SchemaModel::new(
        root,
        raw.legacy_string_sections,
        raw.metadata.description_section_name,
        raw.metadata.version,
    )
    .with_legacy_specs(legacy))
}

/// Cell layouts per element type. An element type holds either a `one_of`
/// over cell groups or a single cell group.
fn element_specs<'a>(
    resolver: &mut Resolver<'a>,
    raw: &'a RawEntry,
) -> Result<BTreeMap<String, BTreeMap<String, CellSpec>>, MetadataFormatError> {
    let mut elements = BTreeMap::new();
    for (i, element) in raw.specs.iter().enumerate() {
        let Some(element_type) = element.name.as_deref() else {
            return Err(MetadataFormatError::MissingName {
                path: format!("legacy_element_specs[{i}]"),
            });
        };
        let path = join("legacy_element_specs", element_type);
        let groups = match element.specs.first() {
            Some(first) if first.type_name.as_deref() == Some("one_of") => &first.specs[..],
            Some(_) => &element.specs[..1],
            None => {
                return Err(MetadataFormatError::MissingField { path, field: "specs" });
            }
        };

        let mut cells = BTreeMap::new();
        for (j, group) in groups.iter().enumerate() {
            let Some(cell_type) = group.name.as_deref() else {
                return Err(MetadataFormatError::MissingName {
                    path: format!("{path}[{j}]"),
                });
            };
            let cell_path = join(&path, cell_type);
            let mut parameters = resolver.children(&group.specs, &cell_path)?;
            let connectivity = match parameters.first() {
                Some(first) if first.name == cell_type => parameters.remove(0),
                _ => {
                    return Err(MetadataFormatError::InvalidLegacySpec {
                        path: cell_path,
                        reason: format!("first entry must be the '{cell_type}' connectivity"),
                    });
                }
            };
            let Some(nodes) = connectivity.size.filter(|_| connectivity.kind == EntryKind::Sequence)
            else {
                return Err(MetadataFormatError::InvalidLegacySpec {
                    path: cell_path,
                    reason: "connectivity must be a vector with a size".to_string(),
                });
            };
            let cell = CellSpec {
                cell_type: cell_type.to_string(),
                nodes,
                parameters,
            };
            if cells.insert(cell_type.to_string(), cell).is_some() {
                return Err(MetadataFormatError::DuplicateName {
                    path,
                    name: cell_type.to_string(),
                });
            }
        }
        if elements.insert(element_type.to_string(), cells).is_some() {
            return Err(MetadataFormatError::DuplicateName {
                path: "legacy_element_specs".to_string(),
                name: element_type.to_string(),
            });
        }
    }
    Ok(elements)
}

/// Particle specs are a group, or a bare `all_of`/`one_of`.
fn particle_specs(raw: &RawEntry) -> &[RawEntry] {
    match raw.type_name.as_deref() {
        Some("group") => &raw.specs,
        _ => std::slice::from_ref(raw),
    }
}

/// Read a metadata file and build a schema model from it.
///
/// # Errors
///
/// [`MetadataFormatError::Io`] if the file cannot be read, otherwise as
/// [`load`].
pub fn load_path(path: impl AsRef<Path>) -> Result<SchemaModel, MetadataFormatError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MetadataFormatError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load(&text)
}

/// An optional section holding free text, one string per line.
fn string_lines(name: &str) -> MetadataEntry {
    let mut section = MetadataEntry::new(name, EntryKind::Sequence);
    section.children = vec![Arc::new(MetadataEntry::new(
        "",
        EntryKind::Primitive(PrimitiveType::String),
    ))];
    section
}

struct Resolver<'a> {
    definitions: HashMap<&'a str, &'a RawEntry>,
    resolved: HashMap<&'a str, Arc<MetadataEntry>>,
    /// Definitions currently being resolved, outermost first.
    stack: Vec<&'a str>,
}

impl<'a> Resolver<'a> {
    /// Children of a mapping, with `all_of`/`one_of` spliced in.
    fn children(
        &mut self,
        specs: &'a [RawEntry],
        path: &str,
    ) -> Result<Vec<Arc<MetadataEntry>>, MetadataFormatError> {
        let mut children = Vec::new();
        self.splice(specs, path, false, &mut children)?;

        let mut seen = HashSet::new();
        for child in &children {
            if !seen.insert(child.name.as_str()) {
                return Err(MetadataFormatError::DuplicateName {
                    path: path.to_string(),
                    name: child.name.clone(),
                });
            }
        }
        Ok(children)
    }

    fn splice(
        &mut self,
        specs: &'a [RawEntry],
        path: &str,
        optional: bool,
        out: &mut Vec<Arc<MetadataEntry>>,
    ) -> Result<(), MetadataFormatError> {
        for (i, raw) in specs.iter().enumerate() {
            let here = match raw.name.as_deref() {
                Some(name) => join(path, name),
                None => format!("{path}[{i}]"),
            };
            match raw.type_name.as_deref() {
                Some("all_of") => self.splice(&raw.specs, &here, optional, out)?,
                Some("one_of") => {
                    let mut alternatives = Vec::new();
                    self.splice(&raw.specs, &here, true, &mut alternatives)?;
                    let mut names = HashSet::new();
                    out.extend(
                        alternatives
                            .into_iter()
                            .filter(|entry| names.insert(entry.name.clone())),
                    );
                }
                Some("reference") => {
                    let (name, target) = self.target(raw, &here)?;
                    if target.splices() {
                        self.enter(name, &here)?;
                        self.splice(std::slice::from_ref(target), &here, optional, out)?;
                        self.stack.pop();
                    } else {
                        out.push(relax(self.reference(raw, &here)?, optional));
                    }
                }
                _ => {
                    if raw.name.is_none() {
                        return Err(MetadataFormatError::MissingName { path: here });
                    }
                    out.push(relax(self.entry(raw, &here)?, optional));
                }
            }
        }
        Ok(())
    }

    /// Build one entry. Unnamed entries (sequence elements, map values)
    /// get an empty name.
    fn entry(
        &mut self,
        raw: &'a RawEntry,
        path: &str,
    ) -> Result<Arc<MetadataEntry>, MetadataFormatError> {
        let Some(type_name) = raw.type_name.as_deref() else {
            return Err(MetadataFormatError::MissingField {
                path: path.to_string(),
                field: "type",
            });
        };
        if type_name == "reference" {
            return self.reference(raw, path);
        }

        let name = raw.name.clone().unwrap_or_default();
        let mut entry = match (PrimitiveType::from_type_name(type_name), type_name) {
            (Some(primitive), _) => MetadataEntry::new(name, EntryKind::Primitive(primitive)),
            (None, "enum") => {
                let mut entry = MetadataEntry::new(name, EntryKind::Enum);
                entry.allowed_values = raw.choices.iter().map(|c| c.name().to_string()).collect();
                entry
            }
            (None, "group" | "mapping") => {
                let mut entry = MetadataEntry::new(name, EntryKind::Mapping);
                entry.children = self.children(&raw.specs, path)?;
                entry
            }
            (None, "all_of" | "one_of") => {
                let mut entry = MetadataEntry::new(name, EntryKind::Mapping);
                entry.children = self.children(std::slice::from_ref(raw), path)?;
                entry
            }
            (None, "list" | "sequence") => {
                let spec = required_field(raw.spec.as_deref(), path, "spec")?;
                let mut entry = MetadataEntry::new(name, EntryKind::Sequence);
                entry.children = vec![self.entry(spec, &format!("{path}[]"))?];
                entry.size = raw.size;
                entry
            }
            (None, "vector") => {
                let value_type = required_field(raw.value_type.as_deref(), path, "value_type")?;
                let mut entry = MetadataEntry::new(name, EntryKind::Sequence);
                entry.children = vec![self.entry(value_type, &format!("{path}[]"))?];
                entry.size = raw.size;
                entry
            }
            (None, "map") => {
                let value_type = required_field(raw.value_type.as_deref(), path, "value_type")?;
                let mut value = (*self.entry(value_type, &join(path, WILDCARD))?).clone();
                value.name = WILDCARD.to_string();
                value.required = false;
                let mut entry = MetadataEntry::new(name, EntryKind::Mapping);
                entry.children = vec![Arc::new(value)];
                entry
            }
            (None, other) => {
                return Err(MetadataFormatError::UnknownType {
                    path: path.to_string(),
                    type_name: other.to_string(),
                })
            }
        };

        entry.required = raw.required.unwrap_or(false);
        entry.noneable = raw.noneable.unwrap_or(false);
        entry.description = raw.description.clone();
        if let Some(default) = &raw.default {
            check_default(&entry, default, path)?;
            entry.default = Some(default.clone());
        }
        Ok(Arc::new(entry))
    }

    /// Resolve a `type: reference` entry. Fields given on the reference
    /// (`name`, `required`, `noneable`, `default`, `description`) override
    /// the definition's.
    fn reference(
        &mut self,
        raw: &'a RawEntry,
        path: &str,
    ) -> Result<Arc<MetadataEntry>, MetadataFormatError> {
        let (name, _) = self.target(raw, path)?;
        let resolved = self.definition(name, path)?;

        let mut entry = (*resolved).clone();
        if let Some(own_name) = &raw.name {
            entry.name = own_name.clone();
        }
        if let Some(required) = raw.required {
            entry.required = required;
        }
        if let Some(noneable) = raw.noneable {
            entry.noneable = noneable;
        }
        if raw.description.is_some() {
            entry.description = raw.description.clone();
        }
        if let Some(default) = &raw.default {
            check_default(&entry, default, path)?;
            entry.default = Some(default.clone());
        }
        entry.resolved_from = Some(name.to_string());
        Ok(Arc::new(entry))
    }

    /// The built entry of a definition, memoized.
    fn definition(
        &mut self,
        name: &'a str,
        path: &str,
    ) -> Result<Arc<MetadataEntry>, MetadataFormatError> {
        if let Some(entry) = self.resolved.get(name) {
            return Ok(Arc::clone(entry));
        }
        let Some(&raw) = self.definitions.get(name) else {
            return Err(MetadataFormatError::DanglingReference {
                path: path.to_string(),
                reference: name.to_string(),
            });
        };
        self.enter(name, path)?;
        let entry = self.entry(raw, &join("definitions", name))?;
        self.stack.pop();
        self.resolved.insert(name, Arc::clone(&entry));
        Ok(entry)
    }

    fn target(
        &self,
        raw: &'a RawEntry,
        path: &str,
    ) -> Result<(&'a str, &'a RawEntry), MetadataFormatError> {
        let name = required_field(raw.reference.as_deref(), path, "ref")?;
        match self.definitions.get(name) {
            Some(&target) => Ok((name, target)),
            None => Err(MetadataFormatError::DanglingReference {
                path: path.to_string(),
                reference: name.to_string(),
            }),
        }
    }

    fn enter(&mut self, name: &'a str, path: &str) -> Result<(), MetadataFormatError> {
        if let Some(start) = self.stack.iter().position(|s| *s == name) {
            let mut chain: Vec<&str> = self.stack[start..].to_vec();
            chain.push(name);
            return Err(MetadataFormatError::CyclicReference {
                path: path.to_string(),
                chain: chain.join(" -> "),
            });
        }
        self.stack.push(name);
        Ok(())
    }
}

fn required_field<'r, T: ?Sized>(
    value: Option<&'r T>,
    path: &str,
    field: &'static str,
) -> Result<&'r T, MetadataFormatError> {
    value.ok_or_else(|| MetadataFormatError::MissingField {
        path: path.to_string(),
        field,
    })
}

/// `entry` with `required` cleared when it comes from a `one_of`.
fn relax(entry: Arc<MetadataEntry>, optional: bool) -> Arc<MetadataEntry> {
    if optional && entry.required {
        let mut relaxed = (*entry).clone();
        relaxed.required = false;
        Arc::new(relaxed)
    } else {
        entry
    }
}

fn check_default(
    entry: &MetadataEntry,
    default: &Value,
    path: &str,
) -> Result<(), MetadataFormatError> {
    let valid = match (default, entry.kind) {
        (Value::Null, _) => entry.noneable,
        (_, EntryKind::Primitive(primitive)) => primitive.accepts_json(default),
        (_, EntryKind::Enum) => default
            .as_str()
            .is_some_and(|s| entry.allowed_values.contains(s)),
        (_, EntryKind::Mapping) => default.is_object(),
        (_, EntryKind::Sequence) => default
            .as_array()
            .is_some_and(|items| entry.size.map_or(true, |size| size == items.len())),
    };
    if valid {
        Ok(())
    } else {
        Err(MetadataFormatError::InvalidDefault {
            path: path.to_string(),
            reason: format!("{default} is not a valid {}", entry.type_description()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fourc_core::DocPath;

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    const SOLVER: &str = r#"
sections:
  - name: Solver
    type: group
    specs:
      - name: tolerance
        type: float
        required: true
"#;

    #[test]
    fn test_load_minimal() {
        let model = load(SOLVER).unwrap();
        assert_eq!(model.section_names(), ["Solver"]);
        assert!(model.is_required(&path("Solver.tolerance")));
        assert_eq!(
            model.lookup(&path("Solver.tolerance")).unwrap().kind(),
            EntryKind::Primitive(PrimitiveType::Double)
        );
    }

    #[test]
    fn test_sections_as_group() {
        let text = "sections:\n  specs:\n    - {name: A, type: int}\n";
        let model = load(text).unwrap();
        assert!(model.is_known_section("A"));
    }

    #[test]
    fn test_forward_reference_resolves() {
        let text = r#"
sections:
  - {name: SOLVER 1, type: reference, ref: solver, required: true}
definitions:
  - name: solver
    type: group
    specs:
      - {name: SOLVER, type: enum, choices: [UMFPACK, Superlu], required: true}
      - {name: NAME, type: string, default: "No_name"}
"#;
        let model = load(text).unwrap();
        let section = model.lookup(&path("SOLVER 1")).unwrap();
        assert_eq!(section.resolved_from(), Some("solver"));
        assert!(section.is_required());
        let solver = model.lookup(&path("SOLVER 1.SOLVER")).unwrap();
        assert!(solver.allowed_values().contains("Superlu"));
        assert_eq!(
            model.lookup(&path("SOLVER 1.NAME")).unwrap().default(),
            Some(&Value::from("No_name"))
        );
    }

    #[test]
    fn test_dangling_reference_fails() {
        let text = "sections:\n  - {name: A, type: reference, ref: nowhere}\n";
        let err = load(text).unwrap_err();
        assert!(
            matches!(&err, MetadataFormatError::DanglingReference { path, reference }
                if path == "sections.A" && reference == "nowhere"),
            "{err}"
        );
    }

    #[test]
    fn test_dangling_reference_in_unused_definition_fails() {
        let text = r#"
sections: []
definitions:
  - {name: a, type: list, spec: {type: reference, ref: missing}}
"#;
        let err = load(text).unwrap_err();
        assert!(matches!(err, MetadataFormatError::DanglingReference { .. }));
    }

    #[test]
    fn test_cyclic_reference_fails() {
        let text = r#"
sections:
  - {name: A, type: reference, ref: a}
definitions:
  - name: a
    type: group
    specs:
      - {name: inner, type: reference, ref: b}
  - name: b
    type: list
    spec: {type: reference, ref: a}
"#;
        let err = load(text).unwrap_err();
        match err {
            MetadataFormatError::CyclicReference { chain, .. } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("expected CyclicReference, got {other}"),
        }
    }

    #[test]
    fn test_unknown_type_names_path() {
        let text = "sections:\n  - name: A\n    type: group\n    specs:\n      - {name: x, type: quaternion}\n";
        let err = load(text).unwrap_err();
        assert_eq!(err.to_string(), "unknown type 'quaternion' at 'sections.A.x'");
    }

    #[test]
    fn test_missing_name_fails() {
        let text = "sections:\n  - {type: int}\n";
        let err = load(text).unwrap_err();
        assert!(matches!(err, MetadataFormatError::MissingName { path } if path == "sections[0]"));
    }

    #[test]
    fn test_duplicate_sibling_fails() {
        let text = "sections:\n  - name: A\n    type: group\n    specs:\n      - {name: x, type: int}\n      - {name: x, type: bool}\n";
        let err = load(text).unwrap_err();
        assert!(
            matches!(&err, MetadataFormatError::DuplicateName { path, name } if path == "sections.A" && name == "x")
        );
    }

    #[test]
    fn test_invalid_default_fails() {
        for spec in [
            "{name: x, type: int, default: 1.5}",
            "{name: x, type: enum, choices: [a, b], default: c}",
            "{name: x, type: vector, value_type: {type: double}, size: 3, default: [1.0]}",
            "{name: x, type: string, default: null}",
        ] {
            let text = format!("sections:\n  - {spec}\n");
            let err = load(&text).unwrap_err();
            assert!(
                matches!(err, MetadataFormatError::InvalidDefault { .. }),
                "{spec}: {err}"
            );
        }
        let noneable = "sections:\n  - {name: x, type: string, noneable: true, default: null}\n";
        load(noneable).unwrap();
    }

    #[test]
    fn test_all_of_and_one_of_splice() {
        let text = r#"
sections:
  - name: MAT
    type: group
    specs:
      - type: all_of
        specs:
          - {name: ID, type: int, required: true}
      - type: one_of
        specs:
          - type: all_of
            specs:
              - {name: YOUNG, type: double, required: true}
              - {name: NUE, type: double, required: true}
          - type: all_of
            specs:
              - {name: YOUNG, type: double, required: true}
              - {name: LAMBDA, type: double, required: true}
"#;
        let model = load(text).unwrap();
        let names: Vec<&str> = model
            .children(&path("MAT"))
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["ID", "YOUNG", "NUE", "LAMBDA"]);
        assert!(model.is_required(&path("MAT.ID")));
        assert!(!model.is_required(&path("MAT.YOUNG")));
    }

    #[test]
    fn test_vector_and_map() {
        let text = r#"
sections:
  - name: S
    type: group
    specs:
      - {name: VAL, type: vector, value_type: {type: double}, size: 3}
      - {name: PARAMS, type: map, value_type: {type: int}}
"#;
        let model = load(text).unwrap();
        let val = model.lookup(&path("S.VAL")).unwrap();
        assert_eq!(val.kind(), EntryKind::Sequence);
        assert_eq!(val.size(), Some(3));
        assert_eq!(
            model.lookup(&path("S.VAL[1]")).unwrap().kind(),
            EntryKind::Primitive(PrimitiveType::Double)
        );
        let any = model.lookup(&path("S.PARAMS.whatever")).unwrap();
        assert_eq!(any.kind(), EntryKind::Primitive(PrimitiveType::Int));
    }

    #[test]
    fn test_text_sections() {
        let text = r#"
metadata: {version: 2025.1, description_section_name: TITLE}
legacy_string_sections: [NODE COORDS]
sections: []
"#;
        let model = load(text).unwrap();
        assert_eq!(model.version(), Some("2025.1"));
        assert_eq!(model.description_section(), Some("TITLE"));
        assert_eq!(model.section_names(), ["TITLE", "NODE COORDS"]);
        assert!(model.is_legacy_section("NODE COORDS"));
        assert!(!model.is_required(&path("TITLE")));
    }

    const ELEMENTS: &str = r#"
sections: []
legacy_element_specs:
  name: legacy_element_specs
  type: group
  specs:
    - name: SOLID
      type: group
      specs:
        - type: one_of
          specs:
            - name: HEX8
              type: group
              specs:
                - {name: HEX8, type: vector, value_type: {type: int}, size: 8}
                - {name: MAT, type: int}
                - {name: KINEM, type: enum, choices: [linear, nonlinear]}
            - name: TET4
              type: group
              specs:
                - {name: TET4, type: vector, value_type: {type: int}, size: 4}
                - {name: MAT, type: int}
    - name: BEAM3R
      type: group
      specs:
        - name: LINE2
          type: group
          specs:
            - {name: LINE2, type: vector, value_type: {type: int}, size: 2}
            - {name: TRIADS, type: vector, value_type: {type: double}, size: 6}
legacy_particle_specs:
  name: particle
  type: group
  specs:
    - {name: TYPE, type: string}
    - {name: POS, type: vector, value_type: {type: double}, size: 3}
    - type: one_of
      specs:
        - {name: RAD, type: double}
        - {name: MASS, type: double}
"#;

    #[test]
    fn test_legacy_specs() {
        let model = load(ELEMENTS).unwrap();
        let specs = model.legacy_specs();
        assert_eq!(specs.element_types().collect::<Vec<_>>(), ["BEAM3R", "SOLID"]);
        assert_eq!(specs.cell_types("SOLID").collect::<Vec<_>>(), ["HEX8", "TET4"]);

        let hex = specs.cell("SOLID", "HEX8").unwrap();
        assert_eq!(hex.nodes(), 8);
        let names: Vec<&str> = hex.parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, ["MAT", "KINEM"]);
        assert_eq!(hex.parameter("KINEM").unwrap().kind(), EntryKind::Enum);
        assert_eq!(specs.cell("BEAM3R", "LINE2").unwrap().nodes(), 2);
        assert!(specs.cell("SOLID", "LINE2").is_none());

        let particle: Vec<&str> = specs.particle_parameters().iter().map(|p| p.name()).collect();
        assert_eq!(particle, ["TYPE", "POS", "RAD", "MASS"]);
        assert!(load(SOLVER).unwrap().legacy_specs().is_empty());
    }

    #[test]
    fn test_legacy_cell_without_connectivity_fails() {
        let text = r#"
legacy_element_specs:
  type: group
  specs:
    - name: SOLID
      type: group
      specs:
        - name: HEX8
          type: group
          specs:
            - {name: MAT, type: int}
"#;
        let err = load(text).unwrap_err();
        assert!(
            matches!(&err, MetadataFormatError::InvalidLegacySpec { path, .. }
                if path == "legacy_element_specs.SOLID.HEX8"),
            "{err}"
        );
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let err = load("sections: [\n").unwrap_err();
        assert!(matches!(err, MetadataFormatError::Yaml(_)));
    }

    #[test]
    fn test_load_path_missing_file() {
        let err = load_path("/nonexistent/metadata.yaml").unwrap_err();
        assert!(matches!(err, MetadataFormatError::Io { .. }));
    }
}
