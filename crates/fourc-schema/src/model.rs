//! # Schema Model
//!
//! The normalized, queryable shape of a valid 4C input file. Built once by
//! the metadata loader and immutable afterwards.
//!
//! ## Paths
//!
//! Every entry is indexed under its schema key: mapping children join with
//! `.`, and the element entry of a sequence is written `parent[]`, so
//! `FUNCT1[0].COMPONENT` and `FUNCT1[3].COMPONENT` share the key
//! `FUNCT1[].COMPONENT`. Keys that are not in the index (wildcard matches)
//! are resolved by walking the tree one segment at a time.
//!
//! ## Patterns
//!
//! A child named `*` matches any key. A child whose name ends in `*`
//! (`FUNCT*`) matches any key starting with the text before the star.
//! Exact names win over prefixes, and prefixes over `*`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use fourc_core::{DocPath, PathSegment};
use fourc_document::Scalar;
use serde_json::Value;

use crate::legacy::LegacySpecs;

/// Name of the child entry that matches any key.
pub const WILDCARD: &str = "*";

/// Scalar types a primitive entry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Floating-point number; integers are accepted.
    Double,
    /// Integer.
    Int,
    /// Boolean.
    Bool,
    /// Free text.
    String,
    /// File system path, stored as text.
    Path,
}

impl PrimitiveType {
    /// Parse a metadata type name. Accepts the aliases 4C metadata uses.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "double" | "float" => Some(Self::Double),
            "int" | "integer" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            "string" => Some(Self::String),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    /// Canonical type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Path => "path",
        }
    }

    /// True if a document scalar has this type.
    pub fn accepts(self, value: &Scalar) -> bool {
        match (self, value) {
            (Self::Double, Scalar::Float(_) | Scalar::Integer(_)) => true,
            (Self::Int, Scalar::Integer(_)) => true,
            (Self::Bool, Scalar::Bool(_)) => true,
            (Self::String | Self::Path, Scalar::String(_)) => true,
            _ => false,
        }
    }

    /// True if a JSON value has this type.
    pub fn accepts_json(self, value: &Value) -> bool {
        match self {
            Self::Double => value.is_number(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Bool => value.is_boolean(),
            Self::String | Self::Path => value.is_string(),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Variant of a [`MetadataEntry`].
///
/// References exist only in raw metadata; the loader resolves them before a
/// model is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A scalar of the given type.
    Primitive(PrimitiveType),
    /// A string restricted to [`MetadataEntry::allowed_values`].
    Enum,
    /// A mapping whose keys are the entry's children.
    Mapping,
    /// A sequence whose elements all follow [`MetadataEntry::element`].
    Sequence,
}

impl EntryKind {
    /// Name used in messages: `double`, `enum`, `mapping`, `sequence`, ...
    pub fn name(self) -> &'static str {
        match self {
            Self::Primitive(p) => p.name(),
            Self::Enum => "enum",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
        }
    }
}

/// One node of the schema tree.
#[derive(Debug, Clone)]
pub struct MetadataEntry {
    pub(crate) name: String,
    pub(crate) kind: EntryKind,
    pub(crate) required: bool,
    pub(crate) noneable: bool,
    pub(crate) default: Option<Value>,
    pub(crate) description: Option<String>,
    pub(crate) children: Vec<Arc<MetadataEntry>>,
    pub(crate) allowed_values: BTreeSet<String>,
    pub(crate) size: Option<usize>,
    pub(crate) resolved_from: Option<String>,
}

impl MetadataEntry {
    pub(crate) fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            noneable: false,
            default: None,
            description: None,
            children: Vec::new(),
            allowed_values: BTreeSet::new(),
            size: None,
            resolved_from: None,
        }
    }

    /// Entry name; the key it matches in its parent mapping.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// True if the key must be present in its parent mapping.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// True if `null` is a valid value.
    pub fn is_noneable(&self) -> bool {
        self.noneable
    }

    /// Value assumed when the key is absent.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Children in declaration order. For a sequence, the single element
    /// entry.
    pub fn children(&self) -> &[Arc<MetadataEntry>] {
        &self.children
    }

    /// Allowed values of an enum entry.
    pub fn allowed_values(&self) -> &BTreeSet<String> {
        &self.allowed_values
    }

    /// Fixed element count of a vector.
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    /// Name of the definition this entry was resolved from, if it came
    /// from a reference.
    pub fn resolved_from(&self) -> Option<&str> {
        self.resolved_from.as_deref()
    }

    /// True for `*` and `PREFIX*` entries.
    pub fn is_pattern(&self) -> bool {
        self.name.ends_with('*')
    }

    /// The element entry of a sequence.
    pub fn element(&self) -> Option<&MetadataEntry> {
        match self.kind {
            EntryKind::Sequence => self.children.first().map(Arc::as_ref),
            _ => None,
        }
    }

    /// The child entry that governs `key` in a mapping, if any.
    pub fn child(&self, key: &str) -> Option<&MetadataEntry> {
        if self.kind != EntryKind::Mapping {
            return None;
        }
        let exact = self.children.iter().find(|c| c.name == key);
        let prefix = || {
            self.children.iter().find(|c| {
                c.name.len() > 1
                    && c.is_pattern()
                    && key.starts_with(&c.name[..c.name.len() - 1])
            })
        };
        let wildcard = || self.children.iter().find(|c| c.name == WILDCARD);
        exact.or_else(prefix).or_else(wildcard).map(Arc::as_ref)
    }

    /// Children with literal names, in declaration order.
    pub fn declared_children(&self) -> impl Iterator<Item = &MetadataEntry> {
        self.children
            .iter()
            .filter(|c| !c.is_pattern())
            .map(Arc::as_ref)
    }

    /// Human-readable type: `double`, `int or null`, `sequence of 3 double`.
    pub fn type_description(&self) -> String {
        let mut text = match (self.kind, self.element(), self.size) {
            (EntryKind::Sequence, Some(element), Some(size)) => {
                format!("sequence of {size} {}", element.kind.name())
            }
            (EntryKind::Enum, _, _) => {
                let values: Vec<&str> = self.allowed_values.iter().map(String::as_str).collect();
                format!("one of [{}]", values.join(", "))
            }
            (kind, _, _) => kind.name().to_string(),
        };
        if self.noneable {
            text.push_str(" or null");
        }
        text
    }
}

/// Queryable schema for 4C input files.
///
/// `Send + Sync`: entries are shared through [`Arc`] and never mutated after
/// construction, so one model can serve any number of validation runs.
#[derive(Debug, Clone)]
pub struct SchemaModel {
    root: Arc<MetadataEntry>,
    index: HashMap<String, Arc<MetadataEntry>>,
    legacy_sections: Vec<String>,
    description_section: Option<String>,
    version: Option<String>,
    legacy_specs: LegacySpecs,
}

impl SchemaModel {
    pub(crate) fn new(
        root: MetadataEntry,
        legacy_sections: Vec<String>,
        description_section: Option<String>,
        version: Option<String>,
    ) -> Self {
        let root = Arc::new(root);
        let mut index = HashMap::new();
        index_children("", &root, &mut index);
        Self {
            root,
            index,
            legacy_sections,
            description_section,
            version,
            legacy_specs: LegacySpecs::default(),
        }
    }

    pub(crate) fn with_legacy_specs(mut self, legacy_specs: LegacySpecs) -> Self {
        self.legacy_specs = legacy_specs;
        self
    }

    /// The entry governing `path`, or `None` if the schema does not allow
    /// it. The root path returns the root entry.
    pub fn lookup(&self, path: &DocPath) -> Option<&MetadataEntry> {
        if path.is_root() {
            return Some(self.root.as_ref());
        }
        if let Some(entry) = self.index.get(&path.schema_key()) {
            return Some(entry.as_ref());
        }
        let mut entry: &MetadataEntry = &self.root;
        for segment in path.segments() {
            entry = match segment {
                PathSegment::Key(key) => entry.child(key)?,
                PathSegment::Index(_) => entry.element()?,
            };
        }
        Some(entry)
    }

    /// True if the entry at `path` exists and is required.
    pub fn is_required(&self, path: &DocPath) -> bool {
        self.lookup(path).is_some_and(MetadataEntry::is_required)
    }

    /// Children of the entry at `path`; empty if there is no such entry.
    pub fn children(&self, path: &DocPath) -> &[Arc<MetadataEntry>] {
        match self.lookup(path) {
            Some(entry) => entry.children(),
            None => &[],
        }
    }

    /// The root entry; its children are the sections.
    pub fn root(&self) -> &MetadataEntry {
        &self.root
    }

    /// Number of indexed schema paths.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All indexed schema paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.index.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Section names in declaration order.
    pub fn section_names(&self) -> Vec<&str> {
        self.root.children.iter().map(|c| c.name.as_str()).collect()
    }

    /// True if `name` is a section, directly or through a pattern.
    pub fn is_known_section(&self, name: &str) -> bool {
        self.root.child(name).is_some()
    }

    /// Sections whose content is a sequence of legacy text lines.
    pub fn legacy_sections(&self) -> &[String] {
        &self.legacy_sections
    }

    pub fn is_legacy_section(&self, name: &str) -> bool {
        self.legacy_sections.iter().any(|s| s == name)
    }

    /// Element and particle line layouts.
    pub fn legacy_specs(&self) -> &LegacySpecs {
        &self.legacy_specs
    }

    /// Name of the free-text description section (`TITLE`).
    pub fn description_section(&self) -> Option<&str> {
        self.description_section.as_deref()
    }

    /// Version string of the metadata artifact.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

fn index_children(
    prefix: &str,
    entry: &Arc<MetadataEntry>,
    index: &mut HashMap<String, Arc<MetadataEntry>>,
) {
    match entry.kind {
        EntryKind::Mapping => {
            for child in &entry.children {
                let key = if prefix.is_empty() {
                    child.name.clone()
                } else {
                    format!("{prefix}.{}", child.name)
                };
                index.insert(key.clone(), Arc::clone(child));
                index_children(&key, child, index);
            }
        }
        EntryKind::Sequence => {
            if let Some(element) = entry.children.first() {
                let key = format!("{prefix}[]");
                index.insert(key.clone(), Arc::clone(element));
                index_children(&key, element, index);
            }
        }
        EntryKind::Primitive(_) | EntryKind::Enum => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(name: &str, ty: PrimitiveType, required: bool) -> Arc<MetadataEntry> {
        let mut entry = MetadataEntry::new(name, EntryKind::Primitive(ty));
        entry.required = required;
        Arc::new(entry)
    }

    fn model() -> SchemaModel {
        let mut solver = MetadataEntry::new("Solver", EntryKind::Mapping);
        solver.children = vec![
            primitive("tolerance", PrimitiveType::Double, true),
            primitive("name", PrimitiveType::String, false),
        ];

        let mut funct = MetadataEntry::new("FUNCT*", EntryKind::Sequence);
        let mut component = MetadataEntry::new("", EntryKind::Mapping);
        component.children = vec![primitive("COMPONENT", PrimitiveType::Int, false)];
        funct.children = vec![Arc::new(component)];

        let mut params = MetadataEntry::new("PARAMS", EntryKind::Mapping);
        params.children = vec![primitive(WILDCARD, PrimitiveType::Double, false)];

        let mut root = MetadataEntry::new("", EntryKind::Mapping);
        root.children = vec![Arc::new(solver), Arc::new(funct), Arc::new(params)];
        SchemaModel::new(root, vec!["NODE COORDS".into()], None, Some("1.0".into()))
    }

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    #[test]
    fn test_exact_lookup() {
        let model = model();
        let entry = model.lookup(&path("Solver.tolerance")).unwrap();
        assert_eq!(entry.kind(), EntryKind::Primitive(PrimitiveType::Double));
        assert!(model.is_required(&path("Solver.tolerance")));
        assert!(!model.is_required(&path("Solver.name")));
        assert!(model.lookup(&path("Solver.missing")).is_none());
    }

    #[test]
    fn test_prefix_pattern_lookup() {
        let model = model();
        let entry = model.lookup(&path("FUNCT12[0].COMPONENT")).unwrap();
        assert_eq!(entry.name(), "COMPONENT");
        assert!(model.is_known_section("FUNCT1"));
        assert!(!model.is_known_section("FUNC"));
    }

    #[test]
    fn test_wildcard_lookup() {
        let model = model();
        let entry = model.lookup(&path("PARAMS.anything")).unwrap();
        assert_eq!(entry.name(), WILDCARD);
    }

    #[test]
    fn test_sequence_paths_indexed_with_brackets() {
        let model = model();
        assert!(model.paths().contains(&"FUNCT*[].COMPONENT"));
        assert_eq!(model.children(&path("Solver")).len(), 2);
        assert!(model.children(&path("nowhere")).is_empty());
    }

    #[test]
    fn test_section_queries() {
        let model = model();
        assert_eq!(model.section_names(), ["Solver", "FUNCT*", "PARAMS"]);
        assert!(model.is_legacy_section("NODE COORDS"));
        assert_eq!(model.version(), Some("1.0"));
        assert!(model.lookup(&DocPath::root()).is_some());
    }

    #[test]
    fn test_model_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SchemaModel>();
    }

    #[test]
    fn test_primitive_acceptance() {
        assert!(PrimitiveType::Double.accepts(&Scalar::Integer(1)));
        assert!(!PrimitiveType::Int.accepts(&Scalar::Float(1.0)));
        assert!(PrimitiveType::Path.accepts(&Scalar::String("a.yaml".into())));
        assert!(!PrimitiveType::Bool.accepts(&Scalar::String("true".into())));
    }
}
