//! # Document Validation
//!
//! Walks a document tree against a [`SchemaModel`] and reports every
//! violation in one pass.
//!
//! ## Rules
//!
//! - A key with no schema entry is an [`IssueKind::UnknownField`]; its
//!   value is not inspected further.
//! - A required child absent from its mapping is an
//!   [`IssueKind::MissingRequiredField`].
//! - A value of the wrong shape or scalar type is an
//!   [`IssueKind::TypeMismatch`]. `null` is accepted only where the entry is
//!   noneable.
//! - An enum value outside its allowed set is an [`IssueKind::EnumViolation`].
//! - A key repeated in one mapping is an [`IssueKind::DuplicateKey`]. The
//!   last occurrence is the one validated, matching what lookups return.
//!
//! Issues are ordered by document position, with missing required fields
//! of a mapping reported after its present keys. Validation never mutates
//! its inputs, so repeated runs return identical issue lists.

use std::collections::HashSet;
use std::fmt;

use fourc_core::{closest_match, DocPath};
use fourc_document::{DocumentNode, MappingNode, Scalar, SequenceNode};
use tracing::debug;

use crate::model::{EntryKind, MetadataEntry, SchemaModel};

/// Category of a [`ValidationIssue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    MissingRequiredField,
    UnknownField,
    TypeMismatch,
    EnumViolation,
    DuplicateKey,
}

impl IssueKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::MissingRequiredField => "MissingRequiredField",
            Self::UnknownField => "UnknownField",
            Self::TypeMismatch => "TypeMismatch",
            Self::EnumViolation => "EnumViolation",
            Self::DuplicateKey => "DuplicateKey",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single schema violation at a document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Location of the offending (or missing) node.
    pub path: DocPath,
    /// Category.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.path, self.message)
        }
    }
}

/// Ordered collection of validation issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationIssues {
    issues: Vec<ValidationIssue>,
}

impl ValidationIssues {
    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if the document is valid.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns a slice of all issues.
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.issues.iter()
    }

    /// Issues of one kind, in order.
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Prefix every issue path with `prefix`.
    pub fn nest(mut self, prefix: &DocPath) -> Self {
        for issue in &mut self.issues {
            let mut path = prefix.clone();
            for segment in issue.path.segments() {
                path.push(segment.clone());
            }
            issue.path = path;
        }
        self
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ValidationIssue> {
        self.issues
    }

    fn push(&mut self, path: DocPath, kind: IssueKind, message: String) {
        self.issues.push(ValidationIssue {
            path,
            kind,
            message,
        });
    }
}

impl fmt::Display for ValidationIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ValidationIssues {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

impl From<Vec<ValidationIssue>> for ValidationIssues {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

/// Validate a whole document against the schema root.
pub fn validate(node: &DocumentNode, model: &SchemaModel) -> ValidationIssues {
    let mut issues = ValidationIssues::default();
    check_node(node, model.root(), &DocPath::root(), &mut issues);
    debug!(issues = issues.len(), "validated document");
    issues
}

/// Validate `node` as the value at `path`. Issue paths start at `path`.
/// Returns no issues if the schema has no entry for `path`.
pub fn validate_at(node: &DocumentNode, path: &DocPath, model: &SchemaModel) -> ValidationIssues {
    let mut issues = ValidationIssues::default();
    if let Some(entry) = model.lookup(path) {
        check_node(node, entry, path, &mut issues);
    }
    issues
}

fn check_node(
    node: &DocumentNode,
    entry: &MetadataEntry,
    path: &DocPath,
    issues: &mut ValidationIssues,
) {
    if node.is_null() {
        if !entry.is_noneable() {
            issues.push(path.clone(), IssueKind::TypeMismatch, mismatch(entry, node));
        }
        return;
    }

    match (entry.kind(), node) {
        (EntryKind::Primitive(primitive), DocumentNode::Scalar(scalar)) => {
            if !primitive.accepts(scalar.value()) {
                issues.push(path.clone(), IssueKind::TypeMismatch, mismatch(entry, node));
            }
        }
        (EntryKind::Enum, DocumentNode::Scalar(scalar)) => {
            check_enum(scalar.value(), entry, path, issues);
        }
        (EntryKind::Mapping, DocumentNode::Mapping(mapping)) => {
            check_mapping(mapping, entry, path, issues);
        }
        (EntryKind::Sequence, DocumentNode::Sequence(sequence)) => {
            check_sequence(sequence, entry, path, issues);
        }
        _ => issues.push(path.clone(), IssueKind::TypeMismatch, mismatch(entry, node)),
    }
}

fn check_enum(value: &Scalar, entry: &MetadataEntry, path: &DocPath, issues: &mut ValidationIssues) {
    let text = value.as_text();
    if entry.allowed_values().contains(text.as_ref()) {
        return;
    }
    let choices: Vec<&str> = entry.allowed_values().iter().map(String::as_str).collect();
    let mut message = format!("'{text}' is not one of [{}]", choices.join(", "));
    if let Some(suggestion) = closest_match(&text, choices.iter().copied()) {
        message.push_str(&format!("; did you mean '{suggestion}'?"));
    }
    issues.push(path.clone(), IssueKind::EnumViolation, message);
}

fn check_mapping(
    mapping: &MappingNode,
    entry: &MetadataEntry,
    path: &DocPath,
    issues: &mut ValidationIssues,
) {
    let mut seen = HashSet::new();
    for key in mapping.keys() {
        let child_path = path.child(key);
        if !seen.insert(key) {
            issues.push(
                child_path,
                IssueKind::DuplicateKey,
                format!("key '{key}' appears more than once; the last value is used"),
            );
            continue;
        }

        let Some(child_entry) = entry.child(key) else {
            let mut message = format!("unknown field '{key}'");
            let declared = entry.declared_children().map(MetadataEntry::name);
            if let Some(suggestion) = closest_match(key, declared) {
                message.push_str(&format!("; did you mean '{suggestion}'?"));
            }
            issues.push(child_path, IssueKind::UnknownField, message);
            continue;
        };

        if let Some(value) = mapping.get(key) {
            check_node(value, child_entry, &child_path, issues);
        }
    }

    for child in entry.declared_children() {
        if child.is_required() && !mapping.contains_key(child.name()) {
            issues.push(
                path.child(child.name()),
                IssueKind::MissingRequiredField,
                format!(
                    "missing required field '{}' ({})",
                    child.name(),
                    child.type_description()
                ),
            );
        }
    }
}

fn check_sequence(
    sequence: &SequenceNode,
    entry: &MetadataEntry,
    path: &DocPath,
    issues: &mut ValidationIssues,
) {
    if let Some(size) = entry.size() {
        if sequence.len() != size {
            issues.push(
                path.clone(),
                IssueKind::TypeMismatch,
                format!("expected {size} elements, found {}", sequence.len()),
            );
        }
    }
    let Some(element) = entry.element() else {
        return;
    };
    for (i, item) in sequence.iter().enumerate() {
        check_node(item, element, &path.index(i), issues);
    }
}

fn mismatch(entry: &MetadataEntry, node: &DocumentNode) -> String {
    match node.as_scalar() {
        Some(value) if !value.is_null() => format!(
            "expected {}, found {} {}",
            entry.type_description(),
            value.type_name(),
            value.render()
        ),
        _ => format!(
            "expected {}, found {}",
            entry.type_description(),
            node.type_name()
        ),
    }
}
