//! # Input Files
//!
//! [`InputFile`] is a [`Document`] whose root is a mapping of sections,
//! bound to the [`SchemaModel`] that declares them. Section names are
//! checked on every access, so a misspelled section fails immediately with
//! a suggestion instead of silently reading nothing.
//!
//! ## Includes
//!
//! An input may list further files in its `INCLUDES` section. Paths are
//! relative to the directory of the including file. [`InputFile::load_includes`]
//! merges them in, and [`InputFile::dump_with_includes`] does the reverse.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fourc_core::{closest_match, compare_values, DocPath, PathSegment, Tolerance};
use fourc_document::{Document, DocumentError, DocumentNode};
use fourc_schema::{validate, SchemaModel, ValidationIssues};
use serde_json::Value;
use tracing::{debug, warn};

use crate::editor::Editor;
use crate::error::{AccessError, InputError};
use crate::legacy::{LegacyKind, LegacySection};

/// Section listing the files an input includes.
pub const INCLUDES_SECTION: &str = "INCLUDES";

/// Options for writing an input file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpOptions {
    /// Write sections in alphabetical order.
    pub sort_sections: bool,
    /// Refuse to write an input with validation issues.
    pub validate: bool,
}

/// A 4C input file: sections of a document, checked against a schema.
#[derive(Debug, Clone)]
pub struct InputFile {
    document: Document,
    model: Arc<SchemaModel>,
    source: Option<PathBuf>,
}

impl InputFile {
    /// An input with no sections.
    pub fn new(model: Arc<SchemaModel>) -> Self {
        Self {
            document: Document::default(),
            model,
            source: None,
        }
    }

    /// Wrap a parsed document.
    ///
    /// # Errors
    ///
    /// [`InputError::NotSections`] if the root is not a mapping,
    /// [`InputError::UnknownSection`] for the first undeclared section.
    pub fn from_document(document: Document, model: Arc<SchemaModel>) -> Result<Self, InputError> {
        let Some(sections) = document.root().as_mapping() else {
            return Err(InputError::NotSections {
                found: document.root().type_name(),
            });
        };
        for name in sections.keys() {
            check_known(&model, name)?;
        }
        Ok(Self {
            document,
            model,
            source: None,
        })
    }

    /// Parse input text.
    ///
    /// # Errors
    ///
    /// [`InputError::Syntax`] for malformed text, otherwise as
    /// [`from_document`](Self::from_document).
    pub fn parse(text: &str, model: Arc<SchemaModel>) -> Result<Self, InputError> {
        Self::from_document(Document::parse(text)?, model)
    }

    /// Read an input file. Includes are not followed; see
    /// [`load_includes`](Self::load_includes).
    ///
    /// # Errors
    ///
    /// [`InputError::Document`] if the file cannot be read or parsed,
    /// otherwise as [`from_document`](Self::from_document).
    pub fn read(path: impl AsRef<Path>, model: Arc<SchemaModel>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let mut input = Self::from_document(Document::read(path)?, model)?;
        input.source = Some(path.to_path_buf());
        debug!(path = %path.display(), sections = input.len(), "loaded input file");
        Ok(input)
    }

    /// Read only the header of an input file: everything except the
    /// legacy string sections, which hold the mesh and dominate file size.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read).
    pub fn read_header(path: impl AsRef<Path>, model: Arc<SchemaModel>) -> Result<Self, InputError> {
        Ok(Self::read(path, model)?.extract_header())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn model(&self) -> &Arc<SchemaModel> {
        &self.model
    }

    /// The file this input was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Number of section entries, repeated keys included.
    pub fn len(&self) -> usize {
        self.document.root().as_mapping().map_or(0, |m| m.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the sections present, sorted and without repeats.
    pub fn section_names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .document
            .root()
            .as_mapping()
            .map(|m| m.keys().collect())
            .unwrap_or_default();
        names.into_iter().collect()
    }

    /// True if the section is present.
    pub fn contains(&self, name: &str) -> bool {
        self.document
            .root()
            .as_mapping()
            .is_some_and(|m| m.contains_key(name))
    }

    /// A section by name.
    ///
    /// # Errors
    ///
    /// [`InputError::UnknownSection`] if the schema does not declare it,
    /// [`InputError::SectionNotSet`] if this input does not contain it.
    pub fn section(&self, name: &str) -> Result<&DocumentNode, InputError> {
        check_known(&self.model, name)?;
        self.document
            .root()
            .as_mapping()
            .and_then(|m| m.get(name))
            .ok_or_else(|| self.not_set(name))
    }

    /// Set a whole section, returning the one it replaced. A replaced
    /// section keeps its position in the file.
    ///
    /// # Errors
    ///
    /// [`InputError::UnknownSection`] if the schema does not declare it.
    pub fn set_section(
        &mut self,
        name: &str,
        value: DocumentNode,
    ) -> Result<Option<DocumentNode>, InputError> {
        check_known(&self.model, name)?;
        let previous = self.document.set(&DocPath::root().child(name), value)?;
        if previous.is_some() {
            warn!(section = name, "section was overwritten");
        }
        Ok(previous)
    }

    /// Interpreted content of a legacy section.
    ///
    /// # Errors
    ///
    /// As [`section`](Self::section), plus [`InputError::NotLegacy`] for a
    /// section without a line format, [`InputError::Access`] if the section
    /// is not a list of lines, and [`InputError::Legacy`] for the first line
    /// that cannot be read.
    pub fn legacy_section(&self, name: &str) -> Result<LegacySection, InputError> {
        let kind = self.legacy_kind(name)?;
        let lines = legacy_lines(name, self.section(name)?)?;
        let section = LegacySection::read(kind, name, &lines, self.model.legacy_specs())?;
        debug!(section = name, %kind, lines = lines.len(), "interpreted legacy section");
        Ok(section)
    }

    /// Write interpreted data to a legacy section as lines, returning the
    /// section it replaced.
    ///
    /// # Errors
    ///
    /// [`InputError::UnknownSection`], [`InputError::NotLegacy`], or
    /// [`InputError::LegacyMismatch`] if `section` holds another format.
    pub fn set_legacy_section(
        &mut self,
        name: &str,
        section: &LegacySection,
    ) -> Result<Option<DocumentNode>, InputError> {
        let expected = self.legacy_kind(name)?;
        if section.kind() != expected {
            return Err(InputError::LegacyMismatch {
                name: name.to_string(),
                expected,
                found: section.kind(),
            });
        }
        let lines = Value::from(section.to_lines());
        self.set_section(name, DocumentNode::from_json(&lines))
    }

    /// Remove a section and return it.
    ///
    /// # Errors
    ///
    /// As [`section`](Self::section).
    pub fn pop_section(&mut self, name: &str) -> Result<DocumentNode, InputError> {
        check_known(&self.model, name)?;
        match self.document.remove(&DocPath::root().child(name))? {
            Some(node) => Ok(node),
            None => Err(self.not_set(name)),
        }
    }

    /// Remove a section and return it, or `default` if it is not set.
    ///
    /// # Errors
    ///
    /// [`InputError::UnknownSection`] if the schema does not declare it.
    pub fn pop_section_or(
        &mut self,
        name: &str,
        default: DocumentNode,
    ) -> Result<DocumentNode, InputError> {
        check_known(&self.model, name)?;
        Ok(self
            .document
            .remove(&DocPath::root().child(name))?
            .unwrap_or(default))
    }

    /// Typed read through an [`Editor`]; absent values fall back to their
    /// schema default.
    ///
    /// # Errors
    ///
    /// As [`Editor::get`], plus [`InputError::UnknownSection`].
    pub fn get(&self, path: &DocPath) -> Result<Option<Value>, InputError> {
        self.check_path(path)?;
        Ok(Editor::new(&self.model).get(self.document.root(), path)?)
    }

    /// Typed write through an [`Editor`].
    ///
    /// # Errors
    ///
    /// As [`Editor::set`], plus [`InputError::UnknownSection`] and
    /// [`InputError::RootReplace`] for the root path.
    pub fn set(&mut self, path: &DocPath, value: Value) -> Result<Option<DocumentNode>, InputError> {
        self.check_edit_path(path)?;
        Ok(Editor::new(&self.model).set(self.document.root_mut(), path, value)?)
    }

    /// Remove the value at `path`.
    ///
    /// # Errors
    ///
    /// As [`set`](Self::set).
    pub fn remove(&mut self, path: &DocPath) -> Result<Option<DocumentNode>, InputError> {
        self.check_edit_path(path)?;
        Ok(Editor::new(&self.model).remove(self.document.root_mut(), path)?)
    }

    /// Add every section of `other`, in its order.
    ///
    /// # Errors
    ///
    /// [`InputError::Overlap`] if any section is set in both inputs; nothing
    /// is added in that case.
    pub fn join(&mut self, other: &InputFile) -> Result<(), InputError> {
        let overlap: Vec<String> = other
            .section_names()
            .into_iter()
            .filter(|name| self.contains(name))
            .map(str::to_string)
            .collect();
        if !overlap.is_empty() {
            return Err(InputError::Overlap { sections: overlap });
        }
        if let Some(sections) = other.document.root().as_mapping() {
            for (name, node) in sections.iter() {
                self.set_section(name, node.clone())?;
            }
        }
        Ok(())
    }

    /// Move the named sections into a new input. Returns the remainder and
    /// the split-off part.
    ///
    /// # Errors
    ///
    /// As [`pop_section`](Self::pop_section) for each name.
    pub fn split(&self, names: &[&str]) -> Result<(InputFile, InputFile), InputError> {
        let mut rest = self.clone();
        let mut part = InputFile::new(Arc::clone(&self.model));
        for name in names {
            let node = rest.pop_section(name)?;
            part.set_section(name, node)?;
        }
        Ok((rest, part))
    }

    /// Replace the `INCLUDES` section by the sections of the files it
    /// lists. Included files are read as they are; their own includes are
    /// not followed.
    ///
    /// # Errors
    ///
    /// [`InputError::InvalidIncludes`] for a malformed `INCLUDES` section,
    /// otherwise as [`read`](Self::read) and [`join`](Self::join).
    pub fn load_includes(&mut self) -> Result<(), InputError> {
        if !self.contains(INCLUDES_SECTION) {
            return Ok(());
        }
        let includes = include_paths(&self.pop_section(INCLUDES_SECTION)?)?;
        let base = self
            .source
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        for include in includes {
            let path = base.join(&include);
            debug!(path = %path.display(), "gather data from include");
            let other = InputFile::read(&path, Arc::clone(&self.model))?;
            self.join(&other)?;
        }
        Ok(())
    }

    /// A copy without the legacy string sections.
    pub fn extract_header(&self) -> InputFile {
        let mut header = self.clone();
        if let Some(sections) = header.document.root_mut().as_mapping_mut() {
            for legacy in self.model.legacy_sections() {
                sections.remove(legacy);
            }
        }
        header
    }

    /// All validation issues of this input.
    pub fn validate(&self) -> ValidationIssues {
        validate(self.document.root(), &self.model)
    }

    /// Compare with a reference input within `tolerance`.
    ///
    /// # Errors
    ///
    /// [`InputError::Mismatch`] at the first difference, or
    /// [`InputError::Document`] if either input has no JSON view.
    pub fn compare(&self, reference: &InputFile, tolerance: &Tolerance) -> Result<(), InputError> {
        let value = self.document.to_json()?;
        let reference = reference.document.to_json()?;
        compare_values(&value, &reference, tolerance)?;
        Ok(())
    }

    /// The text of this input, optionally with sections sorted.
    pub fn serialize(&self, sort_sections: bool) -> String {
        if !sort_sections {
            return self.document.serialize();
        }
        let mut document = self.document.clone();
        if let Some(sections) = document.root_mut().as_mapping_mut() {
            sections.sort_keys();
        }
        document.serialize()
    }

    /// Write this input to `path`.
    ///
    /// # Errors
    ///
    /// [`InputError::Invalid`] if validation was requested and failed,
    /// [`InputError::Document`] if the file cannot be written.
    pub fn dump(&self, path: impl AsRef<Path>, options: DumpOptions) -> Result<(), InputError> {
        let path = path.as_ref();
        if options.validate {
            let issues = self.validate();
            if !issues.is_empty() {
                return Err(InputError::Invalid { issues });
            }
        }
        std::fs::write(path, self.serialize(options.sort_sections)).map_err(|source| {
            DocumentError::Io {
                path: path.display().to_string(),
                source,
            }
        })?;
        debug!(path = %path.display(), "wrote input file");
        Ok(())
    }

    /// Write this input as two files: the named sections go to
    /// `split_path`, everything else to `root_path`, whose `INCLUDES`
    /// section gains a reference to the split file. With `invert`, the
    /// named sections stay in the root file instead.
    ///
    /// # Errors
    ///
    /// As [`split`](Self::split) and [`dump`](Self::dump).
    pub fn dump_with_includes(
        &self,
        sections: &[&str],
        root_path: impl AsRef<Path>,
        split_path: impl AsRef<Path>,
        invert: bool,
        options: DumpOptions,
    ) -> Result<(), InputError> {
        let root_path = root_path.as_ref();
        let split_path = split_path.as_ref();

        let (rest, part) = self.split(sections)?;
        let (mut root, split) = if invert { (part, rest) } else { (rest, part) };

        let mut includes = if root.contains(INCLUDES_SECTION) {
            include_paths(&root.pop_section(INCLUDES_SECTION)?)?
        } else {
            Vec::new()
        };
        includes.push(include_reference(root_path, split_path));
        root.set_section(INCLUDES_SECTION, DocumentNode::from_json(&Value::from(includes)))?;

        root.dump(root_path, options)?;
        split.dump(split_path, options)?;
        Ok(())
    }

    fn check_path(&self, path: &DocPath) -> Result<(), InputError> {
        match path.segments().first().and_then(PathSegment::as_key) {
            Some(name) => check_known(&self.model, name),
            None => Ok(()),
        }
    }

    fn check_edit_path(&self, path: &DocPath) -> Result<(), InputError> {
        if path.is_root() {
            return Err(InputError::RootReplace);
        }
        self.check_path(path)
    }

    fn legacy_kind(&self, name: &str) -> Result<LegacyKind, InputError> {
        check_known(&self.model, name)?;
        LegacyKind::of(name)
            .filter(|_| self.model.is_legacy_section(name))
            .ok_or_else(|| InputError::NotLegacy {
                name: name.to_string(),
            })
    }

    fn not_set(&self, name: &str) -> InputError {
        InputError::SectionNotSet {
            name: name.to_string(),
            suggestion: closest_match(name, self.section_names()).map(str::to_string),
        }
    }
}

impl fmt::Display for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document.serialize())
    }
}

impl PartialEq for InputFile {
    /// Same sections with the same content, ignoring formatting.
    fn eq(&self, other: &Self) -> bool {
        self.document.content_eq(&other.document)
    }
}

fn check_known(model: &SchemaModel, name: &str) -> Result<(), InputError> {
    if model.is_known_section(name) {
        return Ok(());
    }
    Err(InputError::UnknownSection {
        name: name.to_string(),
        suggestion: closest_match(name, model.section_names()).map(str::to_string),
    })
}

/// The text lines of a legacy section. Numbers stand for themselves and
/// nulls for blank lines.
fn legacy_lines(name: &str, node: &DocumentNode) -> Result<Vec<String>, InputError> {
    let mismatch = |reason: String| {
        InputError::Access(AccessError::TypeMismatch {
            path: name.to_string(),
            reason,
        })
    };
    let items = match node.to_json()? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => return Err(mismatch(format!("expected a list of lines, found {other}"))),
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(line) => Ok(line),
            Value::Number(n) => Ok(n.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(mismatch(format!("expected a line of text, found {other}"))),
        })
        .collect()
}

fn include_paths(node: &DocumentNode) -> Result<Vec<String>, InputError> {
    if node.is_null() {
        return Ok(Vec::new());
    }
    let Some(items) = node.as_sequence() else {
        return Err(InputError::InvalidIncludes {
            reason: format!("expected a list of paths, found {}", node.type_name()),
        });
    };
    items
        .iter()
        .map(|item| match item.as_scalar() {
            Some(scalar) if scalar.type_name() == "string" => Ok(scalar.as_text().into_owned()),
            _ => Err(InputError::InvalidIncludes {
                reason: format!("expected a path, found {}", item.type_name()),
            }),
        })
        .collect()
}

/// How `root_path` refers to `split_path`: relative to its own directory
/// when the split file lives below it.
fn include_reference(root_path: &Path, split_path: &Path) -> String {
    let reference = root_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .and_then(|dir| split_path.strip_prefix(dir).ok())
        .unwrap_or(split_path);
    reference.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_reference() {
        assert_eq!(
            include_reference(Path::new("out/main.4C.yaml"), Path::new("out/mesh.4C.yaml")),
            "mesh.4C.yaml"
        );
        assert_eq!(
            include_reference(Path::new("main.4C.yaml"), Path::new("mesh/part.4C.yaml")),
            "mesh/part.4C.yaml"
        );
        assert_eq!(
            include_reference(Path::new("out/main.4C.yaml"), Path::new("other/mesh.4C.yaml")),
            "other/mesh.4C.yaml"
        );
    }

    #[test]
    fn test_include_paths() {
        let doc = Document::parse("INCLUDES:\n  - a.yaml\n  - \"b c.yaml\"\n").unwrap();
        let node = doc.root().as_mapping().unwrap().get("INCLUDES").unwrap();
        assert_eq!(include_paths(node).unwrap(), ["a.yaml", "b c.yaml"]);

        assert!(include_paths(&DocumentNode::null()).unwrap().is_empty());

        let doc = Document::parse("INCLUDES: [1]\n").unwrap();
        let node = doc.root().as_mapping().unwrap().get("INCLUDES").unwrap();
        assert!(matches!(
            include_paths(node),
            Err(InputError::InvalidIncludes { .. })
        ));
    }
}
