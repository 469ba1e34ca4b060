//! # Document Nodes
//!
//! The tree is a tagged union of scalars, ordered mappings, and sequences.
//! Mappings are a `Vec` of entries, not a map: key order is significant in
//! 4C input files and duplicate keys must survive until validation.
//!
//! Every node remembers how it was written. Scalars keep their source token,
//! collections keep their block indentation or their flow text, and each
//! entry keeps the comment and blank lines above it plus the whitespace and
//! comment around its value. Generated nodes carry no formatting and are
//! rendered in a default style.
//!
//! Mutating a node through this API clears the cached text of every flow
//! collection on the way, so edited flow collections are re-rendered while
//! untouched ones are reproduced verbatim. Operations that fail or find
//! nothing leave the tree and its cached text as they were.

use fourc_core::{DocPath, PathError, PathSegment};
use serde_json::{Map, Number, Value};

use crate::error::DocumentError;
use crate::scalar::Scalar;

/// Source text of a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarRepr {
    /// A single-line token (plain or quoted). An empty token is the empty
    /// null of `key:`.
    Inline(String),
    /// A literal (`|`) or folded (`>`) block scalar.
    Block {
        /// Header line text from the indicator on, comment included.
        header: String,
        /// Body lines exactly as written.
        body: Vec<String>,
    },
}

/// A scalar node.
#[derive(Debug, Clone)]
pub struct ScalarNode {
    value: Scalar,
    repr: Option<ScalarRepr>,
}

impl ScalarNode {
    /// A generated scalar.
    pub fn new(value: impl Into<Scalar>) -> Self {
        Self {
            value: value.into(),
            repr: None,
        }
    }

    pub(crate) fn parsed(value: Scalar, repr: ScalarRepr) -> Self {
        Self {
            value,
            repr: Some(repr),
        }
    }

    /// The resolved value.
    pub fn value(&self) -> &Scalar {
        &self.value
    }

    /// The source text, if the node was parsed and not edited since.
    pub fn repr(&self) -> Option<&ScalarRepr> {
        self.repr.as_ref()
    }

    /// Replace the value. The source text is dropped.
    pub fn set_value(&mut self, value: impl Into<Scalar>) {
        self.value = value.into();
        self.repr = None;
    }
}

/// Layout of a mapping or sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionStyle {
    /// Indentation-based layout. `None` means generated: the emitter picks
    /// the indentation from the parent.
    Block {
        /// Column of the entries.
        indent: Option<usize>,
    },
    /// `[...]` or `{...}` layout. `None` means the text must be rendered.
    Flow {
        /// Source text from the opening to the closing bracket.
        repr: Option<String>,
    },
}

impl CollectionStyle {
    /// True for flow layout.
    pub fn is_flow(&self) -> bool {
        matches!(self, CollectionStyle::Flow { .. })
    }

    fn touch(&mut self) {
        if let CollectionStyle::Flow { repr } = self {
            *repr = None;
        }
    }
}

/// Formatting around one mapping entry or sequence item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decor {
    pub(crate) prefix: Vec<String>,
    pub(crate) key_ws: String,
    pub(crate) value_ws: String,
    pub(crate) suffix: String,
}

impl Decor {
    /// Comment and blank lines written above the entry.
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Text after the value on its line, usually whitespace and a comment.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Key {
    pub(crate) name: String,
    pub(crate) repr: Option<String>,
}

impl Key {
    fn generated(name: String) -> Self {
        Self { name, repr: None }
    }
}

/// One `key: value` pair of a mapping.
#[derive(Debug, Clone)]
pub struct MapEntry {
    pub(crate) key: Key,
    pub(crate) value: DocumentNode,
    pub(crate) decor: Decor,
}

impl MapEntry {
    fn generated(key: String, value: DocumentNode) -> Self {
        Self {
            key: Key::generated(key),
            value,
            decor: Decor::default(),
        }
    }

    /// The key.
    pub fn key(&self) -> &str {
        &self.key.name
    }

    /// The value.
    pub fn value(&self) -> &DocumentNode {
        &self.value
    }

    /// Formatting around the entry.
    pub fn decor(&self) -> &Decor {
        &self.decor
    }
}

/// One `- value` item of a sequence.
#[derive(Debug, Clone)]
pub struct SeqItem {
    pub(crate) value: DocumentNode,
    pub(crate) decor: Decor,
    /// The item's block collection starts on the `-` line.
    pub(crate) compact: bool,
}

impl SeqItem {
    fn generated(value: DocumentNode) -> Self {
        Self {
            value,
            decor: Decor::default(),
            compact: false,
        }
    }

    /// The value.
    pub fn value(&self) -> &DocumentNode {
        &self.value
    }

    /// Formatting around the item.
    pub fn decor(&self) -> &Decor {
        &self.decor
    }
}

/// An ordered mapping. Duplicate keys are kept; lookups see the last one.
#[derive(Debug, Clone)]
pub struct MappingNode {
    pub(crate) entries: Vec<MapEntry>,
    pub(crate) style: CollectionStyle,
}

impl Default for MappingNode {
    fn default() -> Self {
        Self::new()
    }
}

impl MappingNode {
    /// An empty generated block mapping.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            style: CollectionStyle::Block { indent: None },
        }
    }

    /// An empty generated flow mapping.
    pub fn flow() -> Self {
        Self {
            entries: Vec::new(),
            style: CollectionStyle::Flow { repr: None },
        }
    }

    pub(crate) fn with_style(entries: Vec<MapEntry>, style: CollectionStyle) -> Self {
        Self { entries, style }
    }

    /// Layout of the mapping.
    pub fn style(&self) -> &CollectionStyle {
        &self.style
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in document order.
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// `(key, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentNode)> {
        self.entries.iter().map(|e| (e.key.name.as_str(), &e.value))
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.name.as_str())
    }

    /// True if `key` occurs at least once.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key.name == key)
    }

    /// Value of the last occurrence of `key`.
    pub fn get(&self, key: &str) -> Option<&DocumentNode> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key.name == key)
            .map(|e| &e.value)
    }

    /// Mutable value of the last occurrence of `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut DocumentNode> {
        let index = self.entries.iter().rposition(|e| e.key.name == key)?;
        self.style.touch();
        Some(&mut self.entries[index].value)
    }

    /// Overwrite the last occurrence of `key` in place, keeping its position
    /// and comments, or append a new entry. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: DocumentNode) -> Option<DocumentNode> {
        let key = key.into();
        self.style.touch();
        match self.entries.iter_mut().rev().find(|e| e.key.name == key) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.push(MapEntry::generated(key, value));
                None
            }
        }
    }

    /// Remove every occurrence of `key`. Returns the value of the last one.
    pub fn remove(&mut self, key: &str) -> Option<DocumentNode> {
        if !self.contains_key(key) {
            return None;
        }
        self.style.touch();
        let mut removed = None;
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].key.name == key {
                removed = Some(self.entries.remove(i).value);
            } else {
                i += 1;
            }
        }
        removed
    }

    /// Sort entries by key. The sort is stable, so duplicates keep their
    /// relative order.
    pub fn sort_keys(&mut self) {
        self.style.touch();
        self.entries.sort_by(|a, b| a.key.name.cmp(&b.key.name));
    }

    /// Only reached from [`DocumentNode::set`] once the whole path has been
    /// checked, so the returned child is always written to.
    fn get_or_insert_with(
        &mut self,
        key: &str,
        make: impl FnOnce() -> DocumentNode,
    ) -> &mut DocumentNode {
        self.style.touch();
        let index = match self.entries.iter().rposition(|e| e.key.name == key) {
            Some(i) => i,
            None => {
                self.entries
                    .push(MapEntry::generated(key.to_string(), make()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].value
    }
}

/// A sequence.
#[derive(Debug, Clone)]
pub struct SequenceNode {
    pub(crate) items: Vec<SeqItem>,
    pub(crate) style: CollectionStyle,
}

impl Default for SequenceNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceNode {
    /// An empty generated block sequence.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            style: CollectionStyle::Block { indent: None },
        }
    }

    /// An empty generated flow sequence.
    pub fn flow() -> Self {
        Self {
            items: Vec::new(),
            style: CollectionStyle::Flow { repr: None },
        }
    }

    pub(crate) fn with_style(items: Vec<SeqItem>, style: CollectionStyle) -> Self {
        Self { items, style }
    }

    /// Layout of the sequence.
    pub fn style(&self) -> &CollectionStyle {
        &self.style
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in order.
    pub fn items(&self) -> &[SeqItem] {
        &self.items
    }

    /// Values in order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentNode> {
        self.items.iter().map(|item| &item.value)
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<&DocumentNode> {
        self.items.get(index).map(|item| &item.value)
    }

    /// Mutable item at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut DocumentNode> {
        let item = self.items.get_mut(index)?;
        self.style.touch();
        Some(&mut item.value)
    }

    /// Append an item.
    pub fn push(&mut self, value: DocumentNode) {
        self.style.touch();
        self.items.push(SeqItem::generated(value));
    }

    /// Replace the item at `index`, keeping its comments. Returns the
    /// previous value, or `None` if `index` is out of range.
    pub fn replace(&mut self, index: usize, value: DocumentNode) -> Option<DocumentNode> {
        let item = self.items.get_mut(index)?;
        let previous = std::mem::replace(&mut item.value, value);
        self.style.touch();
        Some(previous)
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<DocumentNode> {
        if index >= self.items.len() {
            return None;
        }
        self.style.touch();
        Some(self.items.remove(index).value)
    }
}

/// A node of the document tree.
#[derive(Debug, Clone)]
pub enum DocumentNode {
    /// A scalar.
    Scalar(ScalarNode),
    /// An ordered mapping.
    Mapping(MappingNode),
    /// A sequence.
    Sequence(SequenceNode),
}

impl From<ScalarNode> for DocumentNode {
    fn from(node: ScalarNode) -> Self {
        DocumentNode::Scalar(node)
    }
}

impl From<MappingNode> for DocumentNode {
    fn from(node: MappingNode) -> Self {
        DocumentNode::Mapping(node)
    }
}

impl From<SequenceNode> for DocumentNode {
    fn from(node: SequenceNode) -> Self {
        DocumentNode::Sequence(node)
    }
}

impl DocumentNode {
    /// A generated null scalar.
    pub fn null() -> Self {
        DocumentNode::Scalar(ScalarNode::new(Scalar::Null))
    }

    /// A generated scalar.
    pub fn scalar(value: impl Into<Scalar>) -> Self {
        DocumentNode::Scalar(ScalarNode::new(value))
    }

    /// `"scalar"`, `"mapping"`, or `"sequence"`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DocumentNode::Scalar(_) => "scalar",
            DocumentNode::Mapping(_) => "mapping",
            DocumentNode::Sequence(_) => "sequence",
        }
    }

    /// Like [`kind_name`](Self::kind_name), but scalars report their value
    /// type (`"int"`, `"string"`, ...).
    pub fn type_name(&self) -> &'static str {
        match self {
            DocumentNode::Scalar(s) => s.value.type_name(),
            other => other.kind_name(),
        }
    }

    /// True for a null scalar.
    pub fn is_null(&self) -> bool {
        matches!(self, DocumentNode::Scalar(s) if s.value.is_null())
    }

    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            DocumentNode::Scalar(s) => Some(&s.value),
            _ => None,
        }
    }

    /// The mapping, if this is one.
    pub fn as_mapping(&self) -> Option<&MappingNode> {
        match self {
            DocumentNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// The mutable mapping, if this is one.
    pub fn as_mapping_mut(&mut self) -> Option<&mut MappingNode> {
        match self {
            DocumentNode::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// The sequence, if this is one.
    pub fn as_sequence(&self) -> Option<&SequenceNode> {
        match self {
            DocumentNode::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// The mutable sequence, if this is one.
    pub fn as_sequence_mut(&mut self) -> Option<&mut SequenceNode> {
        match self {
            DocumentNode::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Resolve `path`. A missing key or index, or a null on the way, gives
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`PathError`] when the path continues below a non-null scalar or
    /// applies a key to a sequence (or an index to a mapping).
    pub fn get(&self, path: &DocPath) -> Result<Option<&DocumentNode>, PathError> {
        let mut node = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            let next = match (node, segment) {
                (DocumentNode::Mapping(m), PathSegment::Key(k)) => m.get(k),
                (DocumentNode::Sequence(s), PathSegment::Index(i)) => s.get(*i),
                (n, _) if n.is_null() => None,
                (n, seg) => return Err(n.wrong_kind(seg, path, depth)),
            };
            match next {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// Mutable variant of [`get`](Self::get).
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut(&mut self, path: &DocPath) -> Result<Option<&mut DocumentNode>, PathError> {
        // A miss must not clear cached flow text on the way.
        if self.get(path)?.is_none() {
            return Ok(None);
        }
        let mut node = self;
        for (depth, segment) in path.segments().iter().enumerate() {
            if node.is_null() {
                return Ok(None);
            }
            let next = match (node, segment) {
                (DocumentNode::Mapping(m), PathSegment::Key(k)) => m.get_mut(k),
                (DocumentNode::Sequence(s), PathSegment::Index(i)) => s.get_mut(*i),
                (n, seg) => return Err(n.wrong_kind(seg, path, depth)),
            };
            match next {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// Write `value` at `path`, creating intermediate mappings (or
    /// sequences, when the next segment is an index) and replacing nulls on
    /// the way. An index equal to the sequence length appends. Returns the
    /// replaced value.
    ///
    /// # Errors
    ///
    /// [`PathError`] for a non-null scalar on the way, a kind mismatch, or
    /// an index beyond the end of a sequence. The tree is unchanged on error.
    pub fn set(
        &mut self,
        path: &DocPath,
        value: DocumentNode,
    ) -> Result<Option<DocumentNode>, PathError> {
        let segments = path.segments();
        let Some((last, parents)) = segments.split_last() else {
            return Ok(Some(std::mem::replace(self, value)));
        };
        self.check_settable(path)?;

        let mut node = self;
        for (depth, segment) in parents.iter().enumerate() {
            node = node.child_or_insert(segment, &segments[depth + 1], path, depth)?;
        }

        let depth = parents.len();
        node.promote_null(last);
        match (node, last) {
            (DocumentNode::Mapping(m), PathSegment::Key(k)) => Ok(m.insert(k.clone(), value)),
            (DocumentNode::Sequence(s), PathSegment::Index(i)) => {
                let len = s.len();
                if *i < len {
                    Ok(s.replace(*i, value))
                } else if *i == len {
                    s.push(value);
                    Ok(None)
                } else {
                    Err(PathError::IndexOutOfRange {
                        path: prefix(path, depth),
                        index: *i,
                        len,
                    })
                }
            }
            (n, seg) => Err(n.wrong_kind(seg, path, depth)),
        }
    }

    /// Remove the node at `path`. Returns it, or `None` if it was absent.
    ///
    /// # Errors
    ///
    /// [`PathError::RemoveRoot`] for the root path; otherwise as
    /// [`get`](Self::get).
    pub fn remove(&mut self, path: &DocPath) -> Result<Option<DocumentNode>, PathError> {
        let Some((last, parents)) = path.segments().split_last() else {
            return Err(PathError::RemoveRoot);
        };
        if self.get(path)?.is_none() {
            return Ok(None);
        }
        let parent_path = DocPath::from_segments(parents.to_vec());
        let Some(parent) = self.get_mut(&parent_path)? else {
            return Ok(None);
        };
        match (parent, last) {
            (DocumentNode::Mapping(m), PathSegment::Key(k)) => Ok(m.remove(k)),
            (DocumentNode::Sequence(s), PathSegment::Index(i)) => Ok(s.remove(*i)),
            (p, _) if p.is_null() => Ok(None),
            (p, seg) => Err(p.wrong_kind(seg, path, parents.len())),
        }
    }

    /// Structural equality: same kinds, keys, order, and values. Formatting
    /// is ignored.
    pub fn content_eq(&self, other: &DocumentNode) -> bool {
        match (self, other) {
            (DocumentNode::Scalar(a), DocumentNode::Scalar(b)) => a.value.same(&b.value),
            (DocumentNode::Mapping(a), DocumentNode::Mapping(b)) => {
                a.len() == b.len()
                    && a.entries.iter().zip(&b.entries).all(|(x, y)| {
                        x.key.name == y.key.name && x.value.content_eq(&y.value)
                    })
            }
            (DocumentNode::Sequence(a), DocumentNode::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.content_eq(y))
            }
            _ => false,
        }
    }

    /// Build a generated tree from JSON. Non-empty arrays holding only
    /// numbers and nulls use flow style, as 4C writes vectors.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => DocumentNode::null(),
            Value::Bool(b) => DocumentNode::scalar(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => DocumentNode::scalar(i),
                None => DocumentNode::scalar(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => DocumentNode::scalar(s.as_str()),
            Value::Array(items) => {
                let numeric = !items.is_empty()
                    && items.iter().all(|v| v.is_number() || v.is_null());
                let mut seq = if numeric {
                    SequenceNode::flow()
                } else {
                    SequenceNode::new()
                };
                seq.items = items
                    .iter()
                    .map(|v| SeqItem::generated(DocumentNode::from_json(v)))
                    .collect();
                DocumentNode::Sequence(seq)
            }
            Value::Object(map) => {
                let mut mapping = MappingNode::new();
                mapping.entries = map
                    .iter()
                    .map(|(k, v)| MapEntry::generated(k.clone(), DocumentNode::from_json(v)))
                    .collect();
                DocumentNode::Mapping(mapping)
            }
        }
    }

    /// JSON view of the tree. Duplicate keys collapse to their last value.
    ///
    /// # Errors
    ///
    /// [`DocumentError::NotRepresentable`] for NaN and infinite floats.
    pub fn to_json(&self) -> Result<Value, DocumentError> {
        self.to_json_at(&DocPath::root())
    }

    fn to_json_at(&self, path: &DocPath) -> Result<Value, DocumentError> {
        Ok(match self {
            DocumentNode::Scalar(s) => match &s.value {
                Scalar::Null => Value::Null,
                Scalar::Bool(b) => Value::Bool(*b),
                Scalar::Integer(i) => Value::Number((*i).into()),
                Scalar::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                    DocumentError::NotRepresentable {
                        path: path.to_string(),
                        value: s.value.render(),
                    }
                })?,
                Scalar::String(text) => Value::String(text.clone()),
            },
            DocumentNode::Mapping(m) => {
                let mut map = Map::new();
                for (key, value) in m.iter() {
                    map.insert(key.to_string(), value.to_json_at(&path.child(key))?);
                }
                Value::Object(map)
            }
            DocumentNode::Sequence(s) => Value::Array(
                s.iter()
                    .enumerate()
                    .map(|(i, v)| v.to_json_at(&path.index(i)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Walk `path` as [`set`](Self::set) would, without creating anything.
    /// Absent and null nodes stand for the empty collection `set` creates.
    fn check_settable(&self, path: &DocPath) -> Result<(), PathError> {
        let mut node = Some(self);
        for (depth, segment) in path.segments().iter().enumerate() {
            node = match (node.filter(|n| !n.is_null()), segment) {
                (None, PathSegment::Key(_)) | (None, PathSegment::Index(0)) => None,
                (None, PathSegment::Index(i)) => {
                    return Err(PathError::IndexOutOfRange {
                        path: prefix(path, depth),
                        index: *i,
                        len: 0,
                    })
                }
                (Some(DocumentNode::Mapping(m)), PathSegment::Key(k)) => m.get(k),
                (Some(DocumentNode::Sequence(s)), PathSegment::Index(i)) => {
                    if *i > s.len() {
                        return Err(PathError::IndexOutOfRange {
                            path: prefix(path, depth),
                            index: *i,
                            len: s.len(),
                        });
                    }
                    s.get(*i)
                }
                (Some(n), seg) => return Err(n.wrong_kind(seg, path, depth)),
            };
        }
        Ok(())
    }

    fn promote_null(&mut self, segment: &PathSegment) {
        if self.is_null() {
            *self = match segment {
                PathSegment::Key(_) => DocumentNode::Mapping(MappingNode::new()),
                PathSegment::Index(_) => DocumentNode::Sequence(SequenceNode::new()),
            };
        }
    }

    fn child_or_insert(
        &mut self,
        segment: &PathSegment,
        next: &PathSegment,
        path: &DocPath,
        depth: usize,
    ) -> Result<&mut DocumentNode, PathError> {
        let empty = || match next {
            PathSegment::Key(_) => DocumentNode::Mapping(MappingNode::new()),
            PathSegment::Index(_) => DocumentNode::Sequence(SequenceNode::new()),
        };
        self.promote_null(segment);
        match (self, segment) {
            (DocumentNode::Mapping(m), PathSegment::Key(k)) => Ok(m.get_or_insert_with(k, empty)),
            (DocumentNode::Sequence(s), PathSegment::Index(i)) => {
                let len = s.len();
                if *i == len {
                    s.push(empty());
                } else if *i > len {
                    return Err(PathError::IndexOutOfRange {
                        path: prefix(path, depth),
                        index: *i,
                        len,
                    });
                }
                s.style.touch();
                Ok(&mut s.items[*i].value)
            }
            (n, seg) => Err(n.wrong_kind(seg, path, depth)),
        }
    }

    fn wrong_kind(&self, segment: &PathSegment, path: &DocPath, depth: usize) -> PathError {
        let at = prefix(path, depth);
        match (self, segment) {
            (DocumentNode::Scalar(_), _) => PathError::ThroughScalar { path: at },
            (_, PathSegment::Key(_)) => PathError::NotAMapping {
                path: at,
                found: self.kind_name(),
            },
            (_, PathSegment::Index(_)) => PathError::NotASequence {
                path: at,
                found: self.kind_name(),
            },
        }
    }
}

/// Text of the first `depth` segments of `path`.
fn prefix(path: &DocPath, depth: usize) -> String {
    DocPath::from_segments(path.segments()[..depth].to_vec()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> DocPath {
        DocPath::parse(s).unwrap()
    }

    #[test]
    fn test_insert_keeps_order_and_overwrites_in_place() {
        let mut m = MappingNode::new();
        m.insert("b", DocumentNode::scalar(1));
        m.insert("a", DocumentNode::scalar(2));
        let old = m.insert("b", DocumentNode::scalar(3));
        assert!(old.is_some());
        assert_eq!(m.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(m.get("b").unwrap().as_scalar(), Some(&Scalar::Integer(3)));
    }

    #[test]
    fn test_duplicate_keys_resolve_to_last() {
        let mut m = MappingNode::new();
        m.entries.push(MapEntry::generated("k".into(), DocumentNode::scalar(1)));
        m.entries.push(MapEntry::generated("k".into(), DocumentNode::scalar(2)));
        assert_eq!(m.get("k").unwrap().as_scalar(), Some(&Scalar::Integer(2)));
        assert_eq!(m.remove("k").unwrap().as_scalar(), Some(&Scalar::Integer(2)));
        assert!(m.is_empty());
    }

    #[test]
    fn test_get_through_null_is_absent() {
        let node = DocumentNode::from_json(&json!({"a": null}));
        assert!(node.get(&path("a.b.c")).unwrap().is_none());
    }

    #[test]
    fn test_get_through_scalar_fails() {
        let node = DocumentNode::from_json(&json!({"a": {"b": 5}}));
        let err = node.get(&path("a.b.c")).unwrap_err();
        assert_eq!(
            err,
            PathError::ThroughScalar {
                path: "a.b".into()
            }
        );
    }

    #[test]
    fn test_index_on_mapping_fails() {
        let node = DocumentNode::from_json(&json!({"a": {"b": 5}}));
        let err = node.get(&path("a[0]")).unwrap_err();
        assert!(matches!(err, PathError::NotASequence { found: "mapping", .. }));
    }

    #[test]
    fn test_set_creates_intermediate_containers() {
        let mut node = DocumentNode::Mapping(MappingNode::new());
        node.set(&path("a.b[0].c"), DocumentNode::scalar("x")).unwrap();
        assert_eq!(
            node.to_json().unwrap(),
            json!({"a": {"b": [{"c": "x"}]}})
        );
    }

    #[test]
    fn test_set_replaces_null_but_not_scalar() {
        let mut node = DocumentNode::from_json(&json!({"a": null, "b": 1}));
        node.set(&path("a.x"), DocumentNode::scalar(true)).unwrap();
        assert_eq!(node.to_json().unwrap(), json!({"a": {"x": true}, "b": 1}));

        let err = node.set(&path("b.x"), DocumentNode::null()).unwrap_err();
        assert!(matches!(err, PathError::ThroughScalar { .. }));
    }

    #[test]
    fn test_set_index_appends_at_len_only() {
        let mut node = DocumentNode::from_json(&json!({"v": [1, 2]}));
        node.set(&path("v[2]"), DocumentNode::scalar(3)).unwrap();
        let err = node.set(&path("v[5]"), DocumentNode::scalar(9)).unwrap_err();
        assert_eq!(
            err,
            PathError::IndexOutOfRange {
                path: "v".into(),
                index: 5,
                len: 3
            }
        );
    }

    #[test]
    fn test_failed_set_creates_nothing() {
        let mut node = DocumentNode::from_json(&json!({"a": 1, "v": [1], "n": null}));
        let before = node.clone();

        let err = node.set(&path("b.c[3]"), DocumentNode::scalar(1)).unwrap_err();
        assert_eq!(
            err,
            PathError::IndexOutOfRange {
                path: "b.c".into(),
                index: 3,
                len: 0
            }
        );
        assert!(node.set(&path("n.x[1]"), DocumentNode::scalar(1)).is_err());
        assert!(node.set(&path("v[3].k"), DocumentNode::scalar(1)).is_err());
        assert!(node.set(&path("new.a.b"), DocumentNode::scalar(1)).is_ok());
        assert!(node.set(&path("new.a.b.c"), DocumentNode::scalar(1)).is_err());
        node.remove(&path("new")).unwrap();
        assert!(node.content_eq(&before));
    }

    #[test]
    fn test_missing_key_keeps_flow_text() {
        let mut m = MappingNode::with_style(
            vec![MapEntry::generated("a".into(), DocumentNode::scalar(1))],
            CollectionStyle::Flow {
                repr: Some("{a:   1}".into()),
            },
        );
        assert!(m.remove("zzz").is_none());
        assert!(m.get_mut("zzz").is_none());
        assert_eq!(
            m.style(),
            &CollectionStyle::Flow {
                repr: Some("{a:   1}".into())
            }
        );
    }

    #[test]
    fn test_remove() {
        let mut node = DocumentNode::from_json(&json!({"a": {"b": 1, "c": 2}}));
        assert!(node.remove(&path("a.b")).unwrap().is_some());
        assert!(node.remove(&path("a.zz")).unwrap().is_none());
        assert!(matches!(
            node.remove(&DocPath::root()),
            Err(PathError::RemoveRoot)
        ));
        assert_eq!(node.to_json().unwrap(), json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_mutation_clears_flow_text() {
        let mut seq = SequenceNode::with_style(
            Vec::new(),
            CollectionStyle::Flow {
                repr: Some("[ ]".into()),
            },
        );
        seq.push(DocumentNode::scalar(1));
        assert_eq!(seq.style(), &CollectionStyle::Flow { repr: None });
    }

    #[test]
    fn test_from_json_uses_flow_for_numeric_arrays() {
        let node = DocumentNode::from_json(&json!({"v": [1.0, 2, null], "s": ["a"]}));
        let m = node.as_mapping().unwrap();
        assert!(m.get("v").unwrap().as_sequence().unwrap().style().is_flow());
        assert!(!m.get("s").unwrap().as_sequence().unwrap().style().is_flow());
    }

    #[test]
    fn test_to_json_rejects_nan() {
        let mut node = DocumentNode::from_json(&json!({"x": 1}));
        node.set(&path("x"), DocumentNode::scalar(f64::NAN)).unwrap();
        let err = node.to_json().unwrap_err();
        assert!(matches!(err, DocumentError::NotRepresentable { ref path, .. } if path == "x"));
    }

    #[test]
    fn test_content_eq_respects_order() {
        let a = DocumentNode::from_json(&json!({"a": 1, "b": 2}));
        let b = DocumentNode::from_json(&json!({"b": 2, "a": 1}));
        assert!(a.content_eq(&a.clone()));
        assert!(!a.content_eq(&b));
    }

    #[test]
    fn test_sort_keys() {
        let mut node = DocumentNode::from_json(&json!({"c": 1, "a": 2, "b": 3}));
        node.as_mapping_mut().unwrap().sort_keys();
        let keys: Vec<_> = node.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }
}
