//! # Document Paths
//!
//! A [`DocPath`] addresses a node inside a document tree or an entry inside
//! a schema model. The textual form joins mapping keys with `.` and writes
//! sequence indices in brackets:
//!
//! ```text
//! Solver.tolerance
//! FUNCT1[0].COMPONENT
//! [2].name            (index into a root sequence)
//! ```
//!
//! The empty string is the root path. Keys containing `.` or `[` cannot be
//! written textually; build those paths with [`DocPath::child`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathParseError;

/// One step of a [`DocPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

impl PathSegment {
    /// Returns the key if this is a key segment.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }

    /// Returns the index if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(_) => None,
            PathSegment::Index(i) => Some(*i),
        }
    }
}

/// Path into a document tree or schema model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from explicit segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Parse the textual `a.b[0].c` form.
    ///
    /// # Errors
    ///
    /// Returns [`PathParseError`] for empty key segments, unbalanced or
    /// non-numeric brackets, and stray `]` characters.
    pub fn parse(input: &str) -> Result<Self, PathParseError> {
        let fail = |reason: &str| PathParseError {
            path: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        if input.is_empty() {
            return Ok(Self { segments });
        }

        for (part_no, part) in input.split('.').enumerate() {
            let (name, mut rest) = match part.find('[') {
                Some(i) => (&part[..i], &part[i..]),
                None => (part, ""),
            };

            if name.contains(']') {
                return Err(fail("unexpected ']'"));
            }
            if name.is_empty() && (rest.is_empty() || part_no > 0) {
                return Err(fail("empty key segment"));
            }
            if !name.is_empty() {
                segments.push(PathSegment::Key(name.to_string()));
            }

            while !rest.is_empty() {
                let Some(inner) = rest.strip_prefix('[') else {
                    return Err(fail("text after index"));
                };
                let Some(close) = inner.find(']') else {
                    return Err(fail("unclosed '['"));
                };
                let digits = &inner[..close];
                let index = digits
                    .parse::<usize>()
                    .map_err(|_| fail("index must be a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &inner[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    /// Returns the segments of this path.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with a key segment appended.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.into()));
        Self { segments }
    }

    /// Returns a new path with an index segment appended.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The final segment, or `None` for the root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Key form used by the schema index: every index becomes `[]`, since
    /// all elements of a sequence share one schema entry.
    pub fn schema_key(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                PathSegment::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                PathSegment::Index(_) => out.push_str("[]"),
            }
        }
        out
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(k)?;
                }
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for DocPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
