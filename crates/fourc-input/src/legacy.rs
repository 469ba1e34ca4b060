//! # Legacy Sections
//!
//! Mesh data (nodes, elements, node topology, ...) is still written as
//! whitespace-separated "dat" lines inside YAML string lists. This module
//! reads those lines into typed values and writes them back.
//!
//! The line format follows from the section name:
//!
//! | section                  | line                                             |
//! |--------------------------|--------------------------------------------------|
//! | `NODE COORDS`            | `NODE 1 COORD 0.0 0.0 0.0`                       |
//! | `* ELEMENTS`             | `1 SOLID HEX8 1 2 3 4 5 6 7 8 MAT 1`             |
//! | `* NODE TOPOLOGY`        | `NODE 1 DNODE 1`, `CORNER box x- y+ z- DNODE 2`  |
//! | `* DOMAIN`               | `LOWER_BOUND 0.0 0.0 0.0`, one keyword per line  |
//! | `PARTICLES`              | `TYPE water POS 0.1 0.2 0.3 RAD 0.5`             |
//! | `* KNOTVECTORS`          | `NURBS_DIMENSION 2` ... `END NURBSPATCH` blocks  |
//!
//! Element and particle keywords take their types from the
//! [`LegacySpecs`] of the schema. Writing is canonical: reading the written
//! lines gives back equal values, and the tokens of a canonical line are
//! reproduced exactly.

use std::fmt;
use std::iter::Peekable;
use std::str::{FromStr, SplitWhitespace};

use fourc_schema::{EntryKind, LegacySpecs, MetadataEntry, PrimitiveType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LegacyError;

/// Line format of a legacy section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyKind {
    Nodes,
    Elements,
    Topology,
    Domain,
    Particles,
    KnotVectors,
}

impl LegacyKind {
    /// Format of the section `name`, if it has one.
    pub fn of(name: &str) -> Option<Self> {
        match name {
            "NODE COORDS" => Some(Self::Nodes),
            "PARTICLES" => Some(Self::Particles),
            _ if name.ends_with("ELEMENTS") => Some(Self::Elements),
            _ if name.ends_with("NODE TOPOLOGY") => Some(Self::Topology),
            _ if name.ends_with("DOMAIN") => Some(Self::Domain),
            _ if name.ends_with("KNOTVECTORS") => Some(Self::KnotVectors),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Elements => "elements",
            Self::Topology => "node topology",
            Self::Domain => "domain",
            Self::Particles => "particles",
            Self::KnotVectors => "knot vectors",
        }
    }
}

impl fmt::Display for LegacyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpreted content of a legacy section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LegacySection {
    Nodes(Vec<Node>),
    Elements(Vec<Element>),
    Topology(Vec<TopologyEntry>),
    Domain(Domain),
    Particles(Vec<Particle>),
    KnotVectors(Vec<NurbsPatch>),
}

impl LegacySection {
    /// Interpret the lines of `section`. Blank lines are skipped; line
    /// numbers in errors count from 1 and include them.
    ///
    /// # Errors
    ///
    /// [`LegacyError`] for the first line that does not follow the format.
    pub fn read(
        kind: LegacyKind,
        section: &str,
        lines: &[String],
        specs: &LegacySpecs,
    ) -> Result<Self, LegacyError> {
        let numbered = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i + 1, line.as_str()))
            .filter(|(_, line)| !line.trim().is_empty());
        let fail = |line: usize| {
            move |reason: String| LegacyError {
                section: section.to_string(),
                line,
                reason,
            }
        };
        Ok(match kind {
            LegacyKind::Nodes => Self::Nodes(
                numbered
                    .clone()
                    .map(|(n, line)| Node::from_str(line).map_err(fail(n)))
                    .collect::<Result<_, _>>()?,
            ),
            LegacyKind::Elements => Self::Elements(
                numbered
                    .clone()
                    .map(|(n, line)| Element::read(line, specs).map_err(fail(n)))
                    .collect::<Result<_, _>>()?,
            ),
            LegacyKind::Topology => Self::Topology(
                numbered
                    .clone()
                    .map(|(n, line)| TopologyEntry::from_str(line).map_err(fail(n)))
                    .collect::<Result<_, _>>()?,
            ),
            LegacyKind::Particles => Self::Particles(
                numbered
                    .clone()
                    .map(|(n, line)| Particle::read(line, specs).map_err(fail(n)))
                    .collect::<Result<_, _>>()?,
            ),
            LegacyKind::Domain => {
                let mut domain = Domain::default();
                for (n, line) in numbered {
                    domain.read_line(line).map_err(fail(n))?;
                }
                Self::Domain(domain)
            }
            LegacyKind::KnotVectors => {
                let mut reader = KnotReader::default();
                for (n, line) in numbered {
                    reader.line(line).map_err(fail(n))?;
                }
                Self::KnotVectors(reader.finish().map_err(fail(lines.len()))?)
            }
        })
    }

    pub fn kind(&self) -> LegacyKind {
        match self {
            Self::Nodes(_) => LegacyKind::Nodes,
            Self::Elements(_) => LegacyKind::Elements,
            Self::Topology(_) => LegacyKind::Topology,
            Self::Domain(_) => LegacyKind::Domain,
            Self::Particles(_) => LegacyKind::Particles,
            Self::KnotVectors(_) => LegacyKind::KnotVectors,
        }
    }

    /// The section as dat lines.
    pub fn to_lines(&self) -> Vec<String> {
        match self {
            Self::Nodes(nodes) => nodes.iter().map(ToString::to_string).collect(),
            Self::Elements(elements) => elements.iter().map(ToString::to_string).collect(),
            Self::Topology(entries) => entries.iter().map(ToString::to_string).collect(),
            Self::Domain(domain) => domain.to_lines(),
            Self::Particles(particles) => particles.iter().map(ToString::to_string).collect(),
            Self::KnotVectors(patches) => patches.iter().flat_map(NurbsPatch::to_lines).collect(),
        }
    }
}

// --- nodes ---

/// Node flavour, the first token of a node line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain mesh node.
    #[serde(rename = "NODE")]
    Node,
    /// NURBS control point; the last coordinate is the weight.
    #[serde(rename = "CP")]
    ControlPoint,
    /// Node carrying fiber directions.
    #[serde(rename = "FNODE")]
    FiberNode,
}

impl NodeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Node => "NODE",
            Self::ControlPoint => "CP",
            Self::FiberNode => "FNODE",
        }
    }
}

/// One line of `NODE COORDS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub id: i64,
    #[serde(rename = "COORD")]
    pub coord: Vec<f64>,
    /// Named direction vectors after the coordinates (`FIBER1`, `CIR`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fibers: Vec<Fiber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fiber {
    pub name: String,
    pub values: Vec<f64>,
}

impl FromStr for Node {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, String> {
        let mut tokens = Tokens::new(line);
        let kind = match tokens.word("node type")? {
            "NODE" => NodeKind::Node,
            "CP" => NodeKind::ControlPoint,
            "FNODE" => NodeKind::FiberNode,
            other => return Err(format!("unknown node type '{other}'")),
        };
        let id = tokens.int("node id")?;
        tokens.keyword("COORD")?;
        let coord = tokens.floats();
        if coord.is_empty() {
            return Err("missing coordinates".to_string());
        }
        let mut fibers = Vec::new();
        while let Some(name) = tokens.next() {
            let values = tokens.floats();
            if values.is_empty() {
                return Err(format!("'{name}' has no values"));
            }
            fibers.push(Fiber {
                name: name.to_string(),
                values,
            });
        }
        Ok(Self {
            kind,
            id,
            coord,
            fibers,
        })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} COORD {}",
            self.kind.keyword(),
            self.id,
            join_floats(&self.coord)
        )?;
        for fiber in &self.fibers {
            write!(f, " {} {}", fiber.name, join_floats(&fiber.values))?;
        }
        Ok(())
    }
}

// --- elements ---

/// One element line: id, element type, cell, then keyword parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: i64,
    pub cell: Cell,
    pub data: ElementData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(rename = "type")]
    pub cell_type: String,
    pub connectivity: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementData {
    #[serde(rename = "type")]
    pub element_type: String,
    /// Keyword parameters in line order.
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl Element {
    /// Read an element line, typing its parameters from `specs`.
    ///
    /// # Errors
    ///
    /// A message naming the first token that does not fit.
    pub fn read(line: &str, specs: &LegacySpecs) -> Result<Self, String> {
        let mut tokens = Tokens::new(line);
        let id = tokens.int("element id")?;
        let element_type = tokens.word("element type")?;
        let cell_type = tokens.word("cell type")?;
        if specs.element_types().all(|t| t != element_type) {
            return Err(format!("unknown element type '{element_type}'"));
        }
        let Some(cell) = specs.cell(element_type, cell_type) else {
            return Err(format!(
                "element type '{element_type}' has no cell type '{cell_type}'"
            ));
        };
        let connectivity = (0..cell.nodes())
            .map(|_| tokens.int("node id"))
            .collect::<Result<Vec<_>, _>>()?;

        let parameters = keyword_values(&mut tokens, |key| cell.parameter(key))
            .map_err(|e| format!("{e} ({element_type} {cell_type})"))?;
        Ok(Self {
            id,
            cell: Cell {
                cell_type: cell_type.to_string(),
                connectivity,
            },
            data: ElementData {
                element_type: element_type.to_string(),
                parameters,
            },
        })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id, self.data.element_type, self.cell.cell_type)?;
        for node in &self.cell.connectivity {
            write!(f, " {node}")?;
        }
        write_keywords(f, &self.data.parameters, true)
    }
}

// --- particles ---

/// One particle line: keyword parameters only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Particle(pub Map<String, Value>);

impl Particle {
    /// Read a particle line, typing its parameters from `specs`.
    ///
    /// # Errors
    ///
    /// A message naming the first token that does not fit.
    pub fn read(line: &str, specs: &LegacySpecs) -> Result<Self, String> {
        let mut tokens = Tokens::new(line);
        keyword_values(&mut tokens, |key| specs.particle_parameter(key)).map(Self)
    }
}

impl fmt::Display for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_keywords(f, &self.0, false)
    }
}

// --- node topology ---

/// Side of a bounding box, used to place topology entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "x-")]
    XMinus,
    #[serde(rename = "x+")]
    XPlus,
    #[serde(rename = "y-")]
    YMinus,
    #[serde(rename = "y+")]
    YPlus,
    #[serde(rename = "z-")]
    ZMinus,
    #[serde(rename = "z+")]
    ZPlus,
}

impl Direction {
    const ALL: [Self; 6] = [
        Self::XMinus,
        Self::XPlus,
        Self::YMinus,
        Self::YPlus,
        Self::ZMinus,
        Self::ZPlus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::XMinus => "x-",
            Self::XPlus => "x+",
            Self::YMinus => "y-",
            Self::YPlus => "y+",
            Self::ZMinus => "z-",
            Self::ZPlus => "z+",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("'{s}' is not one of x-, x+, y-, y+, z-, z+"))
    }
}

/// One line of a node topology section. Entries other than `NODE` select
/// nodes geometrically on a box-shaped discretization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum TopologyEntry {
    Node {
        node_id: i64,
        d_type: String,
        d_id: i64,
    },
    Corner {
        discretization_type: String,
        corner_description: [Direction; 3],
        d_type: String,
        d_id: i64,
    },
    Edge {
        discretization_type: String,
        edge_description: [Direction; 2],
        d_type: String,
        d_id: i64,
    },
    Side {
        discretization_type: String,
        side_description: [Direction; 1],
        d_type: String,
        d_id: i64,
    },
    Volume {
        discretization_type: String,
        d_type: String,
        d_id: i64,
    },
}

impl FromStr for TopologyEntry {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, String> {
        let mut tokens = Tokens::new(line);
        let entry = match tokens.word("topology type")? {
            "NODE" => Self::Node {
                node_id: tokens.int("node id")?,
                d_type: tokens.word("design type")?.to_string(),
                d_id: tokens.int("design id")?,
            },
            "CORNER" => Self::Corner {
                discretization_type: tokens.word("discretization type")?.to_string(),
                corner_description: [tokens.direction()?, tokens.direction()?, tokens.direction()?],
                d_type: tokens.word("design type")?.to_string(),
                d_id: tokens.int("design id")?,
            },
            "EDGE" => Self::Edge {
                discretization_type: tokens.word("discretization type")?.to_string(),
                edge_description: [tokens.direction()?, tokens.direction()?],
                d_type: tokens.word("design type")?.to_string(),
                d_id: tokens.int("design id")?,
            },
            "SIDE" => Self::Side {
                discretization_type: tokens.word("discretization type")?.to_string(),
                side_description: [tokens.direction()?],
                d_type: tokens.word("design type")?.to_string(),
                d_id: tokens.int("design id")?,
            },
            "VOLUME" => Self::Volume {
                discretization_type: tokens.word("discretization type")?.to_string(),
                d_type: tokens.word("design type")?.to_string(),
                d_id: tokens.int("design id")?,
            },
            other => return Err(format!("unknown topology type '{other}'")),
        };
        tokens.end()?;
        Ok(entry)
    }
}

impl fmt::Display for TopologyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (keyword, discretization, directions, d_type, d_id) = match self {
            Self::Node {
                node_id,
                d_type,
                d_id,
            } => return write!(f, "NODE {node_id} {d_type} {d_id}"),
            Self::Corner {
                discretization_type,
                corner_description,
                d_type,
                d_id,
            } => (
                "CORNER",
                discretization_type,
                corner_description.as_slice(),
                d_type,
                d_id,
            ),
            Self::Edge {
                discretization_type,
                edge_description,
                d_type,
                d_id,
            } => ("EDGE", discretization_type, edge_description.as_slice(), d_type, d_id),
            Self::Side {
                discretization_type,
                side_description,
                d_type,
                d_id,
            } => ("SIDE", discretization_type, side_description.as_slice(), d_type, d_id),
            Self::Volume {
                discretization_type,
                d_type,
                d_id,
            } => ("VOLUME", discretization_type, &[] as &[Direction], d_type, d_id),
        };
        write!(f, "{keyword} {discretization}")?;
        for direction in directions {
            write!(f, " {}", direction.as_str())?;
        }
        write!(f, " {d_type} {d_id}")
    }
}

// --- domain ---

/// How a generated box domain is split across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Auto,
    Structured,
}

/// A box domain that 4C meshes itself, one keyword per line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Domain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervals: Option<[i64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[f64; 3]>,
    /// Element description: every token after the keyword.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<Partition>,
}

impl Domain {
    fn read_line(&mut self, line: &str) -> Result<(), String> {
        let mut tokens = Tokens::new(line);
        while let Some(key) = tokens.next() {
            match key {
                "LOWER_BOUND" => self.lower_bound = Some(tokens.float3(key)?),
                "UPPER_BOUND" => self.upper_bound = Some(tokens.float3(key)?),
                "ROTATION" => self.rotation = Some(tokens.float3(key)?),
                "INTERVALS" => {
                    self.intervals = Some([tokens.int(key)?, tokens.int(key)?, tokens.int(key)?])
                }
                "ELEMENTS" => {
                    self.elements = Some(tokens.by_ref().map(str::to_string).collect());
                }
                "PARTITION" => {
                    self.partition = Some(match tokens.word(key)? {
                        "auto" => Partition::Auto,
                        "structured" => Partition::Structured,
                        other => return Err(format!("'{other}' is not one of auto, structured")),
                    })
                }
                other => return Err(format!("unknown domain keyword '{other}'")),
            }
        }
        Ok(())
    }

    fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(lower) = &self.lower_bound {
            lines.push(format!("LOWER_BOUND {}", join_floats(lower)));
        }
        if let Some(upper) = &self.upper_bound {
            lines.push(format!("UPPER_BOUND {}", join_floats(upper)));
        }
        if let Some([a, b, c]) = self.intervals {
            lines.push(format!("INTERVALS {a} {b} {c}"));
        }
        if let Some(rotation) = &self.rotation {
            lines.push(format!("ROTATION {}", join_floats(rotation)));
        }
        if let Some(elements) = &self.elements {
            lines.push(format!("ELEMENTS {}", elements.join(" ")));
        }
        if let Some(partition) = self.partition {
            let name = match partition {
                Partition::Auto => "auto",
                Partition::Structured => "structured",
            };
            lines.push(format!("PARTITION {name}"));
        }
        lines
    }
}

// --- knot vectors ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnotType {
    Interpolated,
    Periodic,
}

/// One knot vector of a NURBS patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnotVector {
    #[serde(rename = "DEGREE")]
    pub degree: i64,
    #[serde(rename = "TYPE")]
    pub knot_type: KnotType,
    pub knots: Vec<f64>,
}

/// A `BEGIN NURBSPATCH` ... `END NURBSPATCH` block, one knot vector per
/// parametric dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurbsPatch {
    #[serde(rename = "ID")]
    pub id: i64,
    pub knot_vectors: Vec<KnotVector>,
}

impl NurbsPatch {
    fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("NURBS_DIMENSION {}", self.knot_vectors.len()),
            "BEGIN NURBSPATCH".to_string(),
            format!("ID {}", self.id),
        ];
        for vector in &self.knot_vectors {
            lines.push(format!("NUMKNOTS {}", vector.knots.len()));
            lines.push(format!("DEGREE {}", vector.degree));
            lines.push(format!("TYPE {:?}", vector.knot_type));
            lines.extend(vector.knots.iter().map(|k| format!("{k:?}")));
        }
        lines.push("END NURBSPATCH".to_string());
        lines
    }
}

/// Line-by-line state of a knot vector section.
#[derive(Default)]
struct KnotReader {
    patches: Vec<NurbsPatch>,
    dimension: Option<usize>,
    patch: Option<NurbsPatch>,
    num_knots: Option<usize>,
    degree: Option<i64>,
    knot_type: Option<KnotType>,
    /// Knots still to read for the current vector.
    knots: Option<(usize, Vec<f64>)>,
}

impl KnotReader {
    fn line(&mut self, line: &str) -> Result<(), String> {
        let mut tokens = Tokens::new(line);
        let first = tokens.word("keyword")?;

        if let Some((remaining, knots)) = &mut self.knots {
            let knot = parse_float(first, "knot")?;
            tokens.end()?;
            knots.push(knot);
            *remaining -= 1;
            if *remaining == 0 {
                self.finish_vector()?;
            }
            return Ok(());
        }

        match first {
            "NURBS_DIMENSION" => self.dimension = Some(tokens.size(first)?),
            "BEGIN" => {
                tokens.keyword("NURBSPATCH")?;
                if self.patch.is_some() {
                    return Err("patch started inside another patch".to_string());
                }
                self.patch = Some(NurbsPatch {
                    id: 0,
                    knot_vectors: Vec::new(),
                });
            }
            "ID" => self.open_patch()?.id = tokens.int(first)?,
            "NUMKNOTS" => {
                let count = tokens.size(first)?;
                self.open_patch()?;
                self.num_knots = Some(count);
            }
            "DEGREE" => self.degree = Some(tokens.int(first)?),
            "TYPE" => {
                self.knot_type = Some(match tokens.word(first)? {
                    "Interpolated" => KnotType::Interpolated,
                    "Periodic" => KnotType::Periodic,
                    other => {
                        return Err(format!("'{other}' is not one of Interpolated, Periodic"))
                    }
                });
            }
            "END" => {
                tokens.keyword("NURBSPATCH")?;
                let patch = self.patch.take().ok_or("END without BEGIN")?;
                let expected = self.dimension.take().ok_or("missing NURBS_DIMENSION")?;
                if patch.knot_vectors.len() != expected {
                    return Err(format!(
                        "expected {expected} knot vectors, got {}",
                        patch.knot_vectors.len()
                    ));
                }
                self.patches.push(patch);
            }
            other => {
                // The first knot of a vector.
                parse_float(other, "knot")?;
                let count = self
                    .num_knots
                    .filter(|&n| n > 0)
                    .ok_or_else(|| format!("unexpected '{other}'"))?;
                self.knots = Some((count, Vec::with_capacity(count)));
                return self.line(line);
            }
        }
        tokens.end()
    }

    fn open_patch(&mut self) -> Result<&mut NurbsPatch, String> {
        self.patch
            .as_mut()
            .ok_or_else(|| "patch data outside BEGIN NURBSPATCH".to_string())
    }

    fn finish_vector(&mut self) -> Result<(), String> {
        let (_, knots) = self.knots.take().unwrap_or_default();
        self.num_knots = None;
        let vector = KnotVector {
            degree: self.degree.take().ok_or("knot vector without DEGREE")?,
            knot_type: self.knot_type.take().ok_or("knot vector without TYPE")?,
            knots,
        };
        self.open_patch()?.knot_vectors.push(vector);
        Ok(())
    }

    fn finish(self) -> Result<Vec<NurbsPatch>, String> {
        if self.patch.is_some() || self.knots.is_some() {
            return Err("unterminated NURBS patch".to_string());
        }
        Ok(self.patches)
    }
}

// --- tokens and keyword values ---

struct Tokens<'a> {
    inner: Peekable<SplitWhitespace<'a>>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        self.inner.next()
    }
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_whitespace().peekable(),
        }
    }

    fn word(&mut self, what: &str) -> Result<&'a str, String> {
        self.next().ok_or_else(|| format!("missing {what}"))
    }

    fn keyword(&mut self, expected: &str) -> Result<(), String> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected '{expected}', found '{token}'")),
            None => Err(format!("missing '{expected}'")),
        }
    }

    fn int(&mut self, what: &str) -> Result<i64, String> {
        let token = self.word(what)?;
        token
            .parse()
            .map_err(|_| format!("{what} '{token}' is not an integer"))
    }

    fn size(&mut self, what: &str) -> Result<usize, String> {
        let token = self.word(what)?;
        token
            .parse()
            .map_err(|_| format!("{what} '{token}' is not a count"))
    }

    fn float3(&mut self, what: &str) -> Result<[f64; 3], String> {
        Ok([
            parse_float(self.word(what)?, what)?,
            parse_float(self.word(what)?, what)?,
            parse_float(self.word(what)?, what)?,
        ])
    }

    /// Numbers up to the next word.
    fn floats(&mut self) -> Vec<f64> {
        let mut values = Vec::new();
        while let Some(value) = self.inner.peek().and_then(|t| finite(t)) {
            values.push(value);
            self.inner.next();
        }
        values
    }

    fn direction(&mut self) -> Result<Direction, String> {
        self.word("direction")?.parse()
    }

    fn end(&mut self) -> Result<(), String> {
        match self.next() {
            Some(token) => Err(format!("unexpected '{token}' at end of line")),
            None => Ok(()),
        }
    }
}

fn finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_float(token: &str, what: &str) -> Result<f64, String> {
    finite(token).ok_or_else(|| format!("{what} '{token}' is not a finite number"))
}

/// `KEY value...` pairs until the end of the line, typed by `lookup`.
fn keyword_values<'s>(
    tokens: &mut Tokens<'_>,
    lookup: impl Fn(&str) -> Option<&'s MetadataEntry>,
) -> Result<Map<String, Value>, String> {
    let mut values = Map::new();
    while let Some(key) = tokens.next() {
        let entry = lookup(key).ok_or_else(|| format!("unknown parameter '{key}'"))?;
        let value = typed_value(tokens, entry)?;
        if values.insert(key.to_string(), value).is_some() {
            return Err(format!("parameter '{key}' given twice"));
        }
    }
    Ok(values)
}

fn typed_value(tokens: &mut Tokens<'_>, entry: &MetadataEntry) -> Result<Value, String> {
    let name = entry.name();
    match entry.kind() {
        EntryKind::Primitive(primitive) => primitive_value(tokens.word(name)?, primitive, name),
        EntryKind::Enum => {
            let token = tokens.word(name)?;
            if entry.allowed_values().contains(token) {
                Ok(Value::from(token))
            } else {
                Err(format!("{name} '{token}' is not {}", entry.type_description()))
            }
        }
        EntryKind::Sequence => {
            let element = entry.element().map(MetadataEntry::kind);
            let (Some(size), Some(EntryKind::Primitive(primitive))) = (entry.size(), element)
            else {
                return Err(format!("{name} has no fixed-size line layout"));
            };
            (0..size)
                .map(|_| primitive_value(tokens.word(name)?, primitive, name))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        EntryKind::Mapping => Err(format!("{name} has no line layout")),
    }
}

fn primitive_value(token: &str, primitive: PrimitiveType, name: &str) -> Result<Value, String> {
    let invalid = || format!("{name} '{token}' is not a valid {primitive}");
    match primitive {
        PrimitiveType::Int => token.parse::<i64>().map(Value::from).map_err(|_| invalid()),
        PrimitiveType::Double => finite(token).map(Value::from).ok_or_else(invalid),
        PrimitiveType::Bool => match token {
            "true" | "True" | "TRUE" | "1" => Ok(Value::Bool(true)),
            "false" | "False" | "FALSE" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        PrimitiveType::String | PrimitiveType::Path => Ok(Value::from(token)),
    }
}

fn write_keywords(f: &mut fmt::Formatter<'_>, values: &Map<String, Value>, lead: bool) -> fmt::Result {
    for (i, (key, value)) in values.iter().enumerate() {
        if lead || i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{key} ")?;
        write_dat(f, value)?;
    }
    Ok(())
}

/// A value as dat tokens: sequences space-separated, floats always with a
/// decimal point or exponent.
fn write_dat(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_dat(f, item)?;
            }
            Ok(())
        }
        Value::String(s) => f.write_str(s),
        Value::Number(n) => match n.as_f64() {
            Some(x) if n.is_f64() => write!(f, "{x:?}"),
            _ => write!(f, "{n}"),
        },
        Value::Bool(b) => write!(f, "{b}"),
        Value::Null => f.write_str("none"),
        Value::Object(_) => f.write_str("{}"),
    }
}

fn join_floats(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:?}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const METADATA: &str = r#"
legacy_element_specs:
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
                - {name: FIBER1, type: vector, value_type: {type: double}, size: 3}
            - name: TET4
              type: group
              specs:
                - {name: TET4, type: vector, value_type: {type: int}, size: 4}
                - {name: MAT, type: int}
legacy_particle_specs:
  type: group
  specs:
    - {name: TYPE, type: string}
    - {name: POS, type: vector, value_type: {type: double}, size: 3}
    - {name: RAD, type: double}
    - {name: RIGID, type: bool}
"#;

    fn specs() -> LegacySpecs {
        fourc_schema::load(METADATA).unwrap().legacy_specs().clone()
    }

    fn tokens(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn test_kind_from_section_name() {
        assert_eq!(LegacyKind::of("NODE COORDS"), Some(LegacyKind::Nodes));
        assert_eq!(LegacyKind::of("STRUCTURE ELEMENTS"), Some(LegacyKind::Elements));
        assert_eq!(LegacyKind::of("DSURF-NODE TOPOLOGY"), Some(LegacyKind::Topology));
        assert_eq!(LegacyKind::of("STRUCTURE DOMAIN"), Some(LegacyKind::Domain));
        assert_eq!(LegacyKind::of("PARTICLES"), Some(LegacyKind::Particles));
        assert_eq!(LegacyKind::of("STRUCTURE KNOTVECTORS"), Some(LegacyKind::KnotVectors));
        assert_eq!(LegacyKind::of("TITLE"), None);
    }

    #[test]
    fn test_node_lines() {
        let node: Node = "NODE 1 COORD 0.0 0.5 -1.0".parse().unwrap();
        assert_eq!(node.kind, NodeKind::Node);
        assert_eq!(node.id, 1);
        assert_eq!(node.coord, [0.0, 0.5, -1.0]);
        assert_eq!(node.to_string(), "NODE 1 COORD 0.0 0.5 -1.0");

        let cp: Node = "CP   7 COORD 1.0 2.0 3.0   0.75".parse().unwrap();
        assert_eq!(cp.kind, NodeKind::ControlPoint);
        assert_eq!(cp.coord.len(), 4);
        assert_eq!(tokens(&cp.to_string()), tokens("CP 7 COORD 1.0 2.0 3.0 0.75"));

        let line = "FNODE 3 COORD 0.0 0.0 0.0 FIBER1 1.0 0.0 0.0 CIR 0.0 1.0 0.0 HELIX 0.5";
        let fnode: Node = line.parse().unwrap();
        assert_eq!(fnode.fibers.len(), 3);
        assert_eq!(fnode.fibers[2].name, "HELIX");
        assert_eq!(fnode.to_string(), line);
    }

    #[test]
    fn test_bad_node_lines() {
        for (line, reason) in [
            ("ELE 1 COORD 0.0", "unknown node type 'ELE'"),
            ("NODE x COORD 0.0", "node id 'x' is not an integer"),
            ("NODE 1 POS 0.0", "expected 'COORD', found 'POS'"),
            ("NODE 1 COORD", "missing coordinates"),
            ("FNODE 1 COORD 0.0 FIBER1", "'FIBER1' has no values"),
        ] {
            assert_eq!(line.parse::<Node>().unwrap_err(), reason, "{line}");
        }
    }

    #[test]
    fn test_element_read_and_write() {
        let specs = specs();
        let line = "42   SOLID  HEX8 1 2 3 4 5 6 7 8 MAT 1 KINEM nonlinear FIBER1 1.0 0.0 0.0";
        let element = Element::read(line, &specs).unwrap();
        assert_eq!(element.id, 42);
        assert_eq!(element.cell.cell_type, "HEX8");
        assert_eq!(element.cell.connectivity, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(element.data.element_type, "SOLID");
        assert_eq!(element.data.parameters["MAT"], json!(1));
        assert_eq!(element.data.parameters["FIBER1"], json!([1.0, 0.0, 0.0]));
        assert_eq!(tokens(&element.to_string()), tokens(line));

        assert_eq!(
            serde_json::to_value(&element).unwrap(),
            json!({
                "id": 42,
                "cell": {"type": "HEX8", "connectivity": [1, 2, 3, 4, 5, 6, 7, 8]},
                "data": {"type": "SOLID", "MAT": 1, "KINEM": "nonlinear", "FIBER1": [1.0, 0.0, 0.0]},
            })
        );

        let tet = Element::read("1 SOLID TET4 1 2 3 4", &specs).unwrap();
        assert!(tet.data.parameters.is_empty());
        assert_eq!(tet.to_string(), "1 SOLID TET4 1 2 3 4");
    }

    #[test]
    fn test_bad_element_lines() {
        let specs = specs();
        for (line, reason) in [
            ("1 FLUID HEX8 1", "unknown element type 'FLUID'"),
            ("1 SOLID WEDGE6 1", "element type 'SOLID' has no cell type 'WEDGE6'"),
            ("1 SOLID TET4 1 2 3", "missing node id"),
            ("1 SOLID TET4 1 2 3 4 MAT", "missing MAT (SOLID TET4)"),
            ("1 SOLID TET4 1 2 3 4 KINEM linear", "unknown parameter 'KINEM' (SOLID TET4)"),
            (
                "1 SOLID HEX8 1 2 3 4 5 6 7 8 KINEM fast",
                "KINEM 'fast' is not one of [linear, nonlinear] (SOLID HEX8)",
            ),
            ("1 SOLID TET4 1 2 3 4 MAT 1.5", "MAT '1.5' is not a valid int (SOLID TET4)"),
            ("1 SOLID TET4 1 2 3 4 MAT 1 MAT 2", "parameter 'MAT' given twice (SOLID TET4)"),
        ] {
            assert_eq!(Element::read(line, &specs).unwrap_err(), reason, "{line}");
        }
    }

    #[test]
    fn test_topology_lines() {
        for line in [
            "NODE 1 DNODE 1",
            "CORNER box x- y+ z- DNODE 2",
            "EDGE box x+ z- DLINE 3",
            "SIDE box y- DSURFACE 4",
            "VOLUME box DVOL 1",
        ] {
            let entry: TopologyEntry = line.parse().unwrap_or_else(|e| panic!("{line}: {e}"));
            assert_eq!(entry.to_string(), line);
        }
        let corner: TopologyEntry = "CORNER box x- y+ z- DNODE 2".parse().unwrap();
        assert_eq!(
            serde_json::to_value(&corner).unwrap(),
            json!({
                "type": "CORNER",
                "discretization_type": "box",
                "corner_description": ["x-", "y+", "z-"],
                "d_type": "DNODE",
                "d_id": 2,
            })
        );
        assert_eq!(
            "SIDE box w- DSURFACE 4".parse::<TopologyEntry>().unwrap_err(),
            "'w-' is not one of x-, x+, y-, y+, z-, z+"
        );
        assert!("NODE 1 DNODE 1 extra".parse::<TopologyEntry>().is_err());
        assert!("FACE box DSURF 1".parse::<TopologyEntry>().is_err());
    }

    #[test]
    fn test_particle_lines() {
        let specs = specs();
        let line = "TYPE water POS 0.1 0.2 0.3 RAD 0.5 RIGID true";
        let particle = Particle::read(line, &specs).unwrap();
        assert_eq!(particle.0["POS"], json!([0.1, 0.2, 0.3]));
        assert_eq!(particle.0["RIGID"], json!(true));
        assert_eq!(particle.to_string(), line);
        assert!(Particle::read("TYPE water SPEED 3.0", &specs).is_err());
    }

    #[test]
    fn test_domain_lines() {
        let lines: Vec<String> = [
            "LOWER_BOUND 0.0 0.0 0.0",
            "UPPER_BOUND 1.0 2.0 3.0",
            "INTERVALS 4 8 12",
            "ELEMENTS SOLID HEX8 MAT 1 KINEM nonlinear",
            "PARTITION structured",
        ]
        .map(String::from)
        .into();
        let section =
            LegacySection::read(LegacyKind::Domain, "STRUCTURE DOMAIN", &lines, &specs()).unwrap();
        let LegacySection::Domain(domain) = &section else {
            panic!("{section:?}");
        };
        assert_eq!(domain.intervals, Some([4, 8, 12]));
        assert_eq!(domain.rotation, None);
        assert_eq!(domain.elements.as_deref().map(<[String]>::len), Some(5));
        assert_eq!(domain.partition, Some(Partition::Structured));
        assert_eq!(section.to_lines(), lines);
    }

    #[test]
    fn test_knot_vector_lines() {
        let lines: Vec<String> = [
            "NURBS_DIMENSION 2",
            "BEGIN NURBSPATCH",
            "ID 1",
            "NUMKNOTS 4",
            "DEGREE 1",
            "TYPE Interpolated",
            "0.0",
            "0.0",
            "1.0",
            "1.0",
            "NUMKNOTS 3",
            "DEGREE 0",
            "TYPE Periodic",
            "0.0",
            "0.5",
            "1.0",
            "END NURBSPATCH",
        ]
        .map(String::from)
        .into();
        let section =
            LegacySection::read(LegacyKind::KnotVectors, "KNOTVECTORS", &lines, &specs()).unwrap();
        let LegacySection::KnotVectors(patches) = &section else {
            panic!("{section:?}");
        };
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].knot_vectors[1].knot_type, KnotType::Periodic);
        assert_eq!(patches[0].knot_vectors[1].knots, [0.0, 0.5, 1.0]);
        assert_eq!(section.to_lines(), lines);
    }

    #[test]
    fn test_knot_vector_dimension_is_checked() {
        let lines: Vec<String> = [
            "NURBS_DIMENSION 2",
            "BEGIN NURBSPATCH",
            "ID 1",
            "NUMKNOTS 2",
            "DEGREE 0",
            "TYPE Interpolated",
            "0.0",
            "1.0",
            "END NURBSPATCH",
        ]
        .map(String::from)
        .into();
        let err = LegacySection::read(LegacyKind::KnotVectors, "KNOTVECTORS", &lines, &specs())
            .unwrap_err();
        assert_eq!(err.line, 9);
        assert_eq!(err.reason, "expected 2 knot vectors, got 1");
    }

    #[test]
    fn test_section_errors_name_the_line() {
        let lines: Vec<String> = ["NODE 1 COORD 0.0 0.0 0.0", "", "NODE two COORD 1.0"]
            .map(String::from)
            .into();
        let err = LegacySection::read(LegacyKind::Nodes, "NODE COORDS", &lines, &specs())
            .unwrap_err();
        assert_eq!(err.section, "NODE COORDS");
        assert_eq!(err.line, 3);
        assert_eq!(
            err.to_string(),
            "line 3 of legacy section 'NODE COORDS': node id 'two' is not an integer"
        );
    }
}
