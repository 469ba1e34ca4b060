//! # Legacy Line Specs
//!
//! Element and particle lines are keyword text whose layout the metadata
//! declares outside the section tree, under `legacy_element_specs` and
//! `legacy_particle_specs`:
//!
//! ```yaml
//! legacy_element_specs:
//!   type: group
//!   specs:
//!     - name: SOLID            # element type
//!       type: group
//!       specs:
//!         - type: one_of       # one group per cell type
//!           specs:
//!             - name: HEX8
//!               type: group
//!               specs:
//!                 - {name: HEX8, type: vector, value_type: {type: int}, size: 8}
//!                 - {name: MAT, type: int}
//! ```
//!
//! The first entry of a cell group carries the cell type's name and its
//! node count; the rest are the keyword parameters allowed on the line.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::MetadataEntry;

/// Layout of one element line for one cell type.
#[derive(Debug, Clone)]
pub struct CellSpec {
    pub(crate) cell_type: String,
    pub(crate) nodes: usize,
    pub(crate) parameters: Vec<Arc<MetadataEntry>>,
}

impl CellSpec {
    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }

    /// Number of node ids in the connectivity.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Keyword parameters in declaration order.
    pub fn parameters(&self) -> &[Arc<MetadataEntry>] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&MetadataEntry> {
        find(&self.parameters, name)
    }
}

/// Element and particle line layouts.
#[derive(Debug, Clone, Default)]
pub struct LegacySpecs {
    pub(crate) elements: BTreeMap<String, BTreeMap<String, CellSpec>>,
    pub(crate) particle: Vec<Arc<MetadataEntry>>,
}

impl LegacySpecs {
    /// Layout of `element_type` elements with `cell_type` cells.
    pub fn cell(&self, element_type: &str, cell_type: &str) -> Option<&CellSpec> {
        self.elements.get(element_type)?.get(cell_type)
    }

    /// Element types, sorted.
    pub fn element_types(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }

    /// Cell types declared for `element_type`, sorted.
    pub fn cell_types(&self, element_type: &str) -> impl Iterator<Item = &str> {
        self.elements
            .get(element_type)
            .into_iter()
            .flat_map(|cells| cells.keys().map(String::as_str))
    }

    /// Keyword parameters of a particle line.
    pub fn particle_parameters(&self) -> &[Arc<MetadataEntry>] {
        &self.particle
    }

    pub fn particle_parameter(&self, name: &str) -> Option<&MetadataEntry> {
        find(&self.particle, name)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.particle.is_empty()
    }
}

fn find<'a>(entries: &'a [Arc<MetadataEntry>], name: &str) -> Option<&'a MetadataEntry> {
    entries.iter().find(|e| e.name == name).map(Arc::as_ref)
}
