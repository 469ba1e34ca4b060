//! # fourc-schema — Schema Model & Validation
//!
//! Turns the 4C metadata artifact into an immutable [`SchemaModel`] and
//! checks documents against it.
//!
//! ## Loading (`metadata`)
//!
//! [`load`] and [`load_path`] resolve every reference in the artifact
//! before returning. Loading is all-or-nothing: a half-built schema would
//! silently under-validate every document, so any defect in the artifact
//! is a [`MetadataFormatError`].
//!
//! [`LegacySpecs`] holds the element and particle line layouts that the
//! metadata declares outside the section tree.
//!
//! ## Validation (`validate`)
//!
//! [`validate`] walks a document tree and returns every
//! [`ValidationIssue`] found, never stopping at the first.
//!
//! ## Derived JSON Schema (`json_schema`, `consistency`)
//!
//! [`JsonSchemaCheck`] applies the JSON schema that 4C derives from the
//! same source, and [`audit_section_consistency`] reports sections known
//! to only one of the two artifacts.
//!
//! ## Crate Policy
//!
//! - Depends on `fourc-core` and `fourc-document` internally.
//! - A [`SchemaModel`] has no mutation API after load.
//! - Never fetches schema artifacts over the network.

pub mod consistency;
pub mod error;
pub mod json_schema;
pub mod legacy;
pub mod metadata;
pub mod model;
pub mod validate;

pub use consistency::{audit_section_consistency, SectionFinding, SectionSource};
pub use error::{JsonSchemaError, MetadataFormatError};
pub use json_schema::{JsonSchemaCheck, Violation};
pub use legacy::{CellSpec, LegacySpecs};
pub use metadata::{load, load_path};
pub use model::{EntryKind, MetadataEntry, PrimitiveType, SchemaModel, WILDCARD};
pub use validate::{validate, validate_at, IssueKind, ValidationIssue, ValidationIssues};
