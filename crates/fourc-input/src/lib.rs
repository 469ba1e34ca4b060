//! # fourc-input — Schema-Aware Input Editing
//!
//! The layer users program against: typed reads and writes on documents,
//! and whole-section operations on 4C input files.
//!
//! ## Editor (`editor`, `coerce`)
//!
//! [`Editor`] reads through a [`SchemaModel`](fourc_schema::SchemaModel),
//! filling absent values from their declared defaults, and writes values
//! coerced to their declared type. A coercion that needs a guess fails with
//! [`AccessError::TypeMismatch`] and leaves the document untouched.
//!
//! ## Input Files (`input`)
//!
//! [`InputFile`] binds a document to a shared schema and works in whole
//! sections: get, set, pop, join, split, include handling, header
//! extraction, tolerant comparison, and validated writing.
//!
//! ## Legacy Sections (`legacy`)
//!
//! Mesh sections are lists of whitespace-separated text lines.
//! [`InputFile::legacy_section`] reads one into typed [`LegacySection`]
//! data, and [`InputFile::set_legacy_section`] writes such data back as
//! lines. The document always stores the line form, so writing and
//! validation need no extra step.
//!
//! ## Crate Policy
//!
//! - Depends on `fourc-core`, `fourc-document`, and `fourc-schema`.
//! - Edits never reformat content they do not touch.
//! - No `unwrap()`/`expect()` outside tests.

pub mod coerce;
pub mod editor;
pub mod error;
pub mod input;
pub mod legacy;

pub use coerce::coerce;
pub use editor::Editor;
pub use error::{AccessError, InputError, LegacyError};
pub use input::{DumpOptions, InputFile, INCLUDES_SECTION};
pub use legacy::{LegacyKind, LegacySection};
