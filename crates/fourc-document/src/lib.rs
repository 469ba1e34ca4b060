//! # fourc-document — Lossless YAML Document Model
//!
//! Parses 4C input files into an order-preserving tree and writes them back
//! without disturbing anything that was not edited.
//!
//! ## Key Design Principles
//!
//! 1. **Round-trip law.** For every text the model can represent,
//!    `serialize(parse(text)) == text`, byte for byte: comments, blank
//!    lines, quoting, number spelling, flow layout and line endings survive.
//!
//! 2. **Tolerant structure.** The parser accepts any well-formed tree
//!    regardless of schema. Duplicate keys are kept in order; deciding
//!    whether they are errors is left to validation.
//!
//! 3. **Explicit refusal.** YAML features the model cannot reproduce
//!    (anchors, aliases, tags, complex keys, multiple documents, multi-line
//!    plain or quoted scalars, mixed line endings) are rejected with
//!    [`SyntaxError::Unsupported`] instead of being silently normalized.
//!    So is nesting deeper than [`parse::MAX_DEPTH`] levels.
//!
//! 4. **Local edits.** `set` overwrites in place and appends new keys at the
//!    end of their mapping; only the edited lines change in the output. A
//!    failed edit changes nothing.
//!
//! ## Crate Policy
//!
//! - Depends only on `fourc-core` internally.
//! - No `unwrap()`/`expect()` outside tests.

pub mod document;
pub mod emit;
pub mod error;
pub mod node;
pub mod parse;
pub mod scalar;

pub use document::Document;
pub use emit::serialize;
pub use error::{DocumentError, SyntaxError};
pub use node::{
    CollectionStyle, Decor, DocumentNode, MapEntry, MappingNode, ScalarNode, ScalarRepr, SeqItem,
    SequenceNode,
};
pub use parse::parse;
pub use scalar::{resolve_plain, Scalar};
