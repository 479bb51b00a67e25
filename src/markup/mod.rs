//! Markup core: tokenizing, parsing, offset queries and edit patching
//!
//! This module turns raw DocBook-style markup into an offset-annotated tree
//! and answers position questions about it.
//!
//! # Features
//! - Lenient regex-based tokenizer with exact byte offsets
//! - Recursive parser resolving each tag to a presentation variant
//! - Offset index: offset → run/node, id → span, word snapping
//! - Run replacement with cursor re-anchoring after reparse
//!
//! # Example
//! ```ignore
//! use docsync::markup::{parse_document, OffsetIndex, replace_run};
//!
//! let raw = "<para>Hi there</para>";
//! let doc = parse_document(raw)?;
//! let index = OffsetIndex::build(&doc);
//! let word = index.snap_to_word(4); // "there"
//! let run_id = index.run_at(4).unwrap();
//! let patch = replace_run(raw, &index, run_id, "Hello there", 5)?;
//! ```

mod index;
mod outline;
mod parser;
mod patch;
mod tokenizer;
mod variant;

pub use index::{Location, OffsetIndex, Span};
pub use outline::{extract_outline, OutlineItem};
pub use parser::{
    parse_document, parse_document_with_options, parse_tokens, Child, Document, MatchMode, Node,
    ParseOptions, TextRun,
};
pub use patch::{replace_run, FocusIntent, Patch};
pub use tokenizer::{check_well_formed, tokenize, Attributes, Token, TokenKind};
pub use variant::{resolve_variant, HeadingLevel, LinkTarget, Variant};
