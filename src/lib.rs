//! docsync - offset-preserving markup parsing with editor/preview sync
//!
//! Parses a constrained DocBook-like vocabulary into a tree where every node
//! and text run knows its exact byte span in the source, then uses those spans
//! to keep a raw text editor and a rendered preview pointed at the same place
//! and to apply rendered-view edits back onto the raw text.

pub mod config;
pub mod error;
pub mod export;
pub mod markup;
pub mod preview;
pub mod session;
pub mod string_utils;

pub use error::{Error, Result};
pub use session::{DocumentSession, EditCommand};
