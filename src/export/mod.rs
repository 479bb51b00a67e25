//! Document Export Module for docsync
//!
//! This module renders parsed documents to HTML, both as a preview fragment
//! annotated with node and run ids and as a complete standalone page.

pub mod html;

pub use html::{render_document, render_fragment, render_source, render_source_fragment};
