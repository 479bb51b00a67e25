//! Preview and sync module for docsync
//!
//! This module keeps the raw editor and the rendered preview pointed at the
//! same place in the document, in both directions.

mod sync_scroll;

pub use sync_scroll::{
    EditorEvent, PreviewEvent, SyncCommand, SyncConfig, SyncController, SyncSource, SyncTarget,
    ViewportMetrics,
};
