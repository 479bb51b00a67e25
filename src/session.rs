//! Document session: the single source of truth for one open document
//!
//! `DocumentSession` owns the raw text. The tree and offset index are derived
//! from it on every change and never edited directly; edits arrive as
//! `EditCommand`s, position events are forwarded to the sync controller, and
//! a rendered-view edit leaves a pending focus intent for the next frame.

use log::{debug, info};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::export::html;
use crate::markup::{
    extract_outline, parse_document_with_options, replace_run, Document, FocusIntent,
    OffsetIndex, OutlineItem, ParseOptions, Span,
};
use crate::preview::{EditorEvent, PreviewEvent, SyncCommand, SyncController};
use crate::string_utils::{offset_of_line, safe_slice};

/// Maximum undo history size.
const MAX_UNDO_SIZE: usize = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// A change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Replace one text run's content (an edit made in the rendered view).
    ///
    /// `cursor` is a byte offset into `content` where the caret should land
    /// after the reparse.
    ReplaceRun {
        run_id: usize,
        content: String,
        cursor: usize,
    },
    /// Replace the whole raw text (an edit made in the raw editor)
    ReplaceText(String),
}

/// Tree and index derived from the current text.
#[derive(Debug, Clone)]
struct Parsed {
    document: Document,
    index: OffsetIndex,
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime state for one document.
#[derive(Debug)]
pub struct DocumentSession {
    /// Raw markup text
    text: String,
    /// Derived tree and index (None when the text could not be parsed)
    parsed: Option<Parsed>,
    /// Why the last parse failed, for the "could not parse" state
    parse_error: Option<String>,
    options: ParseOptions,
    /// Caret restoration waiting for the next frame
    pending_focus: Option<FocusIntent>,
    sync: SyncController,
    /// Undo history stack
    undo_stack: Vec<String>,
    /// Redo history stack
    redo_stack: Vec<String>,
    /// Incremented on every text change so views know to re-read
    version: u64,
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl DocumentSession {
    /// Create a session with default parser and sync settings.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_parts(text.into(), ParseOptions::default(), SyncController::new())
    }

    /// Create a session configured from user settings.
    pub fn with_settings(text: impl Into<String>, settings: &Settings) -> Self {
        let mut sync = SyncController::with_config(settings.sync_config());
        sync.set_enabled(settings.sync.enabled);
        Self::with_parts(text.into(), settings.parse_options(), sync)
    }

    fn with_parts(text: String, options: ParseOptions, sync: SyncController) -> Self {
        let mut session = Self {
            text,
            parsed: None,
            parse_error: None,
            options,
            pending_focus: None,
            sync,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            version: 0,
        };
        session.reparse();
        session
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The current tree, if the text parsed.
    pub fn document(&self) -> Option<&Document> {
        self.parsed.as_ref().map(|p| &p.document)
    }

    /// The current offset index, if the text parsed.
    pub fn index(&self) -> Option<&OffsetIndex> {
        self.parsed.as_ref().map(|p| &p.index)
    }

    /// Reason the current text could not be parsed.
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed.is_some()
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Change parser options and rebuild the tree.
    pub fn set_options(&mut self, options: ParseOptions) {
        self.options = options;
        self.reparse();
    }

    /// Content version counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncController {
        &mut self.sync
    }

    /// Whether a focus intent is waiting to be taken.
    pub fn has_pending_focus(&self) -> bool {
        self.pending_focus.is_some()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edits
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the raw text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.pending_focus = None;
            self.commit(text);
        }
    }

    /// Apply an edit command.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownRun` when a run edit names an id that is not a
    /// run of the current tree (including when there is no tree).
    pub fn apply(&mut self, command: EditCommand) -> Result<()> {
        match command {
            EditCommand::ReplaceText(text) => {
                self.set_text(text);
                Ok(())
            }
            EditCommand::ReplaceRun {
                run_id,
                content,
                cursor,
            } => {
                let index = self.index().ok_or(Error::UnknownRun(run_id))?;
                let patch = replace_run(&self.text, index, run_id, &content, cursor)?;
                self.commit(patch.text);
                self.pending_focus = Some(patch.focus);
                Ok(())
            }
        }
    }

    /// Consume the pending focus intent.
    ///
    /// Returns `(run_id, cursor offset within the run)` in the current tree.
    /// An intent that no longer resolves is dropped silently.
    pub fn take_focus(&mut self) -> Option<(usize, usize)> {
        let intent = self.pending_focus.take()?;
        match self.index() {
            Some(index) => intent.resolve(index),
            None => {
                debug!("Dropping focus intent: document has no tree");
                None
            }
        }
    }

    fn commit(&mut self, text: String) {
        self.undo_stack.push(std::mem::replace(&mut self.text, text));
        if self.undo_stack.len() > MAX_UNDO_SIZE {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
        self.changed();
    }

    fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.sync.clear_animation();
        self.reparse();
    }

    fn reparse(&mut self) {
        match parse_document_with_options(&self.text, &self.options) {
            Ok(document) => {
                let index = OffsetIndex::build(&document);
                self.parsed = Some(Parsed { document, index });
                self.parse_error = None;
            }
            Err(err) => {
                info!("Document could not be parsed: {}", err);
                self.parsed = None;
                self.parse_error = Some(err.to_string());
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Undo / Redo
    // ─────────────────────────────────────────────────────────────────────────

    /// Undo the last edit.
    ///
    /// Returns `true` if undo was performed.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.redo_stack.push(std::mem::replace(&mut self.text, previous));
                self.pending_focus = None;
                self.changed();
                true
            }
            None => false,
        }
    }

    /// Redo the last undone edit.
    ///
    /// Returns `true` if redo was performed.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push(std::mem::replace(&mut self.text, next));
                self.pending_focus = None;
                self.changed();
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // View Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Forward an editor caret move to the sync controller.
    pub fn on_editor_event(&mut self, event: &EditorEvent) -> Option<SyncCommand> {
        let parsed = self.parsed.as_ref()?;
        self.sync.on_editor_event(&parsed.index, event)
    }

    /// Forward a preview click to the sync controller.
    pub fn on_preview_event(&mut self, event: &PreviewEvent) -> Option<SyncCommand> {
        let parsed = self.parsed.as_ref()?;
        self.sync.on_preview_event(&parsed.index, &self.text, event)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived Views
    // ─────────────────────────────────────────────────────────────────────────

    /// Source text covered by a span, snapped to character boundaries.
    pub fn slice(&self, span: Span) -> &str {
        safe_slice(&self.text, span.start, span.end)
    }

    /// Source offset where a 1-indexed line starts (outline navigation).
    pub fn line_start(&self, line: usize) -> usize {
        offset_of_line(&self.text, line)
    }

    /// Headings of the current tree (empty when unparsed).
    pub fn outline(&self) -> Vec<OutlineItem> {
        self.document()
            .map(|doc| extract_outline(doc, &self.text))
            .unwrap_or_default()
    }

    /// Standalone HTML page for the current state.
    ///
    /// An unparsed document renders the "could not parse" notice.
    pub fn render_html(&self, title: Option<&str>) -> String {
        match (&self.parsed, &self.parse_error) {
            (Some(parsed), _) => html::render_document(&parsed.document, title),
            (None, reason) => html::render_failure_page(
                reason.as_deref().unwrap_or(html::PARSE_FAILURE_NOTICE),
                title,
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
