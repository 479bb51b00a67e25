//! Offset queries over a parsed document
//!
//! `OffsetIndex` flattens a tree into per-id entries so that position lookups
//! do not have to walk the tree. It is built once per parse and never
//! mutated afterwards.

use super::parser::{Child, Document, Node};
use crate::string_utils::{floor_char_boundary, word_range_at};

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Half-open byte range `[start, end)` in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check if an offset falls within `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a forward lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// The offset is inside a text run
    Run { id: usize, span: Span },
    /// No run contains the offset; the innermost element's content bounds
    Node { id: usize, content: Span },
}

impl Location {
    pub fn id(&self) -> usize {
        match self {
            Location::Run { id, .. } | Location::Node { id, .. } => *id,
        }
    }

    /// The range a view should treat as the target.
    pub fn span(&self) -> Span {
        match self {
            Location::Run { span, .. } => *span,
            Location::Node { content, .. } => *content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Node {
        span: Span,
        content: Span,
        depth: usize,
    },
    Run {
        span: Span,
        content: String,
        depth: usize,
    },
}

impl Entry {
    fn span(&self) -> Span {
        match self {
            Entry::Node { span, .. } | Entry::Run { span, .. } => *span,
        }
    }
}

/// Read-only position index for one parse.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetIndex {
    /// Entries indexed by id; ids are dense within one parse
    entries: Vec<Option<Entry>>,
    /// Run ids in document order
    run_order: Vec<usize>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

impl OffsetIndex {
    /// Index every node and run of a document.
    pub fn build(document: &Document) -> Self {
        let mut index = Self {
            entries: vec![None; document.id_count],
            run_order: Vec::new(),
        };
        index.visit(&document.root, 0);
        index
    }

    fn visit(&mut self, node: &Node, depth: usize) {
        self.store(
            node.id,
            Entry::Node {
                span: Span::new(node.start, node.end),
                content: Span::new(node.content_start, node.content_end),
                depth,
            },
        );
        for child in &node.children {
            match child {
                Child::Node(inner) => self.visit(inner, depth + 1),
                Child::Run(run) => {
                    self.store(
                        run.id,
                        Entry::Run {
                            span: Span::new(run.start, run.end),
                            content: run.content.clone(),
                            depth: depth + 1,
                        },
                    );
                    self.run_order.push(run.id);
                }
            }
        }
    }

    fn store(&mut self, id: usize, entry: Entry) {
        if id >= self.entries.len() {
            self.entries.resize(id + 1, None);
        }
        self.entries[id] = Some(entry);
    }

    fn entry(&self, id: usize) -> Option<&Entry> {
        self.entries.get(id).and_then(Option::as_ref)
    }

    fn run(&self, id: usize) -> Option<(Span, &str)> {
        match self.entry(id)? {
            Entry::Run { span, content, .. } => Some((*span, content.as_str())),
            Entry::Node { .. } => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Forward lookup: the run containing `offset`, else the innermost node.
    ///
    /// Returns `None` when the offset lies outside the root element.
    pub fn locate(&self, offset: usize) -> Option<Location> {
        if let Some(id) = self.run_at(offset) {
            let span = self.entry(id)?.span();
            return Some(Location::Run { id, span });
        }

        self.entries
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| match entry {
                Some(Entry::Node {
                    span,
                    content,
                    depth,
                }) if span.contains(offset) => Some((id, *content, *depth)),
                _ => None,
            })
            .max_by_key(|(_, _, depth)| *depth)
            .map(|(id, content, _)| Location::Node { id, content })
    }

    /// Id of the deepest run whose `[start, end)` contains `offset`.
    pub fn run_at(&self, offset: usize) -> Option<usize> {
        self.run_order
            .iter()
            .copied()
            .filter_map(|id| match self.entry(id) {
                Some(Entry::Run { span, depth, .. }) if span.contains(offset) => Some((id, *depth)),
                _ => None,
            })
            .max_by_key(|(_, depth)| *depth)
            .map(|(id, _)| id)
    }

    /// Run that a caret at `offset` belongs to.
    ///
    /// Like `run_at`, but a caret sitting right after a run's last content
    /// character still counts as inside that run.
    pub fn run_for_caret(&self, offset: usize) -> Option<usize> {
        self.run_at(offset).or_else(|| {
            self.run_order.iter().copied().find(|&id| {
                self.run(id)
                    .map(|(span, content)| span.start + content.len() == offset)
                    .unwrap_or(false)
            })
        })
    }

    /// Reverse lookup: span of a node or run.
    pub fn span_of(&self, id: usize) -> Option<Span> {
        self.entry(id).map(Entry::span)
    }

    /// Content bounds of a node (for runs, the run span).
    pub fn content_span_of(&self, id: usize) -> Option<Span> {
        match self.entry(id)? {
            Entry::Node { content, .. } => Some(*content),
            Entry::Run { span, .. } => Some(*span),
        }
    }

    /// Literal content of a run.
    pub fn run_content(&self, id: usize) -> Option<&str> {
        self.run(id).map(|(_, content)| content)
    }

    pub fn is_run(&self, id: usize) -> bool {
        self.run(id).is_some()
    }

    /// Run ids in document order.
    pub fn run_ids(&self) -> &[usize] {
        &self.run_order
    }

    /// Convert an offset local to a run's content into a source offset.
    ///
    /// This is the click path from the preview: the renderer knows which run
    /// was hit and where inside its text. Out-of-range offsets clamp to the
    /// end of the content.
    pub fn offset_in_run(&self, id: usize, local: usize) -> Option<usize> {
        let (span, content) = self.run(id)?;
        Some(span.start + floor_char_boundary(content, local))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Word Snapping
    // ─────────────────────────────────────────────────────────────────────────

    /// Expand `offset` to the word around it, never leaving its run.
    ///
    /// The result `[s, e)` satisfies `s <= offset <= e` and is bounded by
    /// word-boundary characters or the run's content edges. Returns `None`
    /// when no run holds the offset or the offset sits between boundaries.
    pub fn snap_to_word(&self, offset: usize) -> Option<Span> {
        let id = self.run_for_caret(offset)?;
        let (span, content) = self.run(id)?;

        let local = offset - span.start;
        if local > content.len() {
            // Inside trailing whitespace the tokenizer trimmed away
            return None;
        }

        let (start, end) = word_range_at(content, local);
        if start == end {
            return None;
        }
        Some(Span::new(span.start + start, span.start + end))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
