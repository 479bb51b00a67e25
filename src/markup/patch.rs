//! Applying rendered-view edits back onto the raw text
//!
//! An edit made inside a rendered text run is expressed as "replace this
//! run's span with this text". The patcher escapes the new text, splices it
//! into the raw source and records where the cursor should land once the
//! document has been reparsed.

use log::debug;

use super::index::{OffsetIndex, Span};
use crate::error::{Error, Result};
use crate::string_utils::{escape_markup, escaped_len_before};

// ─────────────────────────────────────────────────────────────────────────────
// Focus Intent
// ─────────────────────────────────────────────────────────────────────────────

/// Where the cursor should go after the next parse.
///
/// Holds a source offset rather than a reference into the old tree, since
/// ids do not survive a reparse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusIntent {
    /// Id of the edited run in the tree the edit was made against
    pub run_id: usize,
    /// Absolute source offset of the cursor in the new raw text
    pub offset: usize,
}

impl FocusIntent {
    /// Find the run occupying the intent's position in a fresh index.
    ///
    /// Returns `(run_id, cursor offset within the run content)`, or `None`
    /// when no run sits there any more.
    pub fn resolve(&self, index: &OffsetIndex) -> Option<(usize, usize)> {
        let resolved = index.run_for_caret(self.offset).and_then(|id| {
            let span = index.span_of(id)?;
            let content_len = index.run_content(id)?.len();
            let local = self.offset.checked_sub(span.start)?;
            (local <= content_len).then_some((id, local))
        });

        if resolved.is_none() {
            debug!(
                "Dropping focus intent for run {} at offset {}",
                self.run_id, self.offset
            );
        }
        resolved
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Patch
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a run replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// The full revised raw text
    pub text: String,
    /// The span that was replaced, in the old text
    pub replaced: Span,
    /// Length of the inserted (escaped) text
    pub inserted_len: usize,
    pub focus: FocusIntent,
}

impl Patch {
    /// Byte length change applied to every offset after the edit.
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.replaced.len() as isize
    }
}

/// Replace a text run's exact `[start, end)` span with new content.
///
/// `cursor` is a byte offset into `new_content` (unescaped); it is carried
/// through escaping into the focus intent.
///
/// # Errors
///
/// Returns `Error::UnknownRun` if `run_id` is not a run of `index`, or if the
/// run's span does not fit `raw` (the index was built from other text).
pub fn replace_run(
    raw: &str,
    index: &OffsetIndex,
    run_id: usize,
    new_content: &str,
    cursor: usize,
) -> Result<Patch> {
    if !index.is_run(run_id) {
        return Err(Error::UnknownRun(run_id));
    }
    let span = index.span_of(run_id).ok_or(Error::UnknownRun(run_id))?;
    if span.end > raw.len() || !raw.is_char_boundary(span.start) || !raw.is_char_boundary(span.end)
    {
        return Err(Error::UnknownRun(run_id));
    }

    let escaped = escape_markup(new_content);
    let mut text = String::with_capacity(raw.len() - span.len() + escaped.len());
    text.push_str(&raw[..span.start]);
    text.push_str(&escaped);
    text.push_str(&raw[span.end..]);

    let focus = FocusIntent {
        run_id,
        offset: span.start + escaped_len_before(new_content, cursor),
    };

    debug!(
        "Replaced run {} at {}..{} with {} bytes",
        run_id,
        span.start,
        span.end,
        escaped.len()
    );

    Ok(Patch {
        text,
        replaced: span,
        inserted_len: escaped.len(),
        focus,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parser::{parse_document, Child, Document, Node};

    const WELCOME: &str = r#"<article><title>Welcome</title><para>Hi <emphasis role="bold">there</emphasis></para></article>"#;

    fn parsed(text: &str) -> (Document, OffsetIndex) {
        let doc = parse_document(text).unwrap();
        let index = OffsetIndex::build(&doc);
        (doc, index)
    }

    fn run_id_with(doc: &Document, content: &str) -> usize {
        doc.root
            .runs()
            .into_iter()
            .find(|r| r.content == content)
            .map(|r| r.id)
            .unwrap()
    }

    fn spans(node: &Node, out: &mut Vec<(usize, usize)>) {
        out.push((node.start, node.end));
        for child in &node.children {
            match child {
                Child::Node(n) => spans(n, out),
                Child::Run(r) => out.push((r.start, r.end)),
            }
        }
    }

    #[test]
    fn test_replace_run_changes_only_its_span() {
        let (doc, index) = parsed(WELCOME);
        let hi = run_id_with(&doc, "Hi ");
        let patch = replace_run(WELCOME, &index, hi, "Hello ", 5).unwrap();

        let hi_start = WELCOME.find("Hi ").unwrap();
        assert_eq!(&patch.text[..hi_start], &WELCOME[..hi_start]);
        assert_eq!(&patch.text[hi_start..hi_start + 6], "Hello ");
        assert_eq!(&patch.text[hi_start + 6..], &WELCOME[hi_start + 3..]);
        assert_eq!(patch.delta(), 3);
    }

    #[test]
    fn test_reparse_shifts_later_spans_only() {
        let (doc, index) = parsed(WELCOME);
        let hi = run_id_with(&doc, "Hi ");
        let edit_point = index.span_of(hi).unwrap().start;
        let patch = replace_run(WELCOME, &index, hi, "Hello ", 0).unwrap();

        let (new_doc, _) = parsed(&patch.text);
        let hello = new_doc
            .root
            .runs()
            .into_iter()
            .find(|r| r.content == "Hello ")
            .cloned()
            .unwrap();
        assert_eq!(hello.start, edit_point);

        let mut before = Vec::new();
        let mut after = Vec::new();
        spans(&doc.root, &mut before);
        spans(&new_doc.root, &mut after);
        assert_eq!(before.len(), after.len());

        let delta = patch.delta();
        for ((old_start, old_end), (new_start, new_end)) in before.into_iter().zip(after) {
            let shift = |offset: usize| {
                if offset > edit_point {
                    (offset as isize + delta) as usize
                } else {
                    offset
                }
            };
            assert_eq!(new_start, shift(old_start));
            assert_eq!(new_end, shift(old_end));
        }
    }

    #[test]
    fn test_new_content_is_escaped() {
        let (doc, index) = parsed(WELCOME);
        let hi = run_id_with(&doc, "Hi ");
        let patch = replace_run(WELCOME, &index, hi, "a<b & c ", 8).unwrap();
        assert!(patch.text.contains("a&lt;b &amp; c <emphasis"));
        assert!(parse_document(&patch.text).is_ok());
        // Cursor at the end of the unescaped text lands at the end of the escaped text
        assert_eq!(patch.focus.offset, patch.replaced.start + patch.inserted_len);
    }

    #[test]
    fn test_focus_intent_resolves_after_reparse() {
        let (doc, index) = parsed(WELCOME);
        let there = run_id_with(&doc, "there");
        let patch = replace_run(WELCOME, &index, there, "everyone", 3).unwrap();

        let (new_doc, new_index) = parsed(&patch.text);
        let (run_id, local) = patch.focus.resolve(&new_index).unwrap();
        assert_eq!(new_index.run_content(run_id), Some("everyone"));
        assert_eq!(local, 3);
        assert!(new_doc.root.find_run(run_id).is_some());
    }

    #[test]
    fn test_focus_intent_dropped_when_run_gone() {
        let (doc, index) = parsed(WELCOME);
        let there = run_id_with(&doc, "there");
        let patch = replace_run(WELCOME, &index, there, "", 0).unwrap();

        // The emphasis is now empty, so no run sits at the old position
        let (_, new_index) = parsed(&patch.text);
        assert_eq!(patch.focus.resolve(&new_index), None);
    }

    #[test]
    fn test_unknown_run() {
        let (doc, index) = parsed(WELCOME);
        assert!(matches!(
            replace_run(WELCOME, &index, doc.root.id, "x", 0),
            Err(Error::UnknownRun(0))
        ));
        assert!(matches!(
            replace_run(WELCOME, &index, 999, "x", 0),
            Err(Error::UnknownRun(999))
        ));
        let hi = run_id_with(&doc, "Hi ");
        assert!(replace_run("short", &index, hi, "x", 0).is_err());
    }
}
