//! Bidirectional sync between the raw editor and the rendered preview
//!
//! This module keeps the two views pointed at the same place in the document:
//!
//! - Editor caret moves resolve to a run/node in the preview, which is
//!   scrolled into view and gets the word under the caret highlighted
//! - Preview clicks resolve to a source offset, which becomes the editor
//!   caret
//! - The target is placed at the same fraction of the other viewport as the
//!   event had in its own viewport (the two views have different heights)
//! - Feedback loop prevention via a sync source token and a debounce
//! - Optional eased scroll animation toward the aligned position
//!
//! # Usage
//!
//! ```ignore
//! let mut sync = SyncController::new();
//!
//! // Caret moved in the editor
//! if let Some(command) = sync.on_editor_event(&index, &event) {
//!     let target_y = preview.y_of(command.target_id());
//!     let offset = sync.align_to(preview.scroll, target_y, &preview.metrics);
//! }
//! ```

use std::time::{Duration, Instant};

use log::trace;

use crate::markup::{Location, OffsetIndex, Span};
use crate::string_utils::line_of_offset;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for sync behavior.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Debounce duration for cross-view events (default: 16ms for ~60fps)
    pub debounce_duration: Duration,
    /// Whether to use smooth animated scrolling
    pub smooth_scrolling: bool,
    /// Animation duration for smooth scrolling (in seconds)
    pub animation_duration: f32,
    /// Whether editor events highlight the word under the caret
    pub highlight_words: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(16),
            smooth_scrolling: true,
            animation_duration: 0.15,
            highlight_words: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Which view produced the last position event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    /// The raw text editor
    Editor,
    /// The rendered preview
    Preview,
    /// No active source (idle state)
    None,
}

/// Scroll geometry of one view, in that view's own pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportMetrics {
    /// Current vertical scroll offset
    pub scroll_offset: f32,
    /// Visible height
    pub viewport_height: f32,
    /// Total content height
    pub content_height: f32,
}

impl ViewportMetrics {
    pub fn new(scroll_offset: f32, viewport_height: f32, content_height: f32) -> Self {
        Self {
            scroll_offset,
            viewport_height,
            content_height,
        }
    }

    /// Normalized position (0..1) of a content-space `y` within the viewport.
    pub fn fraction_of(&self, y: f32) -> f32 {
        if self.viewport_height <= 0.0 {
            return 0.0;
        }
        ((y - self.scroll_offset) / self.viewport_height).clamp(0.0, 1.0)
    }

    /// Scroll offset that puts content-space `target_y` at `fraction` of the
    /// viewport, clamped to the scrollable range.
    pub fn scroll_offset_for(&self, target_y: f32, fraction: f32) -> f32 {
        let max_scroll = (self.content_height - self.viewport_height).max(0.0);
        (target_y - fraction.clamp(0.0, 1.0) * self.viewport_height).clamp(0.0, max_scroll)
    }
}

/// The caret moved in the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorEvent {
    /// Caret byte offset in the raw text
    pub offset: usize,
    /// Caret y in editor content space
    pub caret_y: f32,
    pub viewport: ViewportMetrics,
}

/// The user clicked inside a rendered text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewEvent {
    /// Run the click landed in
    pub run_id: usize,
    /// Byte offset of the click within the run's content
    pub local_offset: usize,
    /// Click y in preview content space
    pub click_y: f32,
    pub viewport: ViewportMetrics,
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// What the other view should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncTarget {
    /// Scroll the preview to a run/node, optionally highlighting a word
    Preview {
        location: Location,
        highlight: Option<Span>,
    },
    /// Place the editor caret marker at a source offset
    Editor { cursor: usize, line: usize },
}

/// Instruction for the view that did not produce the event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncCommand {
    pub source: SyncSource,
    /// Canonical source offset the event resolved to
    pub offset: usize,
    /// Normalized vertical position of the event in its own view
    pub fraction: f32,
    pub target: SyncTarget,
}

impl SyncCommand {
    /// Scroll offset for the target view once it knows where the target is.
    pub fn scroll_offset_for(&self, target_y: f32, viewport: &ViewportMetrics) -> f32 {
        viewport.scroll_offset_for(target_y, self.fraction)
    }

    /// Word span the preview should highlight, if any.
    pub fn highlight(&self) -> Option<Span> {
        match self.target {
            SyncTarget::Preview { highlight, .. } => highlight,
            SyncTarget::Editor { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync Controller
// ─────────────────────────────────────────────────────────────────────────────

/// State machine reconciling the editor and preview.
#[derive(Debug)]
pub struct SyncController {
    /// Whether sync is enabled
    pub enabled: bool,
    /// View that produced the last event
    source: SyncSource,
    /// Normalized vertical position of the last event in its view
    fraction: f32,
    /// Last event time for debouncing
    last_event_time: Option<Instant>,
    /// Configuration settings
    config: SyncConfig,
    /// Target scroll offset for the animated view
    scroll_target: Option<f32>,
    /// Animation start time
    animation_start: Option<Instant>,
    /// Scroll offset the animation started from
    animation_from: f32,
}

impl Default for SyncController {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncController {
    /// Create a new sync controller.
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: SyncConfig) -> Self {
        Self {
            enabled: true,
            source: SyncSource::None,
            fraction: 0.0,
            last_event_time: None,
            config,
            scroll_target: None,
            animation_start: None,
            animation_from: 0.0,
        }
    }

    /// Set whether sync is enabled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear_animation();
        }
    }

    /// Toggle sync on/off.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    pub fn source(&self) -> SyncSource {
        self.source
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Source Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if an event from `source` should drive the other view.
    ///
    /// Same-source events always pass; a switch of source has to wait out the
    /// debounce so that the view we just moved cannot bounce back.
    pub fn should_sync_from(&self, source: SyncSource) -> bool {
        if !self.enabled {
            return false;
        }

        if self.source == SyncSource::None || self.source == source {
            return true;
        }

        match self.last_event_time {
            Some(last_time) => last_time.elapsed() >= self.config.debounce_duration * 3,
            None => true,
        }
    }

    /// Record an event from `source` at normalized position `fraction`.
    pub fn mark_event(&mut self, source: SyncSource, fraction: f32) {
        self.source = source;
        self.fraction = fraction.clamp(0.0, 1.0);
        self.last_event_time = Some(Instant::now());
    }

    /// Clear the sync source once the debounce has passed.
    pub fn clear_source(&mut self) {
        if let Some(last_time) = self.last_event_time {
            if last_time.elapsed() >= self.config.debounce_duration * 2 {
                self.source = SyncSource::None;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle a caret move in the editor.
    ///
    /// Resolves the offset to the preview target first, then records the
    /// event. Returns `None` when sync is suppressed or the offset lies
    /// outside the document tree.
    pub fn on_editor_event(
        &mut self,
        index: &OffsetIndex,
        event: &EditorEvent,
    ) -> Option<SyncCommand> {
        if !self.should_sync_from(SyncSource::Editor) {
            return None;
        }

        let location = index.locate(event.offset)?;
        let highlight = if self.config.highlight_words {
            index.snap_to_word(event.offset)
        } else {
            None
        };

        let fraction = event.viewport.fraction_of(event.caret_y);
        self.mark_event(SyncSource::Editor, fraction);
        trace!(
            "Editor offset {} -> preview id {} at fraction {:.2}",
            event.offset,
            location.id(),
            fraction
        );

        Some(SyncCommand {
            source: SyncSource::Editor,
            offset: event.offset,
            fraction: self.fraction,
            target: SyncTarget::Preview {
                location,
                highlight,
            },
        })
    }

    /// Handle a click inside a rendered run.
    ///
    /// `text` is the raw text the index was built from; it is used to find
    /// the caret line for the editor.
    pub fn on_preview_event(
        &mut self,
        index: &OffsetIndex,
        text: &str,
        event: &PreviewEvent,
    ) -> Option<SyncCommand> {
        if !self.should_sync_from(SyncSource::Preview) {
            return None;
        }

        let offset = index.offset_in_run(event.run_id, event.local_offset)?;
        let line = line_of_offset(text, offset);

        let fraction = event.viewport.fraction_of(event.click_y);
        self.mark_event(SyncSource::Preview, fraction);
        trace!(
            "Preview run {} -> editor offset {} (line {}) at fraction {:.2}",
            event.run_id,
            offset,
            line,
            fraction
        );

        Some(SyncCommand {
            source: SyncSource::Preview,
            offset,
            fraction: self.fraction,
            target: SyncTarget::Editor {
                cursor: offset,
                line,
            },
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Alignment & Animation
    // ─────────────────────────────────────────────────────────────────────────

    /// Editor content-space y of a 1-indexed line.
    pub fn line_to_editor_y(line: usize, line_height: f32) -> f32 {
        (line.saturating_sub(1) as f32) * line_height
    }

    /// Align the target view: compute where it should scroll so `target_y`
    /// sits at the last event's fraction, and start animating toward it.
    ///
    /// Returns the final scroll offset.
    pub fn align_to(&mut self, current_offset: f32, target_y: f32, viewport: &ViewportMetrics) -> f32 {
        let target = viewport.scroll_offset_for(target_y, self.fraction);
        self.scroll_target = Some(target);
        self.animation_from = current_offset;
        self.animation_start = self.config.smooth_scrolling.then(Instant::now);
        target
    }

    /// Get the current animated scroll offset (or None if no animation).
    pub fn animated_offset(&mut self) -> Option<f32> {
        let target = self.scroll_target?;

        if !self.config.smooth_scrolling {
            self.scroll_target = None;
            return Some(target);
        }

        let start_time = self.animation_start?;
        let elapsed = start_time.elapsed().as_secs_f32();
        let progress = if self.config.animation_duration <= 0.0 {
            1.0
        } else {
            (elapsed / self.config.animation_duration).min(1.0)
        };

        if progress >= 1.0 {
            self.scroll_target = None;
            self.animation_start = None;
            return Some(target);
        }

        // Ease-out quad
        let eased = 1.0 - (1.0 - progress).powi(2);
        Some(self.animation_from + (target - self.animation_from) * eased)
    }

    /// Check if an animation is currently running.
    pub fn is_animating(&self) -> bool {
        self.scroll_target.is_some()
    }

    /// Clear any pending animation.
    pub fn clear_animation(&mut self) {
        self.scroll_target = None;
        self.animation_start = None;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_document;

    const TEXT: &str = "<article>\n<title>Welcome</title>\n<para>Hi <emphasis role=\"bold\">there friend</emphasis></para>\n</article>";

    fn index() -> OffsetIndex {
        OffsetIndex::build(&parse_document(TEXT).unwrap())
    }

    fn instant_config() -> SyncConfig {
        SyncConfig {
            debounce_duration: Duration::ZERO,
            smooth_scrolling: false,
            ..SyncConfig::default()
        }
    }

    fn viewport() -> ViewportMetrics {
        ViewportMetrics::new(100.0, 200.0, 1000.0)
    }

    #[test]
    fn test_new_controller() {
        let sync = SyncController::new();
        assert!(sync.enabled);
        assert_eq!(sync.source(), SyncSource::None);
        assert!(!sync.is_animating());
    }

    #[test]
    fn test_toggle() {
        let mut sync = SyncController::new();
        assert!(!sync.toggle());
        assert!(!sync.should_sync_from(SyncSource::Editor));
        assert!(sync.toggle());
    }

    #[test]
    fn test_viewport_fraction() {
        let vp = viewport();
        assert_eq!(vp.fraction_of(100.0), 0.0);
        assert_eq!(vp.fraction_of(150.0), 0.25);
        assert_eq!(vp.fraction_of(300.0), 1.0);
        assert_eq!(vp.fraction_of(900.0), 1.0);
        assert_eq!(ViewportMetrics::new(0.0, 0.0, 0.0).fraction_of(5.0), 0.0);
    }

    #[test]
    fn test_scroll_offset_for_keeps_fraction() {
        let vp = ViewportMetrics::new(0.0, 400.0, 2000.0);
        // Target at y=1000 shown a quarter of the way down
        assert_eq!(vp.scroll_offset_for(1000.0, 0.25), 900.0);
        // Clamped at the top and the bottom
        assert_eq!(vp.scroll_offset_for(50.0, 0.5), 0.0);
        assert_eq!(vp.scroll_offset_for(1990.0, 0.0), 1600.0);
    }

    #[test]
    fn test_editor_event_targets_preview_with_highlight() {
        let index = index();
        let mut sync = SyncController::with_config(instant_config());
        let offset = TEXT.find("friend").unwrap() + 2;
        let event = EditorEvent {
            offset,
            caret_y: 150.0,
            viewport: viewport(),
        };

        let command = sync.on_editor_event(&index, &event).unwrap();
        assert_eq!(command.source, SyncSource::Editor);
        assert_eq!(command.fraction, 0.25);
        assert_eq!(sync.source(), SyncSource::Editor);

        match command.target {
            SyncTarget::Preview {
                location: Location::Run { id, .. },
                highlight: Some(word),
            } => {
                assert_eq!(index.run_content(id), Some("there friend"));
                assert_eq!(&TEXT[word.start..word.end], "friend");
            }
            other => panic!("Unexpected target {:?}", other),
        }
    }

    #[test]
    fn test_editor_event_without_word_highlight() {
        let index = index();
        let mut sync = SyncController::with_config(SyncConfig {
            highlight_words: false,
            ..instant_config()
        });
        let event = EditorEvent {
            offset: TEXT.find("Welcome").unwrap(),
            caret_y: 0.0,
            viewport: ViewportMetrics::default(),
        };
        let command = sync.on_editor_event(&index, &event).unwrap();
        assert_eq!(command.highlight(), None);
    }

    #[test]
    fn test_editor_event_outside_tree() {
        let index = OffsetIndex::build(&parse_document("<para>x</para>   ").unwrap());
        let mut sync = SyncController::with_config(instant_config());
        let event = EditorEvent {
            offset: 16,
            caret_y: 0.0,
            viewport: viewport(),
        };
        assert!(sync.on_editor_event(&index, &event).is_none());
        assert_eq!(sync.source(), SyncSource::None);
    }

    #[test]
    fn test_preview_event_targets_editor_caret() {
        let index = index();
        let mut sync = SyncController::with_config(instant_config());
        let run_id = index.run_at(TEXT.find("there").unwrap()).unwrap();
        let event = PreviewEvent {
            run_id,
            local_offset: 6,
            click_y: 200.0,
            viewport: viewport(),
        };

        let command = sync.on_preview_event(&index, TEXT, &event).unwrap();
        let expected = TEXT.find("friend").unwrap();
        assert_eq!(command.offset, expected);
        assert_eq!(command.fraction, 0.5);
        assert_eq!(
            command.target,
            SyncTarget::Editor {
                cursor: expected,
                line: 3
            }
        );
        // The editor only gets a caret marker
        assert_eq!(command.highlight(), None);
    }

    #[test]
    fn test_preview_event_unknown_run() {
        let index = index();
        let mut sync = SyncController::with_config(instant_config());
        let event = PreviewEvent {
            run_id: 0,
            local_offset: 0,
            click_y: 0.0,
            viewport: viewport(),
        };
        assert!(sync.on_preview_event(&index, TEXT, &event).is_none());
    }

    #[test]
    fn test_cross_source_is_debounced() {
        let index = index();
        let mut sync = SyncController::with_config(SyncConfig {
            debounce_duration: Duration::from_secs(60),
            ..SyncConfig::default()
        });
        let editor = EditorEvent {
            offset: TEXT.find("Welcome").unwrap(),
            caret_y: 0.0,
            viewport: viewport(),
        };
        assert!(sync.on_editor_event(&index, &editor).is_some());
        // Same source continues immediately
        assert!(sync.on_editor_event(&index, &editor).is_some());

        let run_id = index.run_at(editor.offset).unwrap();
        let click = PreviewEvent {
            run_id,
            local_offset: 0,
            click_y: 0.0,
            viewport: viewport(),
        };
        assert!(sync.on_preview_event(&index, TEXT, &click).is_none());
    }

    #[test]
    fn test_align_without_animation() {
        let mut sync = SyncController::with_config(instant_config());
        sync.mark_event(SyncSource::Editor, 0.5);
        let vp = ViewportMetrics::new(0.0, 200.0, 2000.0);

        let target = sync.align_to(0.0, 700.0, &vp);
        assert_eq!(target, 600.0);
        assert!(sync.is_animating());
        assert_eq!(sync.animated_offset(), Some(600.0));
        assert!(!sync.is_animating());
        assert_eq!(sync.animated_offset(), None);
    }

    #[test]
    fn test_align_with_animation_moves_toward_target() {
        let mut sync = SyncController::with_config(SyncConfig {
            animation_duration: 60.0,
            ..SyncConfig::default()
        });
        sync.mark_event(SyncSource::Preview, 0.0);
        let vp = ViewportMetrics::new(0.0, 100.0, 1000.0);

        sync.align_to(0.0, 500.0, &vp);
        let current = sync.animated_offset().unwrap();
        assert!((0.0..=500.0).contains(&current));
        assert!(sync.is_animating());

        sync.clear_animation();
        assert!(!sync.is_animating());
    }

    #[test]
    fn test_line_to_editor_y() {
        assert_eq!(SyncController::line_to_editor_y(1, 20.0), 0.0);
        assert_eq!(SyncController::line_to_editor_y(5, 20.0), 80.0);
    }
}
