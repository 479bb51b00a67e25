//! User settings for docsync
//!
//! This module defines the `Settings` struct and its sections, which control
//! how documents are parsed and how the editor and preview stay in sync.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::markup::{MatchMode, ParseOptions};
use crate::preview::SyncConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Sync Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for editor/preview synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Whether the two views follow each other at all
    pub enabled: bool,

    /// Quiet period before the other view may take over (milliseconds)
    pub debounce_ms: u64,

    /// Whether to animate scrolling toward the aligned position
    pub smooth_scrolling: bool,

    /// Scroll animation duration (in seconds)
    pub animation_duration: f32,

    /// Whether caret moves highlight the word in the preview
    pub highlight_words: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            debounce_ms: 16,
            smooth_scrolling: true,
            animation_duration: 0.15,
            highlight_words: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parser Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the markup parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// How close tags are paired with open tags
    pub match_mode: MatchMode,

    /// Deepest element nesting accepted before parsing fails
    pub max_depth: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            max_depth: ParseOptions::DEFAULT_MAX_DEPTH,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have defaults via the `Default` trait and `#[serde(default)]`, so a
/// partial file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sync: SyncSettings,
    pub parser: ParserSettings,
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Maximum allowed debounce.
    pub const MAX_DEBOUNCE_MS: u64 = 1000;
    /// Maximum allowed animation duration (seconds).
    pub const MAX_ANIMATION_DURATION: f32 = 2.0;
    /// Minimum allowed nesting limit.
    pub const MIN_MAX_DEPTH: usize = 1;
    /// Maximum allowed nesting limit.
    pub const MAX_MAX_DEPTH: usize = ParseOptions::MAX_SUPPORTED_DEPTH;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.sync.debounce_ms = self.sync.debounce_ms.min(Self::MAX_DEBOUNCE_MS);

        // NaN falls back to the default
        if self.sync.animation_duration.is_nan() {
            self.sync.animation_duration = SyncSettings::default().animation_duration;
        }
        self.sync.animation_duration = self
            .sync
            .animation_duration
            .clamp(0.0, Self::MAX_ANIMATION_DURATION);

        self.parser.max_depth = self
            .parser
            .max_depth
            .clamp(Self::MIN_MAX_DEPTH, Self::MAX_MAX_DEPTH);
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Parser options described by these settings.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            match_mode: self.parser.match_mode,
            max_depth: self.parser.max_depth,
        }
    }

    /// Sync controller configuration described by these settings.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            debounce_duration: Duration::from_millis(self.sync.debounce_ms),
            smooth_scrolling: self.sync.smooth_scrolling,
            animation_duration: self.sync.animation_duration,
            highlight_words: self.sync.highlight_words,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
