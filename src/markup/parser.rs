//! Offset-preserving markup parser
//!
//! Consumes the token stream recursively and builds a tree of `Node`s and
//! `TextRun`s, each annotated with exact byte offsets into the raw text.
//!
//! Parsing is fail-closed at the top level: a failed well-formedness check,
//! a stream with no opening tag, or nesting past the depth limit yields an
//! error, never a partial tree. Inside the tree it is fail-open: an element
//! without its close tag simply extends to the last token it consumed.
//!
//! # Close-tag matching
//!
//! By default an element ends at the first later close token with the same
//! name, whatever the nesting in between (`MatchMode::ByName`). A title nested
//! inside another title therefore closes the outer one early. The stricter
//! `MatchMode::DepthAware` counts nested opens of the same name instead.

use log::debug;
use serde::{Deserialize, Serialize};

use super::tokenizer::{check_well_formed, tokenize, Attributes, Token, TokenKind};
use super::variant::{resolve_variant, Variant};
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// How an open tag finds its close tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// First later close token with the same name
    #[default]
    ByName,
    /// Close token at the same nesting depth of same-named elements
    DepthAware,
}

/// Configuration options for parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub match_mode: MatchMode,
    /// Deepest allowed element nesting (the root is depth 0). Values above
    /// `MAX_SUPPORTED_DEPTH` are treated as `MAX_SUPPORTED_DEPTH`.
    pub max_depth: usize,
}

impl ParseOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 256;
    /// Hard ceiling on nesting. The builder and every tree walk recurse once
    /// per level, so this keeps them within a 2 MB thread stack.
    pub const MAX_SUPPORTED_DEPTH: usize = 256;

    /// The depth limit actually enforced.
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.min(Self::MAX_SUPPORTED_DEPTH)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree Types
// ─────────────────────────────────────────────────────────────────────────────

/// Leaf text with its exact source offsets.
///
/// `content` is the literal source text; `end - start` can exceed
/// `content.len()` when the tokenizer trimmed the run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub id: usize,
    pub content: String,
    pub start: usize,
    pub end: usize,
}

/// An element of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    Node(Node),
    Run(TextRun),
}

impl Child {
    pub fn id(&self) -> usize {
        match self {
            Child::Node(node) => node.id,
            Child::Run(run) => run.id,
        }
    }

    /// `(start, end)` of the whole child.
    pub fn span(&self) -> (usize, usize) {
        match self {
            Child::Node(node) => (node.start, node.end),
            Child::Run(run) => (run.start, run.end),
        }
    }
}

/// An element with its resolved variant.
///
/// `start..end` covers the tags, `content_start..content_end` only the inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: usize,
    pub tag_name: String,
    pub variant: Variant,
    pub attributes: Attributes,
    pub children: Vec<Child>,
    pub start: usize,
    pub end: usize,
    pub content_start: usize,
    pub content_end: usize,
}

impl Node {
    /// Concatenated content of all descendant runs.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, output: &mut String) {
        for child in &self.children {
            match child {
                Child::Node(node) => node.collect_text(output),
                Child::Run(run) => output.push_str(&run.content),
            }
        }
    }

    /// Depth-first walk over every descendant text run, in document order.
    pub fn runs(&self) -> Vec<&TextRun> {
        let mut runs = Vec::new();
        self.collect_runs(&mut runs);
        runs
    }

    fn collect_runs<'a>(&'a self, output: &mut Vec<&'a TextRun>) {
        for child in &self.children {
            match child {
                Child::Node(node) => node.collect_runs(output),
                Child::Run(run) => output.push(run),
            }
        }
    }

    /// Depth-first search for a node by id.
    pub fn find_node(&self, id: usize) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| match child {
            Child::Node(node) => node.find_node(id),
            Child::Run(_) => None,
        })
    }

    /// Depth-first search for a text run by id.
    pub fn find_run(&self, id: usize) -> Option<&TextRun> {
        self.children.iter().find_map(|child| match child {
            Child::Node(node) => node.find_run(id),
            Child::Run(run) if run.id == id => Some(run),
            Child::Run(_) => None,
        })
    }
}

/// A successfully parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Node,
    /// Number of ids handed out (nodes and runs share one counter)
    pub id_count: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Parse raw markup text with default options.
///
/// # Example
/// ```ignore
/// let doc = parse_document("<article><title>Welcome</title></article>")?;
/// assert_eq!(doc.root.tag_name, "article");
/// ```
pub fn parse_document(text: &str) -> Result<Document> {
    parse_document_with_options(text, &ParseOptions::default())
}

/// Parse raw markup text with custom options.
pub fn parse_document_with_options(text: &str, options: &ParseOptions) -> Result<Document> {
    check_well_formed(text)?;
    let tokens = tokenize(text);
    let document = parse_tokens(&tokens, options)?;
    debug!(
        "Parsed {} bytes: {} tokens, {} ids",
        text.len(),
        tokens.len(),
        document.id_count
    );
    Ok(document)
}

/// Build a tree from an already tokenized stream.
///
/// Tokens before the first open tag are ignored, as is everything after the
/// root element ends.
pub fn parse_tokens(tokens: &[Token], options: &ParseOptions) -> Result<Document> {
    let root_index = tokens
        .iter()
        .position(Token::is_element_start)
        .ok_or(Error::NoRootElement)?;

    let parser = TreeBuilder { tokens, options };
    let (root, _, id_count) = parser.element(root_index, tokens.len(), None, 0, 0)?;

    Ok(Document { root, id_count })
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Tree Construction
// ─────────────────────────────────────────────────────────────────────────────

struct TreeBuilder<'a> {
    tokens: &'a [Token],
    options: &'a ParseOptions,
}

impl TreeBuilder<'_> {
    /// Build the element starting at `index`, looking no further than `limit`.
    ///
    /// Returns the node, the index of the first token after it, and the next
    /// free id.
    fn element(
        &self,
        index: usize,
        limit: usize,
        parent: Option<&str>,
        depth: usize,
        next_id: usize,
    ) -> Result<(Node, usize, usize)> {
        let token = self.tokens.get(index).ok_or_else(|| Error::Malformed {
            offset: self.tokens.last().map(|t| t.end).unwrap_or(0),
            reason: "element token out of range".to_string(),
        })?;

        let max_depth = self.options.effective_max_depth();
        if depth > max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: max_depth,
                offset: token.start,
            });
        }

        let tag_name = token.tag_name.clone().ok_or_else(|| Error::Malformed {
            offset: token.start,
            reason: "element token without a tag name".to_string(),
        })?;
        let variant = resolve_variant(&tag_name, parent, &token.attributes);
        let id = next_id;
        let mut next_id = next_id + 1;

        if token.kind == TokenKind::SelfClosing {
            let node = Node {
                id,
                tag_name,
                variant,
                attributes: token.attributes.clone(),
                children: Vec::new(),
                start: token.start,
                end: token.end,
                content_start: token.end,
                content_end: token.end,
            };
            return Ok((node, index + 1, next_id));
        }

        let close = self.find_close(index, limit, &tag_name);
        let window_end = close.unwrap_or(limit);

        let mut children = Vec::new();
        let mut last_end = token.end;
        let mut i = index + 1;

        while i < window_end {
            let child = &self.tokens[i];
            match child.kind {
                TokenKind::Text => {
                    children.push(Child::Run(TextRun {
                        id: next_id,
                        content: child.content.clone().unwrap_or_default(),
                        start: child.start,
                        end: child.end,
                    }));
                    next_id += 1;
                    last_end = child.end;
                    i += 1;
                }
                TokenKind::Open | TokenKind::SelfClosing => {
                    let (node, after, id_after) =
                        self.element(i, window_end, Some(&tag_name), depth + 1, next_id)?;
                    last_end = node.end;
                    children.push(Child::Node(node));
                    next_id = id_after;
                    i = after;
                }
                // Stray close tags and comments are consumed but not attached
                TokenKind::Close | TokenKind::Comment => {
                    last_end = child.end;
                    i += 1;
                }
            }
        }

        let (content_end, end, after) = match close {
            Some(c) => (self.tokens[c].start, self.tokens[c].end, c + 1),
            None => {
                debug!(
                    "Element <{}> at {} has no close tag, extending to {}",
                    tag_name, token.start, last_end
                );
                (last_end, last_end, window_end)
            }
        };

        let node = Node {
            id,
            tag_name,
            variant,
            attributes: token.attributes.clone(),
            children,
            start: token.start,
            end,
            content_start: token.end,
            content_end,
        };
        Ok((node, after, next_id))
    }

    fn find_close(&self, index: usize, limit: usize, name: &str) -> Option<usize> {
        let window = (index + 1)..limit;
        match self.options.match_mode {
            MatchMode::ByName => window.into_iter().find(|&i| self.tokens[i].is_close_of(name)),
            MatchMode::DepthAware => {
                let mut depth = 0usize;
                for i in window {
                    let token = &self.tokens[i];
                    if token.is_open_of(name) {
                        depth += 1;
                    } else if token.is_close_of(name) {
                        if depth == 0 {
                            return Some(i);
                        }
                        depth -= 1;
                    }
                }
                None
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
