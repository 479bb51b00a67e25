//! Lenient markup tokenizer
//!
//! Scans raw text into an ordered sequence of typed tokens carrying exact
//! byte offsets. The grammar is a handful of regular expressions rather than
//! a validating XML engine: comments, close tags, open/self-closing tags and
//! text runs. Anything matching none of them (a lone `<`, the opening `<` of
//! an `<?xml ?>` prologue or a doctype) is skipped without being reported.

use std::collections::HashSet;
use std::sync::OnceLock;

use log::trace;
use regex::Regex;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Grammar
// ─────────────────────────────────────────────────────────────────────────────

/// Combined token grammar. Alternation order matters: comments must win over
/// open tags, close tags over open tags.
const TOKEN_PATTERN: &str = r#"(?s)(?P<comment><!--.*?-->)|</(?P<close>[A-Za-z_][\w:.\-]*)\s*>|<(?P<open>[A-Za-z_][\w:.\-]*)(?P<attrs>(?:\s+[A-Za-z_][\w:.\-]*\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(?P<selfclose>/)?>|(?P<text>[^<]+)"#;

/// A single `name="value"` or `name='value'` pair.
const ATTRIBUTE_PATTERN: &str = r#"([A-Za-z_][\w:.\-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE_RE: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(TOKEN_PATTERN).expect("token grammar is valid"))
}

fn attribute_regex() -> &'static Regex {
    ATTRIBUTE_RE.get_or_init(|| Regex::new(ATTRIBUTE_PATTERN).expect("attribute grammar is valid"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered attribute map.
///
/// Keeps source order; a repeated name overwrites the earlier value in place.
/// Values are raw strings, entities are not decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an attribute, keeping its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Look up an attribute value by exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate attributes in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of distinct attribute names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attributes were parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokens
// ─────────────────────────────────────────────────────────────────────────────

/// Category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name ...>`
    Open,
    /// `</name>`
    Close,
    /// `<name .../>`
    SelfClosing,
    /// Run of characters not starting with `<`
    Text,
    /// `<!-- ... -->`
    Comment,
}

/// A token with absolute byte offsets into the raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Case-folded tag name (open, close and self-closing tokens)
    pub tag_name: Option<String>,
    /// Attributes in source order (open and self-closing tokens)
    pub attributes: Attributes,
    /// Literal content (text and comment tokens)
    pub content: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn tag(kind: TokenKind, name: &str, attributes: Attributes, start: usize, end: usize) -> Self {
        Self {
            kind,
            tag_name: Some(name.to_lowercase()),
            attributes,
            content: None,
            start,
            end,
        }
    }

    fn literal(kind: TokenKind, content: &str, start: usize, end: usize) -> Self {
        Self {
            kind,
            tag_name: None,
            attributes: Attributes::new(),
            content: Some(content.to_string()),
            start,
            end,
        }
    }

    /// Whether this token starts an element (open or self-closing).
    pub fn is_element_start(&self) -> bool {
        matches!(self.kind, TokenKind::Open | TokenKind::SelfClosing)
    }

    /// Whether this token opens an element named `name` (not self-closing).
    pub fn is_open_of(&self, name: &str) -> bool {
        self.kind == TokenKind::Open && self.tag_name.as_deref() == Some(name)
    }

    /// Whether this token closes an element named `name`.
    pub fn is_close_of(&self, name: &str) -> bool {
        self.kind == TokenKind::Close && self.tag_name.as_deref() == Some(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

/// Scan raw text into tokens.
///
/// Empty input yields an empty vector. Unrecognised fragments are dropped.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for caps in token_regex().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let (start, end) = (whole.start(), whole.end());

        if caps.name("comment").is_some() {
            tokens.push(Token::literal(TokenKind::Comment, whole.as_str(), start, end));
        } else if let Some(name) = caps.name("close") {
            tokens.push(Token::tag(
                TokenKind::Close,
                name.as_str(),
                Attributes::new(),
                start,
                end,
            ));
        } else if let Some(name) = caps.name("open") {
            let attributes = caps
                .name("attrs")
                .map(|m| parse_attributes(m.as_str()))
                .unwrap_or_default();
            let kind = if caps.name("selfclose").is_some() {
                TokenKind::SelfClosing
            } else {
                TokenKind::Open
            };
            tokens.push(Token::tag(kind, name.as_str(), attributes, start, end));
        } else if let Some(text_match) = caps.name("text") {
            tokens.push(text_token(text_match.as_str(), start, end));
        }
    }

    trace!("Tokenized {} bytes into {} tokens", text.len(), tokens.len());
    tokens
}

/// Build a text token.
///
/// Whitespace-only runs keep their full span. A run with leading whitespace
/// gets its start moved past that whitespace and its content trimmed, while
/// the end stays at the end of the original run.
fn text_token(run: &str, start: usize, end: usize) -> Token {
    let leading = run.len() - run.trim_start().len();
    if leading == 0 || leading == run.len() {
        return Token::literal(TokenKind::Text, run, start, end);
    }
    Token::literal(TokenKind::Text, run.trim(), start + leading, end)
}

fn parse_attributes(source: &str) -> Attributes {
    let mut attributes = Attributes::new();
    for caps in attribute_regex().captures_iter(source) {
        let Some(name) = caps.get(1) else { continue };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        attributes.insert(name.as_str(), value);
    }
    attributes
}

// ─────────────────────────────────────────────────────────────────────────────
// Well-formedness Gate
// ─────────────────────────────────────────────────────────────────────────────

/// Coarse structural check run before parsing.
///
/// Rejects unterminated comments, a `<` with no `>` before the next `<` or
/// the end of input, and close tags naming an element never opened earlier.
/// Missing close tags are not an error here; the parser tolerates them.
/// Doctype declarations (including an internal `[...]` subset) and
/// processing instructions are skipped whole.
pub fn check_well_formed(text: &str) -> Result<()> {
    let mut opened: HashSet<String> = HashSet::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find('<') {
        let lt = pos + rel;
        let rest = &text[lt..];

        if let Some(body) = rest.strip_prefix("<!--") {
            match body.find("-->") {
                Some(close) => {
                    pos = lt + 4 + close + 3;
                    continue;
                }
                None => return Err(malformed(lt, "unterminated comment")),
            }
        }

        if is_doctype(rest) {
            match doctype_len(rest) {
                Some(len) => {
                    pos = lt + len;
                    continue;
                }
                None => return Err(malformed(lt, "unterminated doctype")),
            }
        }

        if let Some(body) = rest.strip_prefix("<?") {
            match body.find("?>") {
                Some(close) => {
                    pos = lt + 2 + close + 2;
                    continue;
                }
                None => return Err(malformed(lt, "unterminated processing instruction")),
            }
        }

        let after = &rest[1..];
        let gt = match (after.find('>'), after.find('<')) {
            (Some(gt), Some(next_lt)) if next_lt < gt => {
                return Err(malformed(lt, "unterminated tag"));
            }
            (Some(gt), _) => gt,
            (None, _) => return Err(malformed(lt, "unterminated tag")),
        };

        let inner = &after[..gt];
        if let Some(closing) = inner.strip_prefix('/') {
            let name = closing.trim().to_lowercase();
            if !opened.contains(&name) {
                return Err(malformed(
                    lt,
                    &format!("close tag </{}> has no matching open tag", name),
                ));
            }
        } else {
            let name = inner
                .split(|c: char| c.is_whitespace() || c == '/')
                .next()
                .unwrap_or_default();
            if name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
                opened.insert(name.to_lowercase());
            }
        }

        pos = lt + 1 + gt + 1;
    }

    Ok(())
}

fn is_doctype(rest: &str) -> bool {
    rest.get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!DOCTYPE"))
}

/// Byte length of the doctype declaration at the start of `rest`, through its
/// closing `>`. Quoted literals are opaque and `>` inside `[...]` is skipped.
fn doctype_len(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;

    for (i, c) in rest.char_indices().skip(9) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => brackets += 1,
            (None, ']') => brackets = brackets.saturating_sub(1),
            (None, '>') if brackets == 0 => return Some(i + 1),
            _ => {}
        }
    }
    None
}

fn malformed(offset: usize, reason: &str) -> Error {
    Error::Malformed {
        offset,
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
