//! Presentation variants for the markup vocabulary
//!
//! Every element gets a `Variant` telling the renderer which presentation role
//! to use. Most tags map through a static table; `title`, `emphasis` and the
//! link tags look at their parent or their attributes.

use super::tokenizer::Attributes;

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Heading level for resolved titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeadingLevel {
    H1 = 1,
    H2 = 2,
    H3 = 3,
}

impl HeadingLevel {
    /// Numeric level (1-3).
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// Resolved link target.
///
/// A link with a target is always opened in a new browsing context without
/// leaking the referrer or the opener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: String,
}

impl LinkTarget {
    /// Browsing context hint for HTML renderers.
    pub const TARGET: &'static str = "_blank";
    /// Link relation hint for HTML renderers.
    pub const REL: &'static str = "noopener noreferrer";

    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn opens_new_context(&self) -> bool {
        true
    }

    pub fn sends_referrer(&self) -> bool {
        false
    }

    pub fn exposes_opener(&self) -> bool {
        false
    }
}

/// Presentation role of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// `article`
    Document,
    /// `title` under `article`, `sect1` or `sect2`
    Heading(HeadingLevel),
    /// `title` anywhere else
    InlineBold,
    /// `para`
    Paragraph,
    /// `itemizedlist`
    BulletList,
    /// `listitem`
    ListItem,
    /// `emphasis` without a recognised role
    Emphasis,
    /// `emphasis role="bold"`
    Strong,
    /// `emphasis role="underline"`
    Underline,
    /// `phrase`
    Phrase,
    /// `superscript`
    Superscript,
    /// `subscript`
    Subscript,
    /// `sect1` / `sect2`
    Section(u8),
    /// `ulink` / `link`; `None` when no target attribute is present
    Link(Option<LinkTarget>),
    /// Unknown tags keep their structure with a generic block presentation
    Block,
}

impl Variant {
    /// Whether the variant flows inline with surrounding text.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Variant::InlineBold
                | Variant::Emphasis
                | Variant::Strong
                | Variant::Underline
                | Variant::Phrase
                | Variant::Superscript
                | Variant::Subscript
                | Variant::Link(_)
        )
    }

    /// Heading level, if this is a heading.
    pub fn heading_level(&self) -> Option<HeadingLevel> {
        match self {
            Variant::Heading(level) => Some(*level),
            _ => None,
        }
    }

    /// Short label used in tree dumps and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Document => "document",
            Variant::Heading(HeadingLevel::H1) => "heading-1",
            Variant::Heading(HeadingLevel::H2) => "heading-2",
            Variant::Heading(HeadingLevel::H3) => "heading-3",
            Variant::InlineBold => "inline-bold",
            Variant::Paragraph => "paragraph",
            Variant::BulletList => "bullet-list",
            Variant::ListItem => "list-item",
            Variant::Emphasis => "emphasis",
            Variant::Strong => "strong",
            Variant::Underline => "underline",
            Variant::Phrase => "phrase",
            Variant::Superscript => "superscript",
            Variant::Subscript => "subscript",
            Variant::Section(_) => "section",
            Variant::Link(_) => "link",
            Variant::Block => "block",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve the variant for a tag given its parent tag and attributes.
///
/// `tag` and `parent` are expected to be case-folded already.
pub fn resolve_variant(tag: &str, parent: Option<&str>, attributes: &Attributes) -> Variant {
    match tag {
        "title" => match parent {
            Some("article") => Variant::Heading(HeadingLevel::H1),
            Some("sect1") => Variant::Heading(HeadingLevel::H2),
            Some("sect2") => Variant::Heading(HeadingLevel::H3),
            _ => Variant::InlineBold,
        },
        "emphasis" => match attributes.get("role") {
            Some("bold") => Variant::Strong,
            Some("underline") => Variant::Underline,
            _ => Variant::Emphasis,
        },
        "ulink" | "link" => Variant::Link(link_target(attributes)),
        _ => static_variant(tag),
    }
}

fn static_variant(tag: &str) -> Variant {
    match tag {
        "article" => Variant::Document,
        "para" => Variant::Paragraph,
        "itemizedlist" => Variant::BulletList,
        "listitem" => Variant::ListItem,
        "phrase" => Variant::Phrase,
        "superscript" => Variant::Superscript,
        "subscript" => Variant::Subscript,
        "sect1" => Variant::Section(1),
        "sect2" => Variant::Section(2),
        _ => Variant::Block,
    }
}

/// Plain `url` wins over the XLink form; bare `href` is the last resort.
fn link_target(attributes: &Attributes) -> Option<LinkTarget> {
    ["url", "xlink:href", "href"]
        .iter()
        .find_map(|name| attributes.get(name))
        .map(LinkTarget::new)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
