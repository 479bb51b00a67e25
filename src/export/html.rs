//! HTML Export Generation
//!
//! This module renders a parsed document as HTML, either as a fragment for a
//! preview surface or as a complete standalone document.
//!
//! Every element carries `data-node-id` and every text run is wrapped in a
//! `<span data-run-id>`, so a preview built from this output can map a click
//! back to a run id and hand it to the sync controller.
//!
//! Run text is copied from the source. Markup source and HTML share the same
//! entity syntax, so `&amp;` and friends pass through untouched while stray
//! `<` and `>` are escaped.

use log::debug;

use crate::error::Result;
use crate::markup::{
    parse_document_with_options, Child, Document, HeadingLevel, LinkTarget, Node, ParseOptions,
    Variant,
};

/// Schemes that are never emitted as link targets.
const UNSAFE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Notice rendered in place of a document that could not be parsed.
pub const PARSE_FAILURE_NOTICE: &str = "Could not parse document";

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Render a parsed document to an HTML fragment (no doctype, head, etc.).
pub fn render_fragment(document: &Document) -> String {
    let mut html = String::new();
    render_node(&document.root, &mut html);
    html
}

/// Generate a complete HTML document.
///
/// # Arguments
///
/// * `document` - The parsed document
/// * `title` - Optional document title
pub fn render_document(document: &Document, title: Option<&str>) -> String {
    wrap_document(&render_fragment(document), title)
}

/// Parse `text` and render it as a complete HTML document.
///
/// A parse failure is not an error here: the page shows an explicit
/// "could not parse" notice with the reason instead of any content.
pub fn render_source(text: &str, title: Option<&str>, options: &ParseOptions) -> String {
    match parse_document_with_options(text, options) {
        Ok(document) => render_document(&document, title),
        Err(err) => {
            debug!("Rendering parse failure notice: {}", err);
            render_failure_page(&err.to_string(), title)
        }
    }
}

/// Complete HTML page holding only the "could not parse" notice.
pub fn render_failure_page(reason: &str, title: Option<&str>) -> String {
    wrap_document(&failure_notice(reason), title)
}

/// Parse `text` and render it as a fragment, propagating parse failures.
pub fn render_source_fragment(text: &str, options: &ParseOptions) -> Result<String> {
    let document = parse_document_with_options(text, options)?;
    Ok(render_fragment(&document))
}

/// The "could not parse" block shown instead of a rendered tree.
pub fn failure_notice(reason: &str) -> String {
    format!(
        r#"<div class="parse-error" role="alert"><strong>{notice}</strong><p>{reason}</p></div>"#,
        notice = PARSE_FAILURE_NOTICE,
        reason = html_escape(reason),
    )
}

fn wrap_document(body: &str, title: Option<&str>) -> String {
    let doc_title = title.unwrap_or("Document");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="docsync">
    <title>{title}</title>
    <style>
{base_css}
    </style>
</head>
<body>
{body}
</body>
</html>"#,
        title = html_escape(doc_title),
        base_css = BASE_CSS,
        body = body,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tree Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn render_node(node: &Node, out: &mut String) {
    let tag = html_tag(&node.variant);

    out.push('<');
    out.push_str(tag);
    out.push_str(&format!(r#" data-node-id="{}""#, node.id));
    match &node.variant {
        Variant::Document => out.push_str(r#" class="document""#),
        Variant::Section(level) => out.push_str(&format!(r#" class="sect{}""#, level)),
        Variant::Link(Some(target)) => push_link_attributes(target, out),
        _ => {}
    }
    out.push('>');

    for child in &node.children {
        match child {
            Child::Node(inner) => render_node(inner, out),
            Child::Run(run) => {
                out.push_str(&format!(r#"<span data-run-id="{}">"#, run.id));
                out.push_str(&escape_source_text(&run.content));
                out.push_str("</span>");
            }
        }
    }

    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn push_link_attributes(target: &LinkTarget, out: &mut String) {
    if !is_safe_url(&target.url) {
        debug!("Dropping unsafe link target {:?}", target.url);
        return;
    }
    out.push_str(&format!(
        r#" href="{}" target="{}" rel="{}""#,
        escape_source_text(&target.url),
        LinkTarget::TARGET,
        LinkTarget::REL
    ));
}

/// HTML element for a presentation variant.
pub fn html_tag(variant: &Variant) -> &'static str {
    match variant {
        Variant::Document => "article",
        Variant::Heading(HeadingLevel::H1) => "h1",
        Variant::Heading(HeadingLevel::H2) => "h2",
        Variant::Heading(HeadingLevel::H3) => "h3",
        Variant::InlineBold => "b",
        Variant::Paragraph => "p",
        Variant::BulletList => "ul",
        Variant::ListItem => "li",
        Variant::Emphasis => "em",
        Variant::Strong => "strong",
        Variant::Underline => "u",
        Variant::Phrase => "span",
        Variant::Superscript => "sup",
        Variant::Subscript => "sub",
        Variant::Section(_) => "section",
        Variant::Link(_) => "a",
        Variant::Block => "div",
    }
}

fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim_start().to_ascii_lowercase();
    !UNSAFE_SCHEMES
        .iter()
        .any(|scheme| trimmed.starts_with(scheme))
}

// ─────────────────────────────────────────────────────────────────────────────
// CSS
// ─────────────────────────────────────────────────────────────────────────────

/// Base CSS for rendered documents (layout, typography).
const BASE_CSS: &str = r#"
body {
    margin: 0;
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.6;
}

.document {
    max-width: 900px;
    margin: 0 auto;
    padding: 32px 24px;
}

.document h1, .document h2, .document h3 {
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}

.document ul {
    padding-left: 2em;
}

.document span.highlight {
    background-color: rgba(255, 213, 79, 0.5);
}

.parse-error {
    margin: 32px;
    padding: 16px;
    border-left: 4px solid #d73a49;
}
"#;

// ─────────────────────────────────────────────────────────────────────────────
// Utility Functions
// ─────────────────────────────────────────────────────────────────────────────

/// HTML-escape a plain string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape source text whose entities are already encoded.
fn escape_source_text(s: &str) -> String {
    s.replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_document;

    const WELCOME: &str = r#"<article><title>Welcome</title><para>Hi <emphasis role="bold">there</emphasis></para></article>"#;

    #[test]
    fn test_render_fragment() {
        let doc = parse_document(WELCOME).unwrap();
        let html = render_fragment(&doc);

        assert!(html.starts_with(r#"<article data-node-id="0" class="document">"#));
        assert!(html.contains(r#"<h1 data-node-id="1"><span data-run-id="2">Welcome</span></h1>"#));
        assert!(html.contains(r#"<p data-node-id="3"><span data-run-id="4">Hi </span>"#));
        assert!(html.contains(r#"<strong data-node-id="5"><span data-run-id="6">there</span></strong>"#));
        assert!(html.ends_with("</p></article>"));
        assert!(!html.contains("<!DOCTYPE"));
    }

    #[test]
    fn test_render_document() {
        let doc = parse_document(WELCOME).unwrap();
        let html = render_document(&doc, Some("Test <Doc>"));

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test &lt;Doc&gt;</title>"));
        assert!(html.contains("<h1"));
        assert!(html.contains("</html>"));
    }

    #[test]
    fn test_link_attributes() {
        let doc = parse_document(r#"<para><ulink url="https://x.test/?a=1&amp;b=2">x</ulink></para>"#)
            .unwrap();
        let html = render_fragment(&doc);
        assert!(html.contains(
            r#"<a data-node-id="1" href="https://x.test/?a=1&amp;b=2" target="_blank" rel="noopener noreferrer">"#
        ));
    }

    #[test]
    fn test_link_without_target() {
        let doc = parse_document("<para><link>x</link></para>").unwrap();
        let html = render_fragment(&doc);
        assert!(html.contains(r#"<a data-node-id="1">"#));
    }

    #[test]
    fn test_unsafe_link_scheme_dropped() {
        let doc = parse_document(r#"<para><ulink url=" JavaScript:alert(1)">x</ulink></para>"#)
            .unwrap();
        let html = render_fragment(&doc);
        assert!(!html.contains("href"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn test_sections_and_lists() {
        let text = "<article><sect1><title>A</title><itemizedlist><listitem><para>one</para></listitem></itemizedlist></sect1></article>";
        let html = render_fragment(&parse_document(text).unwrap());
        assert!(html.contains(r#"<section data-node-id="1" class="sect1">"#));
        assert!(html.contains("<h2 "));
        assert!(html.contains("<ul "));
        assert!(html.contains("<li "));
    }

    #[test]
    fn test_entities_pass_through() {
        let doc = parse_document("<para>a &amp; b &gt; c</para>").unwrap();
        let html = render_fragment(&doc);
        assert!(html.contains("a &amp; b &gt; c"));
        assert!(!html.contains("&amp;amp;"));
    }

    #[test]
    fn test_stray_angle_bracket_escaped() {
        let doc = parse_document("<para>a > b</para>").unwrap();
        assert!(render_fragment(&doc).contains("a &gt; b"));
    }

    #[test]
    fn test_render_source_failure_notice() {
        let html = render_source("<para>oops</title>", None, &ParseOptions::default());
        assert!(html.contains(PARSE_FAILURE_NOTICE));
        assert!(html.contains("parse-error"));
        assert!(!html.contains("data-node-id"));

        let html = render_source("", None, &ParseOptions::default());
        assert!(html.contains(PARSE_FAILURE_NOTICE));
    }

    #[test]
    fn test_render_source_fragment_propagates() {
        let result = render_source_fragment("no tags", &ParseOptions::default());
        assert!(result.unwrap_err().is_parse_failure());
        assert!(render_source_fragment(WELCOME, &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_html_tag_mapping() {
        assert_eq!(html_tag(&Variant::InlineBold), "b");
        assert_eq!(html_tag(&Variant::Underline), "u");
        assert_eq!(html_tag(&Variant::Block), "div");
        assert_eq!(html_tag(&Variant::Heading(HeadingLevel::H3)), "h3");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"q\""), "&quot;q&quot;");
    }
}
