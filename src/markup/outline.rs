//! Document outline extraction
//!
//! Collects the headings of a parsed document (titles resolved to a heading
//! variant) for navigation panels.

use super::parser::{Child, Document, Node};
use crate::string_utils::line_of_offset;

/// A single heading in the outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    /// Node id of the title element (valid for the current parse only)
    pub node_id: usize,
    /// Heading level (1-3)
    pub level: u8,
    /// Heading text with surrounding whitespace trimmed
    pub title: String,
    /// Line number in the source document (1-indexed)
    pub line: usize,
    /// Byte offset of the title element in the source
    pub offset: usize,
}

impl OutlineItem {
    /// Get the indentation level (0 for level 1, 1 for level 2, ...)
    pub fn indent_level(&self) -> usize {
        self.level.saturating_sub(1) as usize
    }
}

/// Extract every heading of `document` in document order.
pub fn extract_outline(document: &Document, text: &str) -> Vec<OutlineItem> {
    let mut items = Vec::new();
    collect(&document.root, text, &mut items);
    items
}

fn collect(node: &Node, text: &str, items: &mut Vec<OutlineItem>) {
    if let Some(level) = node.variant.heading_level() {
        items.push(OutlineItem {
            node_id: node.id,
            level: level.level(),
            title: node.text_content().trim().to_string(),
            line: line_of_offset(text, node.start),
            offset: node.start,
        });
    }
    for child in &node.children {
        if let Child::Node(inner) = child {
            collect(inner, text, items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parser::parse_document;

    #[test]
    fn test_extract_outline() {
        let text = "<article>\n<title>Guide</title>\n<sect1>\n<title>Install <emphasis>now</emphasis></title>\n\
                    <sect2><title> Linux </title></sect2>\n</sect1>\n<para><title>inline</title></para>\n</article>";
        let doc = parse_document(text).unwrap();
        let outline = extract_outline(&doc, text);

        let summary: Vec<_> = outline
            .iter()
            .map(|item| (item.level, item.title.as_str(), item.line))
            .collect();
        assert_eq!(
            summary,
            vec![(1, "Guide", 2), (2, "Install now", 4), (3, "Linux", 5)]
        );
        assert_eq!(outline[2].indent_level(), 2);
    }

    #[test]
    fn test_outline_without_headings() {
        let text = "<para>plain</para>";
        let doc = parse_document(text).unwrap();
        assert!(extract_outline(&doc, text).is_empty());
    }
}
