//! Parser-independent document shape.
//!
//! The checker only needs headings (with their inline content) and link
//! destinations, so that is all a `MarkdownParser` has to produce. Paragraph
//! text, lists, tables and the rest of the block structure are dropped.

use std::path::Path;

use crate::error::Error;
use crate::types::ReferenceKind;

/// Inline content of a heading, reduced to what slugging needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Contents of a code span, delimiters removed.
    Code(String),
    /// Emphasis, strong emphasis, or strikethrough.
    Emphasis(Vec<Inline>),
    /// Raw inline HTML tag.
    Html(String),
    /// An image. Only its alt text survives.
    Image {
        /// Alt text content.
        alt: Vec<Inline>,
    },
    /// A link. Only its visible text survives.
    Link {
        /// Link text content.
        children: Vec<Inline>,
    },
    /// Literal text with escapes and entities already decoded.
    Text(String),
}

/// A heading, ATX or setext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingNode {
    /// Inline content in source order.
    pub inlines: Vec<Inline>,
    /// 1 through 6.
    pub level: u8,
    /// One-based line where the heading starts.
    pub line: u32,
}

/// A link, image, autolink, or link reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkNode {
    /// Destination with angle brackets, escapes and entities removed.
    pub destination: String,
    /// Which construct produced it.
    pub kind: ReferenceKind,
    /// One-based line of the construct.
    pub line: u32,
    /// Destination exactly as written, angle brackets removed.
    pub raw: String,
}

/// Anything a `MarkdownParser` can turn a document into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    /// A heading.
    Heading(HeadingNode),
    /// A link-like construct.
    Link(LinkNode),
}

/// A parsed document: headings and links in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyntaxTree {
    /// Nodes in the order they appear in the source.
    pub nodes: Vec<SyntaxNode>,
}

/// A CommonMark parser able to produce the node shapes above.
pub trait MarkdownParser {
    /// Parse `text`, read from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be parsed at all. Malformed
    /// Markdown is not an error; CommonMark gives every input a meaning.
    fn parse(&self, path: &Path, text: &str) -> Result<SyntaxTree, Error>;
}

impl HeadingNode {
    /// Heading text with all formatting removed.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for inline in &self.inlines {
            inline.push_plain_text(&mut out);
        }
        return out;
    }
}

impl Inline {
    /// Append the text a reader sees when this inline is rendered.
    /// Images and raw HTML contribute nothing.
    pub fn push_plain_text(&self, out: &mut String) {
        match self {
            Inline::Code(text) | Inline::Text(text) => out.push_str(text),
            Inline::Emphasis(children) | Inline::Link { children } => {
                for child in children {
                    child.push_plain_text(out);
                }
            },
            Inline::Html(_) | Inline::Image { .. } => {},
        }
        return;
    }
}

impl SyntaxTree {
    /// Headings in document order.
    pub fn headings(&self) -> impl Iterator<Item = &HeadingNode> {
        return self.nodes.iter().filter_map(|node| {
            return match node {
                SyntaxNode::Heading(heading) => Some(heading),
                SyntaxNode::Link(_) => None,
            };
        });
    }

    /// Link-like constructs in document order.
    pub fn links(&self) -> impl Iterator<Item = &LinkNode> {
        return self.nodes.iter().filter_map(|node| {
            return match node {
                SyntaxNode::Heading(_) => None,
                SyntaxNode::Link(link) => Some(link),
            };
        });
    }
}
