//! Default `MarkdownParser`, built on the tree-sitter Markdown grammars.
//!
//! `tree-sitter-md` ships two grammars: a block grammar for document structure
//! and an inline grammar for the contents of each paragraph, heading, or table
//! cell. The block tree is walked once; every `inline` node is re-parsed with
//! the inline grammar restricted to that node's bytes, so positions stay
//! absolute within the document.

use std::path::Path;

use tree_sitter::{Language, Node, Parser, Range, Tree};

use crate::error::Error;
use crate::syntax::{HeadingNode, Inline, LinkNode, MarkdownParser, SyntaxNode, SyntaxTree};
use crate::types::ReferenceKind;

/// Maximum document size (16 MiB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Walks the block tree of one document, collecting headings and links.
struct BlockWalker<'src> {
    /// File being parsed, for error messages.
    file: &'src Path,
    /// Inline-grammar parser, reused for every inline run.
    inline_parser: Parser,
    /// Output in document order.
    nodes: Vec<SyntaxNode>,
    /// Full document text.
    source: &'src str,
}

/// Converts an inline tree into `Inline` values.
/// Text between child nodes is read from `source`, clipped to `ranges`.
struct InlineConverter<'src> {
    /// The byte ranges the inline grammar was allowed to see.
    ranges: &'src [Range],
    /// Full document text.
    source: &'src str,
}

/// Block and inline grammars from `tree-sitter-md`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeSitterMarkdown;

impl BlockWalker<'_> {
    /// Parse an inline run and record the links it contains.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseFailed` if the inline grammar rejects the ranges or returns no tree.
    fn parse_inline(&mut self, node: Node<'_>) -> Result<Vec<Inline>, Error> {
        return self.parse_ranges(&inline_ranges(node));
    }

    /// Parse the given byte ranges with the inline grammar.
    ///
    /// # Errors
    ///
    /// Returns `Error::ParseFailed` if the inline grammar rejects the ranges or returns no tree.
    fn parse_ranges(&mut self, ranges: &[Range]) -> Result<Vec<Inline>, Error> {
        if ranges.is_empty() {
            return Ok(Vec::new());
        }

        self.inline_parser
            .set_included_ranges(ranges)
            .map_err(|err| return Error::ParseFailed {
                file: self.file.to_path_buf(),
                reason: format!("inline ranges rejected: {err:?}"),
            })?;
        let tree = parse_tree(&mut self.inline_parser, self.file, self.source)?;

        let converter = InlineConverter { ranges, source: self.source };
        let mut links = Vec::new();
        let inlines = converter.convert(tree.root_node(), &mut links);
        self.nodes.extend(links.into_iter().map(SyntaxNode::Link));

        return Ok(inlines);
    }

    /// Dispatch on a block node.
    ///
    /// # Errors
    ///
    /// Propagates inline parse failures.
    fn visit(&mut self, node: Node<'_>) -> Result<(), Error> {
        match node.kind() {
            "atx_heading" | "setext_heading" => return self.visit_heading(node),
            "fenced_code_block" | "html_block" | "indented_code_block" | "minus_metadata"
            | "plus_metadata" => return Ok(()),
            "inline" => {
                self.parse_inline(node)?;
                return Ok(());
            },
            "link_reference_definition" => {
                self.visit_definition(node);
                return Ok(());
            },
            "pipe_table_cell" if child_of_kind(node, "inline").is_none() => {
                self.parse_inline(node)?;
                return Ok(());
            },
            _ => {},
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child)?;
        }
        return Ok(());
    }

    /// Record a `[label]: destination` definition. Footnote definitions are skipped.
    fn visit_definition(&mut self, node: Node<'_>) {
        let Some(destination) = child_of_kind(node, "link_destination") else {
            return;
        };

        let is_footnote = child_of_kind(node, "link_label")
            .and_then(|label| return label.utf8_text(self.source.as_bytes()).ok())
            .is_some_and(|label| return label.trim_start_matches('[').starts_with('^'));
        if is_footnote {
            return;
        }

        let written = destination.utf8_text(self.source.as_bytes()).unwrap_or("");
        self.nodes.push(SyntaxNode::Link(link_node(written, ReferenceKind::Definition, line_of(node))));
        return;
    }

    /// Record a heading. Links inside the heading are recorded after it.
    /// An ATX closing sequence is cut from the inline ranges before parsing.
    ///
    /// # Errors
    ///
    /// Propagates inline parse failures.
    fn visit_heading(&mut self, node: Node<'_>) -> Result<(), Error> {
        let position = self.nodes.len();

        let mut contents = Vec::new();
        collect_descendants_of_kind(node, "inline", &mut contents);
        let is_atx = node.kind() == "atx_heading";
        let mut inlines = Vec::new();
        for content in contents {
            let mut ranges = inline_ranges(content);
            if is_atx {
                trim_closing_sequence(&mut ranges, self.source);
            }
            inlines.extend(self.parse_ranges(&ranges)?);
        }

        self.nodes.insert(position, SyntaxNode::Heading(HeadingNode {
            inlines,
            level: heading_level(node),
            line: line_of(node),
        }));
        return Ok(());
    }
}

impl InlineConverter<'_> {
    /// Convert the children of `node`, keeping the text between them.
    fn convert(&self, node: Node<'_>, links: &mut Vec<LinkNode>) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut offset = node.start_byte();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.push_source_text(&mut out, offset, child.start_byte());
            offset = child.end_byte();
            if child.is_named() {
                self.convert_named(child, &mut out, links);
            }
        }
        self.push_source_text(&mut out, offset, node.end_byte());

        return out;
    }

    /// Convert a link or image. Only the visible text is kept inline; the
    /// destination, when written inline, becomes a `LinkNode` ahead of any
    /// links nested in the text.
    fn convert_link(&self, node: Node<'_>, text_kind: &str, links: &mut Vec<LinkNode>) -> Vec<Inline> {
        if let Some(destination) = child_of_kind(node, "link_destination") {
            let kind = if node.kind() == "image" { ReferenceKind::Image } else { ReferenceKind::Link };
            links.push(link_node(self.text_of(destination), kind, line_of(node)));
        }

        return child_of_kind(node, text_kind)
            .map(|text| return self.convert(text, links))
            .unwrap_or_default();
    }

    /// Convert one named inline node and append the result.
    fn convert_named(&self, node: Node<'_>, out: &mut Vec<Inline>, links: &mut Vec<LinkNode>) {
        match node.kind() {
            "backslash_escape" => push_text(out, self.text_of(node).get(1..).unwrap_or("")),
            "code_span" => {
                let mut code = String::new();
                for inline in self.convert(node, links) {
                    inline.push_plain_text(&mut code);
                }
                out.push(Inline::Code(code));
            },
            "code_span_delimiter" | "emphasis_delimiter" | "link_destination" | "link_label"
            | "link_title" => {},
            "collapsed_reference_link" | "full_reference_link" | "inline_link" | "shortcut_link" => {
                let children = self.convert_link(node, "link_text", links);
                out.push(Inline::Link { children });
            },
            "email_autolink" => {
                let inner = unwrap_angle_brackets(self.text_of(node));
                out.push(Inline::Link { children: vec![Inline::Text(inner.to_string())] });
            },
            "uri_autolink" => {
                let inner = unwrap_angle_brackets(self.text_of(node));
                links.push(LinkNode {
                    destination: inner.to_string(),
                    kind: ReferenceKind::Link,
                    line: line_of(node),
                    raw: inner.to_string(),
                });
                out.push(Inline::Link { children: vec![Inline::Text(inner.to_string())] });
            },
            "emphasis" | "strikethrough" | "strong_emphasis" => {
                out.push(Inline::Emphasis(self.convert(node, links)));
            },
            "entity_reference" | "numeric_character_reference" => {
                let raw = self.text_of(node);
                match decode_entity(raw) {
                    Some(ch) => push_text(out, ch.encode_utf8(&mut [0_u8; 4])),
                    None => push_text(out, raw),
                }
            },
            "html_tag" => out.push(Inline::Html(self.text_of(node).to_string())),
            "image" => {
                let alt = self.convert_link(node, "image_description", links);
                out.push(Inline::Image { alt });
            },
            _ => out.extend(self.convert(node, links)),
        }
        return;
    }

    /// Append source text in `start..end`, skipping bytes outside the inline ranges.
    fn push_source_text(&self, out: &mut Vec<Inline>, start: usize, end: usize) {
        for range in self.ranges {
            let low = start.max(range.start_byte);
            let high = end.min(range.end_byte);
            if low >= high {
                continue;
            }
            if let Some(text) = self.source.get(low..high) {
                push_text(out, text);
            }
        }
        return;
    }

    /// Source text of a node.
    fn text_of(&self, node: Node<'_>) -> &str {
        return node.utf8_text(self.source.as_bytes()).unwrap_or("");
    }
}

impl MarkdownParser for TreeSitterMarkdown {
    fn parse(&self, path: &Path, text: &str) -> Result<SyntaxTree, Error> {
        let text_len: u64 = text.len().try_into().unwrap_or(u64::MAX);
        if text_len > MAX_FILE_SIZE {
            return Err(Error::FileTooLarge {
                file: path.to_path_buf(),
                max_bytes: MAX_FILE_SIZE,
                size_bytes: text_len,
            });
        }

        let block_language: Language = tree_sitter_md::LANGUAGE.into();
        let inline_language: Language = tree_sitter_md::INLINE_LANGUAGE.into();

        let mut block_parser = new_parser(path, &block_language)?;
        let block_tree = parse_tree(&mut block_parser, path, text)?;

        let mut walker = BlockWalker {
            file: path,
            inline_parser: new_parser(path, &inline_language)?,
            nodes: Vec::new(),
            source: text,
        };
        walker.visit(block_tree.root_node())?;

        return Ok(SyntaxTree { nodes: walker.nodes });
    }
}

/// First direct child of the given kind.
fn child_of_kind<'tree>(node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| return child.kind() == kind);
    return found;
}

/// Collect descendants of the given kind without descending into matches.
fn collect_descendants_of_kind<'tree>(node: Node<'tree>, kind: &str, found: &mut Vec<Node<'tree>>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            found.push(child);
        } else {
            collect_descendants_of_kind(child, kind, found);
        }
    }
    return;
}

/// Decode one `&name;` or `&#NN;` reference. Only the common named entities are known.
fn decode_entity(entity: &str) -> Option<char> {
    let body = entity.strip_prefix('&')?.strip_suffix(';')?;

    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    return match body {
        "amp" => Some('&'),
        "apos" => Some('\''),
        "gt" => Some('>'),
        "lt" => Some('<'),
        "nbsp" => Some('\u{a0}'),
        "quot" => Some('"'),
        _ => None,
    };
}

/// Decode backslash escapes of ASCII punctuation and known entities.
fn decode_escapes_and_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if ch == '\\'
            && let Some(next) = rest.get(1..).and_then(|tail| return tail.chars().next())
            && next.is_ascii_punctuation()
        {
            out.push(next);
            rest = rest.get(2..).unwrap_or("");
            continue;
        }
        if ch == '&'
            && let Some(end) = rest.find(';')
            && let Some(decoded) = rest.get(..=end).and_then(decode_entity)
        {
            out.push(decoded);
            rest = rest.get(end.saturating_add(1)..).unwrap_or("");
            continue;
        }
        out.push(ch);
        rest = rest.get(ch.len_utf8()..).unwrap_or("");
    }

    return out;
}

/// Heading level from the ATX marker or setext underline.
fn heading_level(heading: Node<'_>) -> u8 {
    let mut cursor = heading.walk();
    for child in heading.children(&mut cursor) {
        let level = match child.kind() {
            "atx_h1_marker" | "setext_h1_underline" => 1,
            "atx_h2_marker" | "setext_h2_underline" => 2,
            "atx_h3_marker" => 3,
            "atx_h4_marker" => 4,
            "atx_h5_marker" => 5,
            "atx_h6_marker" => 6,
            _ => continue,
        };
        return level;
    }
    return 1;
}

/// The node's byte range minus the ranges of its named children, which are
/// continuation markers such as `> `. Anonymous children are punctuation
/// tokens and stay in the ranges.
fn inline_ranges(node: Node<'_>) -> Vec<Range> {
    let mut ranges = Vec::new();
    let mut current = node.range();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor).filter(|child| return child.is_named()) {
        if child.start_byte() > current.start_byte {
            ranges.push(Range {
                end_byte: child.start_byte(),
                end_point: child.start_position(),
                start_byte: current.start_byte,
                start_point: current.start_point,
            });
        }
        current.start_byte = child.end_byte();
        current.start_point = child.end_position();
    }

    if current.end_byte > current.start_byte {
        ranges.push(current);
    }
    return ranges;
}

/// A link node from a destination as written. `raw` keeps escapes and
/// entities; `destination` has them decoded.
fn link_node(written: &str, kind: ReferenceKind, line: u32) -> LinkNode {
    let raw = unwrap_angle_brackets(written);
    return LinkNode {
        destination: decode_escapes_and_entities(raw),
        kind,
        line,
        raw: raw.to_string(),
    };
}

/// One-based line of a node's first byte.
fn line_of(node: Node<'_>) -> u32 {
    return u32::try_from(node.start_position().row)
        .unwrap_or(u32::MAX)
        .saturating_add(1);
}

/// Create a parser for one grammar.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the grammar is incompatible with the tree-sitter runtime.
fn new_parser(path: &Path, language: &Language) -> Result<Parser, Error> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|err| return Error::ParseFailed {
        file: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    return Ok(parser);
}

/// Run a configured parser over the whole document.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if tree-sitter returns no tree.
fn parse_tree(parser: &mut Parser, path: &Path, text: &str) -> Result<Tree, Error> {
    return parser.parse(text, None).ok_or_else(|| return Error::ParseFailed {
        file: path.to_path_buf(),
        reason: "tree-sitter returned None".to_string(),
    });
}

/// Append text, merging with a preceding text run.
fn push_text(out: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Inline::Text(text.to_string()));
    }
    return;
}

/// Cut an ATX closing sequence (`## Title ##`) from the end of the last range.
/// A `#` run only closes the heading when preceded by whitespace or nothing,
/// so an escaped `\#` stays.
fn trim_closing_sequence(ranges: &mut Vec<Range>, source: &str) {
    let Some(last) = ranges.last_mut() else {
        return;
    };
    let Some(text) = source.get(last.start_byte..last.end_byte) else {
        return;
    };

    let trimmed = text.trim_end();
    let without_hashes = trimmed.trim_end_matches('#');
    if without_hashes.len() == trimmed.len() {
        return;
    }
    if !(without_hashes.is_empty() || without_hashes.ends_with(char::is_whitespace)) {
        return;
    }

    let keep = without_hashes.trim_end().len();
    let cut = text.len().saturating_sub(keep);
    last.end_byte = last.end_byte.saturating_sub(cut);
    last.end_point.column = last.end_point.column.saturating_sub(cut);
    if last.end_byte <= last.start_byte {
        ranges.pop();
    }
    return;
}

/// Strip the `<...>` around a destination or autolink.
fn unwrap_angle_brackets(written: &str) -> &str {
    let trimmed = written.trim();
    return trimmed
        .strip_prefix('<')
        .and_then(|inner| return inner.strip_suffix('>'))
        .unwrap_or(trimmed);
}
