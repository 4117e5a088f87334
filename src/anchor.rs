//! Heading anchors: slugging and duplicate disambiguation.

use std::collections::HashMap;

use crate::syntax::SyntaxTree;
use crate::types::Anchor;

/// Derive every heading anchor of a document, in document order.
///
/// The first heading with a given slug keeps it; the Nth repeat gets `-N`.
/// Empty headings produce the empty slug and are numbered like any other.
pub fn derive_anchors(tree: &SyntaxTree) -> Vec<Anchor> {
    let mut seen: HashMap<String, u32> = HashMap::new();
    let mut anchors = Vec::new();

    for heading in tree.headings() {
        let text = heading.plain_text().trim().to_string();
        let base = slugify(&text);

        let count = seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 { base } else { format!("{base}-{count}") };
        *count = count.saturating_add(1);

        anchors.push(Anchor { slug, text });
    }

    return anchors;
}

/// Convert heading text to the `id` a renderer would give it.
///
/// Lowercase; keep letters, digits, `_`, `-` and whitespace, drop everything
/// else (so `What's` becomes `whats`); collapse runs of whitespace and hyphens
/// into one hyphen; trim hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let mut result = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
            continue;
        }
        if !(c.is_alphanumeric() || c == '_') {
            continue;
        }
        if pending_hyphen && !result.is_empty() {
            result.push('-');
        }
        pending_hyphen = false;
        result.push(c);
    }

    return result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{HeadingNode, Inline, SyntaxNode};

    fn tree_of(headings: &[&str]) -> SyntaxTree {
        let nodes = headings
            .iter()
            .zip(1_u32..)
            .map(|(text, line)| {
                return SyntaxNode::Heading(HeadingNode {
                    inlines: vec![Inline::Text((*text).to_string())],
                    level: 2,
                    line,
                });
            })
            .collect();
        return SyntaxTree { nodes };
    }

    fn slugs(tree: &SyntaxTree) -> Vec<String> {
        return derive_anchors(tree).into_iter().map(|a| return a.slug).collect();
    }

    #[test]
    fn simple_heading() {
        assert_eq!(slugify("Architecture"), "architecture");
    }

    #[test]
    fn multi_word() {
        assert_eq!(slugify("Getting Started"), "getting-started");
    }

    #[test]
    fn apostrophe_is_dropped() {
        assert_eq!(slugify("What's New?"), "whats-new");
    }

    #[test]
    fn runs_of_spaces_and_hyphens_collapse() {
        assert_eq!(slugify("  Hello   World  "), "hello-world");
        assert_eq!(slugify("A - B"), "a-b");
        assert_eq!(slugify("-Leading and trailing-"), "leading-and-trailing");
    }

    #[test]
    fn keeps_underscores_digits_and_unicode_letters() {
        assert_eq!(slugify("snake_case 2.0"), "snake_case-20");
        assert_eq!(slugify("Über Café"), "über-café");
    }

    #[test]
    fn empty_string() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn duplicates_get_numbered_suffixes() {
        let tree = tree_of(&["Setup", "Usage", "Setup", "Setup"]);
        assert_eq!(slugs(&tree), vec!["setup", "usage", "setup-1", "setup-2"]);
    }

    #[test]
    fn empty_headings_are_disambiguated_too() {
        let tree = tree_of(&["", "!!", ""]);
        assert_eq!(slugs(&tree), vec!["", "-1", "-2"]);
    }

    #[test]
    fn formatting_is_stripped_before_slugging() {
        let tree = SyntaxTree {
            nodes: vec![SyntaxNode::Heading(HeadingNode {
                inlines: vec![
                    Inline::Text("Using ".to_string()),
                    Inline::Code("cargo_fmt".to_string()),
                    Inline::Text(" with ".to_string()),
                    Inline::Emphasis(vec![Inline::Text("care".to_string())]),
                    Inline::Image { alt: vec![Inline::Text("badge".to_string())] },
                ],
                level: 1,
                line: 1,
            })],
        };
        let anchors = derive_anchors(&tree);
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].slug, "using-cargo_fmt-with-care");
        assert_eq!(anchors[0].text, "Using cargo_fmt with care");
    }

    #[test]
    fn derivation_is_deterministic() {
        let tree = tree_of(&["Intro", "Intro", "Next Steps"]);
        assert_eq!(slugs(&tree), slugs(&tree));
    }
}
