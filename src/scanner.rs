use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::syntax::{LinkNode, SyntaxTree};
use crate::types::Reference;

/// A URI scheme (`https:`, `mailto:`, `tel:`, ...) at the start of a target.
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Extract every local reference from a parsed document, in source order.
/// External URLs and targets matching a configured `ignore` pattern are skipped.
///
/// `source` must already be absolute and normalized; resolved targets are too.
///
/// # Panics
///
/// Panics if the hardcoded scheme regex is invalid (compile-time invariant).
pub fn extract_references(source: &Path, tree: &SyntaxTree, config: &Config) -> Vec<Reference> {
    return tree
        .links()
        .filter_map(|link| return parse_link_target(source, link, config))
        .collect();
}

/// Whether a target points off the local filesystem.
pub fn is_external(target: &str) -> bool {
    return target.starts_with("//") || SCHEME.is_match(target);
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop, and never pops a root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Try to turn a link node into a local reference.
/// Returns `None` for external or ignored targets.
fn parse_link_target(source: &Path, link: &LinkNode, config: &Config) -> Option<Reference> {
    let destination = link.destination.as_str();
    if is_external(destination) || config.is_ignored(&link.raw) {
        return None;
    }

    let (path_part, fragment) = match destination.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (destination, None),
    };
    let path_part = path_part.split_once('?').map_or(path_part, |(path, _query)| return path);

    let fragment = fragment.filter(|f| return !f.is_empty()).map(percent_decode);
    let target = resolve_target_path(source, &percent_decode(path_part), config.root.as_deref());

    return Some(Reference {
        fragment,
        kind: link.kind,
        line: link.line,
        raw: link.raw.clone(),
        source: source.to_path_buf(),
        target,
    });
}

/// Decode `%XX` escapes. Malformed escapes are kept literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut rest = bytes;

    while let Some((&byte, tail)) = rest.split_first() {
        if byte == b'%'
            && let Some(&[high, low]) = tail.get(..2)
            && let (Some(high), Some(low)) = (char::from(high).to_digit(16), char::from(low).to_digit(16))
            && let Ok(decoded) = u8::try_from(high.saturating_mul(16).saturating_add(low))
        {
            out.push(decoded);
            rest = tail.get(2..).unwrap_or(&[]);
            continue;
        }
        out.push(byte);
        rest = tail;
    }

    return String::from_utf8_lossy(&out).into_owned();
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when it is a normal name, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                },
                Some(Component::Prefix(_) | Component::RootDir) => {},
                Some(Component::CurDir | Component::ParentDir) | None => components.push(component),
            }
        },
        other => components.push(other),
    }
    return;
}

/// Resolve a decoded path component against the referencing document.
/// Empty means the document itself; `/abs` is taken from `root` when one is configured.
fn resolve_target_path(source: &Path, path: &str, root: Option<&Path>) -> PathBuf {
    if path.is_empty() {
        return source.to_path_buf();
    }

    let joined = match (path.strip_prefix('/'), root) {
        (Some(rooted), Some(root)) => root.join(rooted),
        _ => source.parent().unwrap_or_else(|| return Path::new("/")).join(path),
    };
    return normalize_path(&joined);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxNode;
    use crate::types::ReferenceKind;

    fn tree_of(destinations: &[&str]) -> SyntaxTree {
        let nodes = destinations
            .iter()
            .zip(1_u32..)
            .map(|(destination, line)| {
                return SyntaxNode::Link(LinkNode {
                    destination: (*destination).to_string(),
                    kind: ReferenceKind::Link,
                    line,
                    raw: (*destination).to_string(),
                });
            })
            .collect();
        return SyntaxTree { nodes };
    }

    fn extract(destinations: &[&str]) -> Vec<Reference> {
        let source = Path::new("/repo/docs/guide.md");
        return extract_references(source, &tree_of(destinations), &Config::default());
    }

    #[test]
    fn external_targets_are_skipped() {
        let refs = extract(&[
            "https://example.com",
            "http://example.com/a.md#x",
            "mailto:someone@example.com",
            "tel:+123",
            "ftp://host/file",
            "//cdn.example.com/x.js",
        ]);
        assert!(refs.is_empty(), "unexpected references: {refs:?}");
    }

    #[test]
    fn same_file_fragment_targets_source() {
        let refs = extract(&["#intro"]);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, PathBuf::from("/repo/docs/guide.md"));
        assert_eq!(refs[0].fragment.as_deref(), Some("intro"));
    }

    #[test]
    fn relative_path_resolves_against_source_directory() {
        let refs = extract(&["../src/lib.md#add", "./other.md", "sub/../peer.md"]);
        let targets: Vec<_> = refs.iter().map(|r| return r.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                PathBuf::from("/repo/src/lib.md"),
                PathBuf::from("/repo/docs/other.md"),
                PathBuf::from("/repo/docs/peer.md"),
            ]
        );
        assert_eq!(refs[0].fragment.as_deref(), Some("add"));
        assert_eq!(refs[1].fragment, None);
    }

    #[test]
    fn splits_on_first_hash_and_drops_query() {
        let refs = extract(&["a.md?plain=1#sec#tion", "b.md#"]);
        assert_eq!(refs[0].target, PathBuf::from("/repo/docs/a.md"));
        assert_eq!(refs[0].fragment.as_deref(), Some("sec#tion"));
        assert_eq!(refs[1].fragment, None);
        assert_eq!(refs[0].raw, "a.md?plain=1#sec#tion");
    }

    #[test]
    fn percent_escapes_are_decoded() {
        let refs = extract(&["my%20file.md#caf%C3%A9", "bad%zzescape.md"]);
        assert_eq!(refs[0].target, PathBuf::from("/repo/docs/my file.md"));
        assert_eq!(refs[0].fragment.as_deref(), Some("café"));
        assert_eq!(refs[1].target, PathBuf::from("/repo/docs/bad%zzescape.md"));
    }

    #[test]
    fn absolute_targets_use_configured_root() {
        let tree = tree_of(&["/guide/intro.md"]);
        let source = Path::new("/repo/docs/guide.md");

        let plain = extract_references(source, &tree, &Config::default());
        assert_eq!(plain[0].target, PathBuf::from("/guide/intro.md"));

        let config = Config { root: Some(PathBuf::from("/repo")), ..Config::default() };
        let rooted = extract_references(source, &tree, &config);
        assert_eq!(rooted[0].target, PathBuf::from("/repo/guide/intro.md"));
    }

    #[test]
    fn ignore_patterns_skip_targets() {
        let config = Config::from_toml(r#"ignore = ["^generated/"]"#).unwrap();
        let refs = extract_references(
            Path::new("/repo/a.md"),
            &tree_of(&["generated/api.md", "kept.md"]),
            &config,
        );
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].raw, "kept.md");
    }

    #[test]
    fn raw_keeps_escapes_while_target_is_decoded() {
        let link = LinkNode {
            destination: "a_b.md#Set_up".to_string(),
            kind: ReferenceKind::Link,
            line: 4,
            raw: "a\\_b.md#Set\\_up".to_string(),
        };
        let tree = SyntaxTree { nodes: vec![SyntaxNode::Link(link)] };
        let refs = extract_references(Path::new("/repo/index.md"), &tree, &Config::default());
        assert_eq!(refs[0].raw, "a\\_b.md#Set\\_up");
        assert_eq!(refs[0].target, PathBuf::from("/repo/a_b.md"));
        assert_eq!(refs[0].fragment.as_deref(), Some("Set_up"));
    }

    #[test]
    fn normalize_never_climbs_above_root() {
        assert_eq!(normalize_path(Path::new("/../a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("../x/../../y")), PathBuf::from("../../y"));
    }
}
