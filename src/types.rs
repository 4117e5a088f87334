/// Core domain types: anchors, references, and the findings they resolve to.
use std::path::PathBuf;

use serde::Serialize;

/// A heading anchor derived from one heading of a document.
/// Slugs are unique within their document once disambiguated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Disambiguated slug, usable as a `#fragment`.
    pub slug: String,
    /// Plain text of the heading the slug came from.
    pub text: String,
}

/// The result of resolving one reference, or of failing to parse one file.
/// Carries enough context for a `path:line: message` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Reference kind. `None` for whole-file parse errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ReferenceKind>,
    /// One-based line in the source document.
    pub line: u32,
    /// What the resolver concluded.
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Markdown document containing the reference.
    pub source: PathBuf,
    /// Raw target text as written in the document.
    pub target: String,
}

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Target file exists but has no heading with the requested slug.
    MissingAnchor {
        /// Slugs the target does define, in document order.
        available: Vec<String>,
        /// The fragment that failed to match.
        fragment: String,
        /// Resolved target file.
        path: PathBuf,
    },
    /// Target does not resolve to a known document or a file on disk.
    MissingFile {
        /// Resolved target path.
        path: PathBuf,
    },
    /// The source document could not be read or parsed.
    ParseError {
        /// Human-readable cause.
        reason: String,
    },
    /// Nothing wrong.
    Valid,
}

/// One outbound local reference found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Decoded fragment after the first `#`, if non-empty.
    pub fragment: Option<String>,
    /// Link, image, or link reference definition.
    pub kind: ReferenceKind,
    /// One-based line number of the reference in the source file.
    pub line: u32,
    /// Target text exactly as written.
    pub raw: String,
    /// Markdown file containing this reference (normalized, absolute).
    pub source: PathBuf,
    /// Resolved target path (normalized, absolute). Equals `source` for `#fragment` links.
    pub target: PathBuf,
}

/// Syntactic origin of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// `[label]: target` link reference definition.
    Definition,
    /// `![alt](target)`.
    Image,
    /// `[text](target)` or an autolink.
    Link,
}

impl Finding {
    /// Whether this finding should fail a run.
    pub const fn is_broken(&self) -> bool {
        return !matches!(self.outcome, Outcome::Valid);
    }
}
