//! The corpus: every checked document, parsed once, keyed by normalized path.
//!
//! Building the corpus is the barrier between per-file work and resolution.
//! Once built it is read-only.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::anchor::derive_anchors;
use crate::config::Config;
use crate::error::Error;
use crate::scanner::{extract_references, normalize_path};
use crate::syntax::{MarkdownParser, SyntaxTree};
use crate::types::{Anchor, Reference};

/// Parsed documents plus, in caller order, what happened to each input file.
#[derive(Debug, Default)]
pub struct Corpus {
    /// Parsed documents by normalized absolute path, followed files included.
    documents: HashMap<PathBuf, Document>,
    /// Input files in caller order, duplicates removed.
    entries: Vec<CorpusEntry>,
}

/// What became of one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusEntry {
    /// Reading or parsing failed. The file is not in the document map.
    Failed {
        /// Best-effort one-based line of the failure.
        line: u32,
        /// Normalized path, or the path as given if it could not be made absolute.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },
    /// Parsed; look it up with `Corpus::document`.
    Parsed(PathBuf),
}

/// One parsed Markdown file.
#[derive(Debug)]
pub struct Document {
    /// Slugs of `anchors`, for membership tests.
    anchor_slugs: HashSet<String>,
    /// Heading anchors in document order.
    pub anchors: Vec<Anchor>,
    /// Normalized absolute path.
    pub path: PathBuf,
    /// Local references in source order.
    pub references: Vec<Reference>,
    /// The parsed structure the anchors and references came from.
    pub tree: SyntaxTree,
}

impl Corpus {
    /// Parse every file and assemble the corpus.
    /// Files that fail to read or parse become `CorpusEntry::Failed`; nothing aborts the build.
    pub fn build(files: &[PathBuf], config: &Config, parser: &dyn MarkdownParser) -> Self {
        let mut corpus = Self::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for file in files {
            let path = match std::path::absolute(file) {
                Ok(absolute) => normalize_path(&absolute),
                Err(err) => {
                    corpus.entries.push(CorpusEntry::Failed {
                        line: 1,
                        path: file.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                },
            };
            if !seen.insert(path.clone()) {
                continue;
            }

            match Document::load(&path, config, parser) {
                Ok(document) => {
                    tracing::debug!(
                        path = %path.display(),
                        anchors = document.anchors.len(),
                        references = document.references.len(),
                        "parsed"
                    );
                    corpus.entries.push(CorpusEntry::Parsed(path.clone()));
                    corpus.documents.insert(path, document);
                },
                Err(err) => {
                    tracing::debug!(path = %path.display(), error = %err, "parse failed");
                    corpus.entries.push(CorpusEntry::Failed {
                        line: failure_line(&err),
                        path,
                        reason: err.to_string(),
                    });
                },
            }
        }

        if config.follow_referenced {
            corpus.follow_referenced(config, parser);
        }

        return corpus;
    }

    /// A parsed document by normalized absolute path.
    pub fn document(&self, path: &Path) -> Option<&Document> {
        return self.documents.get(path);
    }

    /// Input files in caller order.
    pub fn entries(&self) -> &[CorpusEntry] {
        return &self.entries;
    }

    /// Parse Markdown files that are referenced with a fragment but were not
    /// given as input, so those fragments can be validated. Their own
    /// references are never checked. Files that fail to parse stay unknown.
    fn follow_referenced(&mut self, config: &Config, parser: &dyn MarkdownParser) {
        let wanted: BTreeSet<PathBuf> = self
            .documents
            .values()
            .flat_map(|document| return document.references.iter())
            .filter(|reference| {
                return reference.fragment.is_some()
                    && !self.documents.contains_key(&reference.target)
                    && is_markdown(&reference.target)
                    && reference.target.is_file();
            })
            .map(|reference| return reference.target.clone())
            .collect();

        for path in wanted {
            match Document::load(&path, config, parser) {
                Ok(document) => {
                    self.documents.insert(path, document);
                },
                Err(err) => tracing::debug!(path = %path.display(), error = %err, "referenced file not parsed"),
            }
        }
        return;
    }

    /// Number of documents parsed only because they were referenced.
    pub fn followed_count(&self) -> usize {
        let parsed = self
            .entries
            .iter()
            .filter(|entry| return matches!(entry, CorpusEntry::Parsed(_)))
            .count();
        return self.documents.len().saturating_sub(parsed);
    }
}

impl Document {
    /// Whether `slug` names one of this document's headings. Exact match.
    pub fn has_anchor(&self, slug: &str) -> bool {
        return self.anchor_slugs.contains(slug);
    }

    /// Read, decode, and parse one file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, `Error::InvalidUtf8` if it
    /// is not UTF-8, or whatever the parser reports.
    pub fn load(path: &Path, config: &Config, parser: &dyn MarkdownParser) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|err| {
            let valid = err.utf8_error().valid_up_to();
            let before = err.as_bytes().get(..valid).unwrap_or_default();
            let newlines = before.iter().filter(|&&byte| return byte == b'\n').count();
            return Error::InvalidUtf8 {
                file: path.to_path_buf(),
                line: u32::try_from(newlines).unwrap_or(u32::MAX).saturating_add(1),
            };
        })?;

        let tree = parser.parse(path, &text)?;
        return Ok(Self::new(path.to_path_buf(), tree, config));
    }

    /// Derive anchors and references from an already parsed tree.
    pub fn new(path: PathBuf, tree: SyntaxTree, config: &Config) -> Self {
        let anchors = derive_anchors(&tree);
        let anchor_slugs = anchors.iter().map(|anchor| return anchor.slug.clone()).collect();
        let references = extract_references(&path, &tree, config);
        return Self { anchor_slugs, anchors, path, references, tree };
    }
}

/// Best-effort line to report a load failure at.
const fn failure_line(err: &Error) -> u32 {
    return match err {
        Error::InvalidUtf8 { line, .. } => *line,
        _ => 1,
    };
}

/// Whether a path names a Markdown file by extension.
fn is_markdown(path: &Path) -> bool {
    return path
        .extension()
        .is_some_and(|ext| return ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"));
}
