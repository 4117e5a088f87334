//! Cross-check every reference in the corpus against its file and anchor universe.

use crate::config::Config;
use crate::corpus::{Corpus, CorpusEntry};
use crate::types::{Finding, Outcome, Reference};

/// Resolve every reference of every input file.
///
/// Findings follow the caller's file order, then source order within a file.
/// A file that failed to parse contributes exactly one `ParseError` finding.
pub fn resolve(corpus: &Corpus, config: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();

    for entry in corpus.entries() {
        match entry {
            CorpusEntry::Failed { line, path, reason } => findings.push(Finding {
                kind: None,
                line: *line,
                outcome: Outcome::ParseError { reason: reason.clone() },
                source: path.clone(),
                target: String::new(),
            }),
            CorpusEntry::Parsed(path) => {
                let Some(document) = corpus.document(path) else {
                    continue;
                };
                findings.extend(document.references.iter().map(|reference| {
                    return Finding {
                        kind: Some(reference.kind),
                        line: reference.line,
                        outcome: resolve_reference(corpus, config, reference),
                        source: reference.source.clone(),
                        target: reference.raw.clone(),
                    };
                }));
            },
        }
    }

    return findings;
}

/// Resolve one reference.
///
/// A target that is a parsed document has its fragment checked against the
/// document's anchors. A target that only exists on disk is valid without
/// fragment checking, since its anchors were never derived. Directories are
/// missing unless `allow_directories` is set.
pub fn resolve_reference(corpus: &Corpus, config: &Config, reference: &Reference) -> Outcome {
    if let Some(document) = corpus.document(&reference.target) {
        return match &reference.fragment {
            Some(fragment) if !document.has_anchor(fragment) => Outcome::MissingAnchor {
                available: document.anchors.iter().map(|anchor| return anchor.slug.clone()).collect(),
                fragment: fragment.clone(),
                path: document.path.clone(),
            },
            Some(_) | None => Outcome::Valid,
        };
    }

    let exists = std::fs::metadata(&reference.target).is_ok_and(|meta| {
        return meta.is_file() || (meta.is_dir() && config.allow_directories);
    });
    if exists {
        return Outcome::Valid;
    }

    return Outcome::MissingFile { path: reference.target.clone() };
}
