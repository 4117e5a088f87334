//! Check Markdown files for links to local files and headings that do not exist.
//!
//! The pipeline is: parse each file into a [`syntax::SyntaxTree`], derive its
//! heading [`types::Anchor`]s, extract local [`types::Reference`]s, collect
//! everything into a [`corpus::Corpus`], then [`resolver::resolve`] each
//! reference against the corpus and the filesystem.
//!
//! ```no_run
//! use std::path::PathBuf;
//!
//! use check_markdown_links::{Config, check};
//!
//! let findings = check(&[PathBuf::from("README.md")], &Config::default());
//! let broken = findings.iter().filter(|finding| return finding.is_broken()).count();
//! println!("{broken} broken links");
//! ```

pub mod anchor;
pub mod config;
pub mod corpus;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod fix;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod syntax;
pub mod types;

use std::path::PathBuf;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::parser::TreeSitterMarkdown;
pub use crate::syntax::MarkdownParser;
pub use crate::types::{Anchor, Finding, Outcome, Reference, ReferenceKind};

/// Check `files` with the tree-sitter Markdown parser.
///
/// Returns one finding per local reference (valid ones included) and one
/// `ParseError` finding per file that could not be parsed, in input order.
pub fn check(files: &[PathBuf], config: &Config) -> Vec<Finding> {
    return check_with(files, config, &TreeSitterMarkdown);
}

/// Check `files` with a caller-supplied parser.
pub fn check_with(files: &[PathBuf], config: &Config, parser: &dyn MarkdownParser) -> Vec<Finding> {
    let corpus = corpus::Corpus::build(files, config, parser);
    return resolver::resolve(&corpus, config);
}
