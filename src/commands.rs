//! The check command: discover, parse, resolve, report, optionally fix.

use std::path::PathBuf;
use std::process::ExitCode;

use check_markdown_links::config::Config;
use check_markdown_links::corpus::Corpus;
use check_markdown_links::diagnostics::{self, Format};
use check_markdown_links::error::Error;
use check_markdown_links::{TreeSitterMarkdown, discovery, fix, resolver};

/// What to check and how to report it.
#[derive(Debug, Clone)]
pub struct CheckArgs {
    /// Rewrite fragments that have an obvious correction.
    pub fix: bool,
    /// Report format for stdout.
    pub format: Format,
    /// Files and directories as given on the command line.
    pub paths: Vec<PathBuf>,
}

/// Check every Markdown file under `args.paths` and print the broken findings.
///
/// Exit code 1 when anything is broken, success otherwise.
///
/// # Errors
///
/// Returns `Error::PathNotFound` for a missing argument, `Error::Json` if the
/// report cannot be serialized, or `Error::Io` if a fix cannot be written.
pub fn check(args: &CheckArgs, config: &Config) -> Result<ExitCode, Error> {
    let files = discovery::discover(&args.paths, config)?;
    let corpus = Corpus::build(&files, config, &TreeSitterMarkdown);
    let findings = resolver::resolve(&corpus, config);

    print!("{}", diagnostics::render_report(&findings, args.format)?);

    let links = findings.iter().filter(|finding| return finding.kind.is_some()).count();
    let file_count = corpus.entries().len();
    tracing::info!("Checked {links} links in {file_count} files.");
    let followed = corpus.followed_count();
    if followed > 0 {
        tracing::info!("Parsed {followed} additional referenced files.");
    }

    if args.fix {
        let (fixes, unfixable) = fix::plan_fixes(&findings);
        let missed = fix::apply_fixes(&fixes)?;
        eprint!("{}", fix::render_fix_report(&fixes, &missed, &unfixable));
    }

    if findings.iter().any(|finding| return finding.is_broken()) {
        return Ok(ExitCode::from(1));
    }

    return Ok(ExitCode::SUCCESS);
}
