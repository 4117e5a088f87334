//! Human- and machine-readable rendering of findings and errors.

use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use crate::anchor::slugify;
use crate::error::Error;
use crate::types::{Finding, Outcome};

/// ANSI bold, for Markdown headings on a terminal.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Report format for broken findings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// A pretty-printed JSON array.
    Json,
    /// `path:line: message` blocks.
    #[default]
    Text,
}

/// Path relative to the working directory, for messages. Falls back to the path as given.
pub fn display_path(path: &Path) -> PathBuf {
    let Ok(cwd) = std::env::current_dir() else {
        return path.to_path_buf();
    };
    return relative_path(path, &cwd).unwrap_or_else(|| return path.to_path_buf());
}

/// Suggest the anchor a mistyped fragment most likely meant: the fragment's own slug.
pub fn find_closest_suggestion(fragment: &str, available: &[String]) -> Option<String> {
    let slug = slugify(fragment);
    if slug == fragment {
        return None;
    }
    return available.iter().find(|candidate| return **candidate == slug).cloned();
}

/// Render an error as Markdown with bold headings and print it to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// `path` expressed relative to `base`, walking up with `..` as needed.
/// `None` when the two share no root (different drives on Windows).
fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    let path_components: Vec<Component<'_>> = path.components().collect();
    let base_components: Vec<Component<'_>> = base.components().collect();

    let common = path_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| return a == b)
        .count();
    if common == 0 && path.is_absolute() {
        return None;
    }

    let mut relative = PathBuf::new();
    for _ in base_components.iter().skip(common) {
        relative.push("..");
    }
    for component in path_components.iter().skip(common) {
        relative.push(component);
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    return Some(relative);
}

/// Render an error as a structured Markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::InvalidPattern { pattern, source } => format!(
            "\
# Error: Invalid Ignore Pattern

`{pattern}` is not a valid regular expression:

    {source}

## Fix

Correct the `ignore` list in `.markdown-links.toml`.
"
        ),
        Error::PathNotFound { path } => format!(
            "\
# Error: Path Not Found

`{}` does not exist.

## Fix

Pass Markdown files, or directories containing them:

    check-markdown-links README.md docs/
",
            path.display()
        ),
        Error::TomlDe(err) => format!(
            "\
# Error: Invalid Config

`.markdown-links.toml` could not be read:

{err}
"
        ),
        Error::Watch(err) => format!(
            "\
# Error: Watch Failed

{err}
"
        ),
        Error::FileTooLarge { .. }
        | Error::InvalidUtf8 { .. }
        | Error::Io(_)
        | Error::Json(_)
        | Error::ParseFailed { .. } => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Render one finding as a `path:line: message` block. Valid findings render as nothing.
///
/// The source is shown as an absolute path so editors can open it; targets
/// are shown relative to the working directory.
pub fn render_finding(finding: &Finding) -> String {
    let location = format!("{}:{}", finding.source.display(), finding.line);

    return match &finding.outcome {
        Outcome::MissingAnchor { available, fragment, path } => {
            render_missing_anchor(&location, fragment, path, available)
        },
        Outcome::MissingFile { path } => format!(
            "{location}: Referenced file '{}' does not exist.\n",
            display_path(path).display()
        ),
        Outcome::ParseError { reason } => format!("{location}: Could not parse file: {reason}\n"),
        Outcome::Valid => String::new(),
    };
}

/// Render the broken findings in the requested format.
///
/// # Errors
///
/// Returns `Error::Json` if JSON serialization fails.
pub fn render_report(findings: &[Finding], format: Format) -> Result<String, Error> {
    let broken: Vec<&Finding> = findings.iter().filter(|finding| return finding.is_broken()).collect();

    return match format {
        Format::Json => {
            let mut out = serde_json::to_string_pretty(&broken)?;
            out.push('\n');
            Ok(out)
        },
        Format::Text => Ok(broken.into_iter().map(render_finding).collect()),
    };
}

/// Missing-heading block: what was asked for, a suggestion, and what exists.
fn render_missing_anchor(location: &str, fragment: &str, path: &Path, available: &[String]) -> String {
    let mut out = format!(
        "{location}: No heading #{fragment} exists in referenced file '{}'.\n",
        display_path(path).display()
    );

    if let Some(suggestion) = find_closest_suggestion(fragment, available) {
        let _ = writeln!(out, "Did you mean #{suggestion}?");
    }

    if available.is_empty() {
        out.push_str("The referenced file has no headings.\n");
    } else {
        out.push_str("The following headings are available:\n");
        for slug in available {
            let _ = writeln!(out, "    #{slug}");
        }
    }

    out.push('\n');
    return out;
}
