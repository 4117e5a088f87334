//! Rewrite mistyped heading fragments to the anchor they most likely meant.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::diagnostics::{display_path, find_closest_suggestion};
use crate::error::Error;
use crate::types::{Finding, Outcome};

/// A pending rewrite of one link target on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixAction {
    /// The Markdown file to rewrite.
    pub file: PathBuf,
    /// The 1-based line number where the target appears.
    pub line: u32,
    /// Target text to write instead.
    pub new_target: String,
    /// Target text as currently written.
    pub old_target: String,
}

/// Rewrite files in place. Each file is read once and written at most once.
///
/// Returns the fixes whose old target was not found on their line, such as a
/// destination written on a later line than the link's opening bracket.
///
/// # Errors
///
/// Returns `Error::Io` if any Markdown file cannot be read or written.
pub fn apply_fixes(fixes: &[FixAction]) -> Result<Vec<&FixAction>, Error> {
    let mut by_file: HashMap<&PathBuf, Vec<&FixAction>> = HashMap::new();
    for fix in fixes {
        by_file.entry(&fix.file).or_default().push(fix);
    }

    let mut missed = Vec::new();
    for (path, file_fixes) in &by_file {
        let content = std::fs::read_to_string(path)?;
        let mut lines: Vec<String> = content.split_inclusive('\n').map(String::from).collect();

        let mut rewritten = 0_usize;
        for fix in file_fixes {
            if rewrite_target_on_line(&mut lines, fix) {
                rewritten = rewritten.saturating_add(1);
            } else {
                missed.push(*fix);
            }
        }

        if rewritten > 0 {
            std::fs::write(path, lines.concat())?;
            tracing::debug!(path = %path.display(), count = rewritten, "rewrote");
        }
    }

    missed.sort_by(|a, b| return (&a.file, a.line).cmp(&(&b.file, b.line)));
    return Ok(missed);
}

/// Sort broken findings into fixable (a suggestion exists) and unfixable ones.
/// Only missing anchors are ever fixable.
pub fn plan_fixes(findings: &[Finding]) -> (Vec<FixAction>, Vec<&Finding>) {
    let mut fixes = Vec::new();
    let mut unfixable = Vec::new();

    for finding in findings.iter().filter(|finding| return finding.is_broken()) {
        let suggestion = match &finding.outcome {
            Outcome::MissingAnchor { available, fragment, .. } => find_closest_suggestion(fragment, available),
            Outcome::MissingFile { .. } | Outcome::ParseError { .. } | Outcome::Valid => None,
        };
        let Some(suggestion) = suggestion else {
            unfixable.push(finding);
            continue;
        };

        let path_part = finding.target.split_once('#').map_or(finding.target.as_str(), |(path, _)| return path);
        fixes.push(FixAction {
            file: finding.source.clone(),
            line: finding.line,
            new_target: format!("{path_part}#{suggestion}"),
            old_target: finding.target.clone(),
        });
    }

    return (fixes, unfixable);
}

/// Markdown summary of what was fixed and what wasn't.
/// `missed` are planned fixes that `apply_fixes` could not place.
pub fn render_fix_report(fixes: &[FixAction], missed: &[&FixAction], unfixable: &[&Finding]) -> String {
    let mut out = String::new();

    let fixed: Vec<&FixAction> = fixes
        .iter()
        .filter(|fix| return !missed.iter().any(|miss| return std::ptr::eq(*miss, *fix)))
        .collect();
    if !fixed.is_empty() {
        out.push_str("## Fixed\n\n");
        for fix in fixed {
            let _ = writeln!(
                out,
                "- {}:{}  `{}` -> `{}`",
                display_path(&fix.file).display(),
                fix.line,
                fix.old_target,
                fix.new_target,
            );
        }
        out.push('\n');
    }

    if !missed.is_empty() || !unfixable.is_empty() {
        out.push_str("## Unfixable\n\n");
        for fix in missed {
            let _ = writeln!(
                out,
                "- {}:{}  `{}` (not found on that line)",
                display_path(&fix.file).display(),
                fix.line,
                fix.old_target,
            );
        }
        for finding in unfixable {
            let _ = writeln!(
                out,
                "- {}:{}  `{}`",
                display_path(&finding.source).display(),
                finding.line,
                finding.target,
            );
        }
        out.push('\n');
    }

    return out;
}

/// Replace the first occurrence of the old target on the fix's line.
/// Returns whether anything was replaced.
fn rewrite_target_on_line(lines: &mut [String], fix: &FixAction) -> bool {
    let idx = usize::try_from(fix.line).unwrap_or(0).saturating_sub(1);
    let Some(line) = lines.get_mut(idx) else {
        return false;
    };
    if !line.contains(fix.old_target.as_str()) {
        return false;
    }
    *line = line.replacen(fix.old_target.as_str(), &fix.new_target, 1);
    return true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReferenceKind;

    fn missing_anchor(source: PathBuf, line: u32, target: &str, fragment: &str) -> Finding {
        return Finding {
            kind: Some(ReferenceKind::Link),
            line,
            outcome: Outcome::MissingAnchor {
                available: vec!["setup".to_string(), "usage".to_string()],
                fragment: fragment.to_string(),
                path: PathBuf::from("/repo/other.md"),
            },
            source,
            target: target.to_string(),
        };
    }

    #[test]
    fn plans_only_findings_with_a_suggestion() {
        let source = PathBuf::from("/repo/index.md");
        let findings = vec![
            missing_anchor(source.clone(), 3, "other.md#Setup", "Setup"),
            missing_anchor(source.clone(), 4, "other.md#install", "install"),
            Finding {
                kind: Some(ReferenceKind::Link),
                line: 5,
                outcome: Outcome::MissingFile { path: PathBuf::from("/repo/gone.md") },
                source,
                target: "gone.md".to_string(),
            },
        ];

        let (fixes, unfixable) = plan_fixes(&findings);
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].old_target, "other.md#Setup");
        assert_eq!(fixes[0].new_target, "other.md#setup");
        assert_eq!(unfixable.len(), 2);
    }

    #[test]
    fn rewrites_targets_and_preserves_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.md");
        std::fs::write(&path, "# Index\r\n\r\nSee [s](other.md#Setup) and [u](#Usage).\r\n").unwrap();

        let fixes = vec![
            FixAction {
                file: path.clone(),
                line: 3,
                new_target: "other.md#setup".to_string(),
                old_target: "other.md#Setup".to_string(),
            },
            FixAction {
                file: path.clone(),
                line: 3,
                new_target: "#usage".to_string(),
                old_target: "#Usage".to_string(),
            },
        ];
        assert!(apply_fixes(&fixes).unwrap().is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# Index\r\n\r\nSee [s](other.md#setup) and [u](#usage).\r\n");
    }

    #[test]
    fn report_lists_both_sections() {
        let fix = FixAction {
            file: PathBuf::from("/repo/index.md"),
            line: 3,
            new_target: "#setup".to_string(),
            old_target: "#Setup".to_string(),
        };
        let broken = missing_anchor(PathBuf::from("/repo/index.md"), 4, "#nope", "nope");
        let report = render_fix_report(&[fix], &[], &[&broken]);
        assert!(report.contains("## Fixed"));
        assert!(report.contains("`#Setup` -> `#setup`"));
        assert!(report.contains("## Unfixable"));
        assert!(report.contains("`#nope`"));
    }

    #[test]
    fn escaped_fragment_is_rewritten_as_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.md");
        std::fs::write(&path, "# Set_up\n\n[x](#Set\\_up)\n").unwrap();

        let findings = crate::check(std::slice::from_ref(&path), &crate::Config::default());
        assert_eq!(findings[0].target, "#Set\\_up");

        let (fixes, unfixable) = plan_fixes(&findings);
        assert!(unfixable.is_empty());
        assert!(apply_fixes(&fixes).unwrap().is_empty());

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# Set_up\n\n[x](#set_up)\n");
        let recheck = crate::check(&[path], &crate::Config::default());
        assert!(recheck.iter().all(|f| return !f.is_broken()), "{recheck:?}");
    }

    #[test]
    fn target_on_a_later_line_is_reported_not_fixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.md");
        let original = "# Setup\n\n[x](\n#Setup)\n";
        std::fs::write(&path, original).unwrap();

        let findings = crate::check(std::slice::from_ref(&path), &crate::Config::default());
        assert_eq!(findings.len(), 1);
        let (fixes, _) = plan_fixes(&findings);
        assert_eq!(fixes.len(), 1);

        let missed = apply_fixes(&fixes).unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        let report = render_fix_report(&fixes, &missed, &[]);
        assert!(!report.contains("## Fixed"), "{report}");
        assert!(report.contains("## Unfixable"), "{report}");
        assert!(report.contains("`#Setup` (not found on that line)"), "{report}");
    }
}
