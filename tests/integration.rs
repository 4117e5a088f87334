use std::path::{Path, PathBuf};
use std::process::Command;

use check_markdown_links::{Config, Outcome, check};

fn fixture(name: &str) -> PathBuf {
    return Path::new("tests/fixtures").join(name);
}

fn links_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_check-markdown-links"));
    cmd.current_dir(dir);
    cmd.env("MARKDOWN_LINKS_LOG", "warn");
    return cmd;
}

/// Copy a fixture into a temp dir so a test can modify it.
fn scratch_copy(name: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(fixture(name)).unwrap() {
        let path = entry.unwrap().path();
        std::fs::copy(&path, dir.path().join(path.file_name().unwrap())).unwrap();
    }
    return dir;
}

#[test]
fn clean_fixture_has_no_broken_links() {
    let root = fixture("clean");
    let files = vec![root.join("README.md"), root.join("docs/guide.md")];
    let findings = check(&files, &Config::default());

    assert_eq!(findings.len(), 4, "{findings:#?}");
    assert!(findings.iter().all(|f| return f.outcome == Outcome::Valid), "{findings:#?}");
}

#[test]
fn broken_fixture_reports_in_source_order() {
    let root = fixture("broken");
    let files = vec![root.join("index.md"), root.join("other.md")];
    let findings = check(&files, &Config::default());

    let lines: Vec<u32> = findings.iter().map(|f| return f.line).collect();
    assert_eq!(lines, vec![3, 4, 5, 6]);
    assert!(matches!(findings[0].outcome, Outcome::MissingFile { .. }));
    assert!(matches!(findings[1].outcome, Outcome::MissingAnchor { .. }));
    assert!(matches!(findings[2].outcome, Outcome::MissingAnchor { .. }));
    assert_eq!(findings[3].outcome, Outcome::Valid);
}

#[test]
fn follow_validates_fragments_into_unlisted_files() {
    let root = fixture("broken");
    let files = vec![root.join("index.md")];

    let plain = check(&files, &Config::default());
    assert_eq!(plain[2].outcome, Outcome::Valid);

    let config = Config { follow_referenced: true, ..Config::default() };
    let followed = check(&files, &config);
    assert!(matches!(followed[2].outcome, Outcome::MissingAnchor { .. }));
    assert_eq!(followed[3].outcome, Outcome::Valid);
}

#[test]
fn binary_exits_zero_on_clean_tree() {
    let output = links_cmd(&fixture("clean")).output().unwrap();
    assert!(
        output.status.success(),
        "check failed: {}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn binary_reports_broken_links_as_text() {
    let output = links_cmd(&fixture("broken")).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("index.md:3: Referenced file 'gone.md' does not exist."), "{stdout}");
    assert!(stdout.contains("index.md:4: No heading #Setup exists in referenced file 'other.md'."), "{stdout}");
    assert!(stdout.contains("Did you mean #setup?"), "{stdout}");
    assert!(stdout.contains("    #usage\n"), "{stdout}");
}

#[test]
fn binary_json_lists_only_broken_findings() {
    let output = links_cmd(&fixture("broken")).args(["--format", "json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let outcomes: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|f| return f["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(outcomes, vec!["missing_file", "missing_anchor", "missing_anchor"]);
    assert_eq!(json[1]["fragment"], "Setup");
    assert_eq!(json[1]["available"][1], "setup");
}

#[test]
fn binary_exits_two_on_missing_path() {
    let output = links_cmd(&fixture("clean")).arg("no-such-dir").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Path Not Found"));
}

#[test]
fn fix_rewrites_suggested_fragments() {
    let dir = scratch_copy("broken");
    let output = links_cmd(dir.path()).arg("--fix").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("## Fixed"), "{stderr}");
    assert!(stderr.contains("## Unfixable"), "{stderr}");

    let index = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
    assert!(index.contains("[wrong case](other.md#setup)"), "{index}");
    assert!(index.contains("[no such heading](other.md#install)"), "{index}");

    let recheck = links_cmd(dir.path()).args(["--format", "json"]).output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&recheck.stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
}
