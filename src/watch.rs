//! File watcher: runs `check` on startup, then re-runs on Markdown changes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use check_markdown_links::config::Config;
use check_markdown_links::diagnostics;
use check_markdown_links::error::Error;
use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, CheckArgs};

/// Debounce delay between filesystem events and re-check.
const DEBOUNCE_MS: u64 = 100;

/// Directories to watch: each directory argument recursively, and the
/// parent of each file argument non-recursively.
fn collect_watch_targets(paths: &[PathBuf]) -> BTreeMap<PathBuf, RecursiveMode> {
    let mut targets = BTreeMap::new();
    for path in paths {
        if path.is_dir() {
            targets.insert(path.clone(), RecursiveMode::Recursive);
            continue;
        }
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) | None => PathBuf::from("."),
        };
        targets.entry(parent).or_insert(RecursiveMode::NonRecursive);
    }
    return targets;
}

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(tx: crossbeam_channel::Sender<()>) -> Result<notify::RecommendedWatcher, Error> {
    let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(());
        }
    })?;
    return Ok(watcher);
}

/// Entry point for `--watch`.
///
/// Runs an initial check, then watches the checked paths and re-checks on
/// changes. Returns the exit code of the last check once the watcher stops.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created or attached.
pub fn run(args: &CheckArgs, config: &Config) -> Result<ExitCode, Error> {
    tracing::info!("watch: initial check");
    let mut last_code = run_check(args, config);

    let targets = collect_watch_targets(&args.paths);
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    for (dir, mode) in &targets {
        watcher.watch(dir, *mode)?;
    }

    let dir_count = targets.len();
    tracing::info!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        tracing::info!("watch: change detected, re-checking...");
        last_code = run_check(args, config);
    }

    return Ok(last_code);
}

/// Run check once and print the result. Errors are printed, not returned.
fn run_check(args: &CheckArgs, config: &Config) -> ExitCode {
    return match commands::check(args, config) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}
