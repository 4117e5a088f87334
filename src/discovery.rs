//! Expand command-line paths into the Markdown files to check.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::Error;

/// Expand files and directories into a list of Markdown files, in argument order.
/// Directories are walked recursively (sorted by name, hidden entries skipped)
/// and filtered by the config's include/exclude prefixes. Files are taken as given.
///
/// # Errors
///
/// Returns `Error::PathNotFound` for a path that does not exist.
pub fn discover(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let found = walk_markdown_files(path, config);
            if found.is_empty() {
                tracing::warn!("No files ending in '.md' found in '{}'.", path.display());
            }
            files.extend(found);
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(Error::PathNotFound { path: path.clone() });
        }
    }

    return Ok(files);
}

/// Dotfiles and dot-directories.
fn is_hidden(entry: &DirEntry) -> bool {
    return entry.file_name().to_str().is_some_and(|name| return name.starts_with('.'));
}

/// All `.md` files below `dir` that the config wants scanned.
fn walk_markdown_files(dir: &Path, config: &Config) -> Vec<PathBuf> {
    return WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| return entry.depth() == 0 || !is_hidden(entry))
        .filter_map(Result::ok)
        .filter(|entry| {
            return entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| return ext == "md");
        })
        .filter(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap_or_else(|_err| return entry.path());
            return config.should_scan(&relative.to_string_lossy());
        })
        .map(DirEntry::into_path)
        .collect();
}
