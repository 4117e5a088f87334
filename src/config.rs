use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Error;

/// Name of the optional config file, looked up in the working directory.
pub const CONFIG_FILE: &str = ".markdown-links.toml";

/// Checker configuration loaded from `.markdown-links.toml`.
/// Include/exclude patterns are path prefixes applied during directory walks;
/// ignore patterns are regexes matched against raw link targets.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Accept links whose target is an existing directory.
    pub allow_directories: bool,
    /// Skip walked files whose relative path starts with any of these.
    pub exclude: Vec<String>,
    /// Parse referenced Markdown files outside the checked set to validate fragments into them.
    pub follow_referenced: bool,
    /// Raw targets matching any of these are not checked.
    pub ignore: Vec<Regex>,
    /// When non-empty, only walked files starting with one of these are checked.
    pub include: Vec<String>,
    /// Base directory for `/absolute` link targets. Absolute when set.
    pub root: Option<PathBuf>,
}

/// Raw TOML structure for `.markdown-links.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct MarkdownLinksToml {
    /// See `Config::allow_directories`.
    #[serde(default)]
    allow_directories: bool,
    /// See `Config::exclude`.
    #[serde(default)]
    exclude: Vec<String>,
    /// See `Config::follow_referenced`.
    #[serde(default)]
    follow_referenced: bool,
    /// Uncompiled `Config::ignore` patterns.
    #[serde(default)]
    ignore: Vec<String>,
    /// See `Config::include`.
    #[serde(default)]
    include: Vec<String>,
    /// Link root, relative to the config file's directory.
    root: Option<PathBuf>,
}

impl Config {
    /// Parse config from TOML text. A relative `root` is kept as written.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidPattern` if an ignore pattern is not a valid regex.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let raw: MarkdownLinksToml = toml::from_str(content)?;

        let ignore = raw
            .ignore
            .into_iter()
            .map(|pattern| {
                return Regex::new(&pattern).map_err(|source| return Error::InvalidPattern { pattern, source });
            })
            .collect::<Result<Vec<_>, _>>()?;

        return Ok(Self {
            allow_directories: raw.allow_directories,
            exclude: raw.exclude,
            follow_referenced: raw.follow_referenced,
            ignore,
            include: raw.include,
            root: raw.root,
        });
    }

    /// Whether a raw link target matches an ignore pattern.
    pub fn is_ignored(&self, raw_target: &str) -> bool {
        return self.ignore.iter().any(|pattern| return pattern.is_match(raw_target));
    }

    /// Load config from `.markdown-links.toml` in the given directory.
    /// Returns the default if the file doesn't exist.
    /// Returns an error if the file exists but is malformed. Never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed,
    /// or `Error::InvalidPattern` for a bad ignore pattern.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let path = dir.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        let mut config = Self::from_toml(&content)?;
        if let Some(root) = config.root.take() {
            config.root = Some(std::path::absolute(dir.join(root))?);
        }
        tracing::debug!(path = %path.display(), "loaded config");

        return Ok(config);
    }

    /// Check whether a walked Markdown file should be checked.
    ///
    /// A path is included if no include patterns are set, or if it starts
    /// with at least one of them. An included path is then excluded if it
    /// starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}
