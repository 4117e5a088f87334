/// Crate-level error types for check-markdown-links diagnostics.
use std::path::PathBuf;

/// All errors carry enough context to produce a useful diagnostic without a
/// debugger. Each variant names the file, pattern, or reason for failure.
///
/// Per-file problems (unreadable, undecodable, unparsable documents) are turned
/// into findings by the corpus loader; only caller-level problems reach the
/// user as an `Error`.
#[allow(clippy::error_impl_error, reason = "crate error type, re-exported as the library error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Document exceeds the size limit the parser accepts.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// An `ignore` pattern from the config is not a valid regular expression.
    #[error("invalid ignore pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The pattern as written in the config.
        pattern: String,
        /// The regex compiler's complaint.
        source: regex::Error,
    },

    /// Document bytes are not valid UTF-8.
    #[error("invalid UTF-8 at line {line}: {}", file.display())]
    InvalidUtf8 {
        /// File containing the invalid bytes.
        file: PathBuf,
        /// One-based line of the first invalid byte.
        line: u32,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of findings failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// The Markdown grammar could not be loaded or produced no tree.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A file or directory named on the command line does not exist.
    #[error("path not found: {}", path.display())]
    PathNotFound {
        /// The path as given by the caller.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// The filesystem watcher could not be created or attached.
    #[error("watch: {0}")]
    Watch(
        /// The wrapped watcher error.
        #[from]
        notify::Error,
    ),
}
