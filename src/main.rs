mod commands;
mod watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use check_markdown_links::config::Config;
use check_markdown_links::diagnostics::{self, Format};
use check_markdown_links::error::Error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::CheckArgs;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "MARKDOWN_LINKS_LOG";

#[derive(Parser)]
#[command(
    name = "check-markdown-links",
    version,
    about = "Check the specified Markdown files for invalid links to local files."
)]
struct Cli {
    /// Accept links that point at an existing directory.
    #[arg(long)]
    allow_directories: bool,
    /// Files or directories to check. Directories are searched for `*.md` files.
    #[arg(default_value = ".")]
    files: Vec<PathBuf>,
    /// Rewrite mistyped heading fragments to the heading they match.
    #[arg(long)]
    fix: bool,
    /// Also parse referenced Markdown files outside the checked set to validate their headings.
    #[arg(long)]
    follow: bool,
    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Only log warnings and errors.
    #[arg(short, long)]
    quiet: bool,
    /// Directory that `/absolute` link targets are relative to.
    #[arg(long)]
    root: Option<PathBuf>,
    /// Re-check whenever a watched file changes.
    #[arg(long)]
    watch: bool,
}

/// Log to stderr, filtered by `MARKDOWN_LINKS_LOG` or the verbosity flag.
fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| return EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
    return;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    return match run(cli) {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::from(2_u8)
        },
    };
}

/// Load config, apply CLI overrides, and dispatch to check or watch.
///
/// # Errors
///
/// Returns errors from config loading, path discovery, reporting, or the watcher.
fn run(cli: Cli) -> Result<ExitCode, Error> {
    let mut config = Config::load(Path::new("."))?;
    config.allow_directories |= cli.allow_directories;
    config.follow_referenced |= cli.follow;
    if let Some(root) = cli.root {
        config.root = Some(std::path::absolute(root)?);
    }

    let args = CheckArgs { fix: cli.fix, format: cli.format, paths: cli.files };

    if cli.watch {
        return watch::run(&args, &config);
    }
    return commands::check(&args, &config);
}
