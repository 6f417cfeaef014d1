//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use eloquent_core::{Eloquent, ReadProgress};
use eloquent_shared::{FileDictionary, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tracing::info;

use crate::lint::LintPlugin;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Eloquent - read a directory tree and run it through plugins.
#[derive(Parser)]
#[command(
    name = "eloquent",
    version,
    about = "Read a directory tree into memory and run it through a plugin pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Overrides applied on top of `eloquent.toml`.
#[derive(Args, Debug, Default)]
pub(crate) struct ReadArgs {
    /// Source directory, relative to the root directory.
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Maximum number of files read at once.
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Name, path, or glob to skip (repeatable).
    #[arg(short, long)]
    pub ignore: Vec<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Report every match of a regex in every line of every file.
    Lint {
        /// Root directory.
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Regular expression to look for.
        #[arg(short, long)]
        pattern: String,

        /// Exit with an error when anything matches.
        #[arg(long)]
        deny: bool,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// List the files that would be read, with their line counts.
    List {
        /// Root directory.
        #[arg(default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        read: ReadArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default eloquent.toml into the root directory.
    Init {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Show the resolved configuration.
    Show {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "eloquent=info",
        1 => "eloquent=debug",
        _ => "eloquent=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Lint {
            dir,
            pattern,
            deny,
            read,
        } => cmd_lint(&dir, &pattern, deny, &read).await,
        Command::List { dir, read } => cmd_list(&dir, &read).await,
        Command::Config { action } => match action {
            ConfigAction::Init { dir } => cmd_config_init(&dir),
            ConfigAction::Show { dir } => cmd_config_show(&dir),
        },
    }
}

/// Build an `Eloquent` from `eloquent.toml` plus command-line overrides.
fn builder(dir: &Path, args: &ReadArgs) -> Result<Eloquent> {
    let mut eloquent = Eloquent::from_root(dir)?;
    if let Some(source) = &args.source {
        eloquent.set_source(source)?;
    }
    if let Some(max) = args.concurrency {
        eloquent.set_concurrency(max)?;
    }
    eloquent.ignore(&args.ignore)?;
    Ok(eloquent)
}

/// Process with a spinner on stderr, cleared whether or not processing succeeds.
async fn process(eloquent: &mut Eloquent, progress: Arc<CliProgress>) -> Result<FileDictionary> {
    eloquent.set_read_progress(progress.clone());
    let outcome = eloquent.process().await;
    progress.finish();
    Ok(outcome?)
}

async fn cmd_lint(dir: &Path, pattern: &str, deny: bool, args: &ReadArgs) -> Result<()> {
    let regex = Regex::new(pattern).map_err(|e| eyre!("invalid pattern '{pattern}': {e}"))?;
    let plugin = Arc::new(LintPlugin::new(regex, deny));

    let mut eloquent = builder(dir, args)?;
    eloquent.use_shared(plugin.clone());

    info!(dir = %eloquent.directory().display(), pattern, "linting");
    let files = process(&mut eloquent, Arc::new(CliProgress::new())).await?;

    println!();
    println!("  Files:    {}", files.len());
    println!("  Findings: {}", plugin.findings());
    println!();

    Ok(())
}

async fn cmd_list(dir: &Path, args: &ReadArgs) -> Result<()> {
    let mut eloquent = builder(dir, args)?;
    let files = process(&mut eloquent, Arc::new(CliProgress::new())).await?;

    for (name, record) in &files {
        println!("{name}\t{}", record.lines.len());
    }

    Ok(())
}

fn cmd_config_init(dir: &Path) -> Result<()> {
    let path = init_config(dir)?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_config_show(dir: &Path) -> Result<()> {
    let config = load_config(dir)?;
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner.set_message("Walking source tree");
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ReadProgress for CliProgress {
    fn walked(&self, total: usize) {
        if total == 0 {
            self.spinner.finish_and_clear();
        } else {
            self.spinner.set_message(format!("Reading [0/{total}]"));
        }
    }

    fn batch_read(&self, read: usize, total: usize) {
        if read >= total {
            self.spinner.finish_and_clear();
        } else {
            self.spinner.set_message(format!("Reading [{read}/{total}]"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_lint_with_overrides() {
        let cli = Cli::try_parse_from([
            "eloquent", "-vv", "lint", "site", "--pattern", "e", "--concurrency", "4",
            "--ignore", "drafts", "--ignore", "*.tmp",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Lint { dir, pattern, deny, read } => {
                assert_eq!(dir, PathBuf::from("site"));
                assert_eq!(pattern, "e");
                assert!(!deny);
                assert_eq!(read.concurrency, Some(4));
                assert_eq!(read.ignore, vec!["drafts", "*.tmp"]);
            }
            _ => panic!("expected lint"),
        }
    }

    #[test]
    fn builder_applies_overrides_over_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("eloquent.toml"), "concurrency = 2\nignore = [\"a\"]\n")
            .unwrap();

        let args = ReadArgs {
            source: Some("src".into()),
            concurrency: Some(8),
            ignore: vec!["b".into()],
        };
        let eloquent = builder(tmp.path(), &args).unwrap();
        assert!(eloquent.source().ends_with("src"));
        assert_eq!(eloquent.concurrency().get(), Some(8));
        assert_eq!(eloquent.ignores().len(), 2);
    }

    #[tokio::test]
    async fn spinner_is_cleared_when_processing_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let args = ReadArgs {
            source: Some("missing".into()),
            ..ReadArgs::default()
        };
        let mut eloquent = builder(tmp.path(), &args).unwrap();
        let progress = Arc::new(CliProgress::new());

        assert!(process(&mut eloquent, progress.clone()).await.is_err());
        assert!(progress.spinner.is_finished());
    }

    #[tokio::test]
    async fn spinner_is_cleared_after_reading() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.md"), "alpha").unwrap();
        let mut eloquent = builder(tmp.path(), &ReadArgs::default()).unwrap();
        let progress = Arc::new(CliProgress::new());

        let files = process(&mut eloquent, progress.clone()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert!(progress.spinner.is_finished());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let args = ReadArgs {
            concurrency: Some(0),
            ..ReadArgs::default()
        };
        assert!(builder(tmp.path(), &args).is_err());
    }
}
