//! Command-line interface module for downtidy.
//!
//! This module handles:
//! - Argument parsing and merging with the settings file
//! - Logging setup
//! - The initial sweep of the root directory
//! - The interactive watch prompt and the watch loop

use crate::config::{SettleMode, Settings, WatchMode};
use crate::file_category::CategoryTable;
use crate::file_organizer::Organizer;
use crate::output::OutputFormatter;
use crate::watcher::FolderWatcher;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Sort a directory into category subfolders by file extension.
#[derive(Parser, Debug, Clone)]
#[command(name = "downtidy", version, about)]
pub struct Cli {
    /// Directory to organize (defaults to the configured root or ~/Downloads)
    pub root: Option<PathBuf>,

    /// Settings file to use instead of the default search locations
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep watching for new files after the initial sweep without asking
    #[arg(long, conflicts_with = "no_watch")]
    pub watch: bool,

    /// Exit after the initial sweep without asking
    #[arg(long)]
    pub no_watch: bool,

    /// Fixed pause before moving a newly created file, in milliseconds
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Wait until new files stop growing instead of a fixed pause
    #[arg(long)]
    pub stable: bool,

    /// Print the sweep report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Installs the global `tracing` subscriber. `RUST_LOG` takes precedence.
    pub fn setup_logging(&self) {
        let default_level = if self.verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("downtidy={}", default_level)));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .try_init();
    }

    /// Loads the settings file and applies command-line overrides.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings =
            Settings::load(self.config.as_deref()).context("Error loading configuration")?;
        self.apply_overrides(&mut settings);
        Ok(settings)
    }

    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(root) = &self.root {
            settings.root = Some(root.clone());
        }
        if self.watch {
            settings.watch = WatchMode::Always;
        }
        if self.no_watch {
            settings.watch = WatchMode::Never;
        }
        if let Some(delay_ms) = self.settle_ms {
            settings.settle.mode = SettleMode::Fixed;
            settings.settle.delay_ms = delay_ms;
        }
        if self.stable {
            settings.settle.mode = SettleMode::Stable;
        }
    }
}

const WATCH_PROMPT: &str = "Enable live watching? (y/n): ";

/// Runs the application for parsed arguments, reading prompt answers from
/// standard input.
pub fn run_cli(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;
    // Keep stdout for the JSON report alone
    OutputFormatter::reserve_stdout(cli.json);
    // stdout stays unlocked; the watch thread prints to it too
    run_with_settings(&settings, cli.json, io::stdin().lock(), io::stdout())
}

/// Sweeps the configured root once, then watches it if requested.
///
/// With `json` set, `output` receives only the JSON report and the watch
/// prompt is written to stderr. A missing root is reported on the console
/// and treated as a clean exit.
pub fn run_with_settings<R: BufRead, W: Write>(
    settings: &Settings,
    json: bool,
    input: R,
    mut output: W,
) -> Result<()> {
    let root = settings.root_dir();
    if !root.is_dir() {
        OutputFormatter::error(&format!(
            "Directory does not exist: {}",
            root.display()
        ));
        return Ok(());
    }

    OutputFormatter::info(&format!("Organizing directory: {}", root.display()));

    let organizer = Organizer::new(&root, CategoryTable::default())
        .context("Error preparing category folders")?
        .with_settle_policy(settings.settle.policy());

    let report = organizer
        .organize_all()
        .context("Error organizing existing files")?;

    if json {
        writeln!(output, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        OutputFormatter::summary_table(&report);
    }

    let watch = match settings.watch {
        WatchMode::Always => true,
        WatchMode::Never => false,
        WatchMode::Ask if json => prompt_yes_no(WATCH_PROMPT, input, &mut io::stderr())?,
        WatchMode::Ask => prompt_yes_no(WATCH_PROMPT, input, &mut output)?,
    };

    if watch {
        watch_until_interrupted(Arc::new(organizer))?;
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(())
}

/// Writes `question` and reads one line; true if the answer starts with `y`.
///
/// End of input counts as "no".
pub fn prompt_yes_no<R: BufRead, W: Write>(
    question: &str,
    mut input: R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "{}", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().to_lowercase().starts_with('y'))
}

fn watch_until_interrupted(organizer: Arc<Organizer>) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let handler_organizer = Arc::clone(&organizer);
    let watcher = FolderWatcher::start(organizer.root(), move |event| {
        handler_organizer.on_created(&event);
    })
    .context("Error starting file watcher")?;

    OutputFormatter::info("Watching for new files... press Ctrl+C to stop");
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(200));
    }

    OutputFormatter::info("Stopping watcher...");
    watcher.stop();
    OutputFormatter::success("Watcher stopped.");
    Ok(())
}
