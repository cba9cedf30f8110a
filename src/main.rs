mod cli;
mod discover;
mod report;
mod runner;
mod secrets;
mod ui;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::Cli;
use std::fs;

/// Log directory created under the scanned root, one file per task.
const LOG_DIR_NAME: &str = "ansible-batch-logs";

/// Summary report written next to the log directory.
const SUMMARY_NAME: &str = "ansible_batch_summary.csv";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Cannot resolve root directory {}", cli.root.display()))?;

    let tasks = discover::discover_tasks(&root, &cli.inventory_name)?;
    if tasks.is_empty() {
        bail!("No tasks found under {}", root.display());
    }

    // Secrets are captured once, before the first task, and never
    // re-prompted mid-run.
    let secrets = secrets::Secrets::prompt(cli.ask_pass_once, cli.ask_become_pass_once)?;

    let log_dir = root.join(LOG_DIR_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let opts = runner::RunOptions {
        engine: runner::DEFAULT_ENGINE.to_string(),
        user: cli.user,
        secrets,
        check: cli.check,
        jobs: cli.jobs.max(1),
        log_dir,
    };

    let results = runner::execute(&tasks, &opts)?;

    let summary = root.join(SUMMARY_NAME);
    report::write_summary(&summary, &results)?;

    // Per-task failures are informational; the batch itself still
    // exits 0 once the summary is written.
    ui::closing(&summary, &opts.log_dir);

    Ok(())
}
