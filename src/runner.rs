//! Batch execution of discovered tasks against the automation engine.
//!
//! Tasks run strictly one at a time by default, each log fully written
//! before the next task starts. `jobs > 1` opts into a bounded rayon
//! pool; results are pushed through a mutex and re-ordered back to
//! discovery order before reporting.

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::discover::Task;
use crate::secrets::Secrets;

/// Engine binary invoked once per task.
pub const DEFAULT_ENGINE: &str = "ansible-playbook";

/// Exit code recorded when the engine cannot be launched at all.
const LAUNCH_FAILURE_CODE: i32 = 1;

/// Options for a whole batch, captured once at startup.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Engine binary name or path.
    pub engine: String,
    /// Username passed to the engine via `-u`.
    pub user: String,
    /// Shared credentials, reused read-only across tasks.
    pub secrets: Secrets,
    /// Pass `--check` so the engine makes no real changes.
    pub check: bool,
    /// Worker count; 1 runs tasks strictly in sequence.
    pub jobs: usize,
    /// Directory holding one log file per task.
    pub log_dir: PathBuf,
}

/// Pass/fail classification derived from the engine exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pass,
    Fail(i32),
}

impl TaskStatus {
    fn from_exit_code(code: i32) -> Self {
        if code == 0 { Self::Pass } else { Self::Fail(code) }
    }

    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail(code) => write!(f, "FAIL({code})"),
        }
    }
}

/// Outcome of one task run. Created once, appended to the results list,
/// never mutated afterward.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub task: Task,
    pub exit_code: i32,
    pub duration: Duration,
    pub status: TaskStatus,
}

impl ExecutionResult {
    pub(crate) fn new(task: Task, exit_code: i32, duration: Duration) -> Self {
        Self {
            task,
            exit_code,
            duration,
            status: TaskStatus::from_exit_code(exit_code),
        }
    }

    /// Elapsed seconds, as shown in progress lines and the summary.
    pub fn seconds(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// Run every task exactly once, returning one result per task in
/// discovery order.
pub fn execute(tasks: &[Task], opts: &RunOptions) -> Result<Vec<ExecutionResult>> {
    if opts.jobs > 1 {
        return execute_parallel(tasks, opts);
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        let result = run_task(task, opts)?;
        println!("{}", progress_line(&result));
        results.push(result);
    }
    Ok(results)
}

/// Bounded-pool variant: logs stay contention-free (one file per task),
/// only the accumulator is shared.
fn execute_parallel(tasks: &[Task], opts: &RunOptions) -> Result<Vec<ExecutionResult>> {
    let pb = ProgressBar::new(tasks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let results: Arc<Mutex<Vec<(usize, ExecutionResult)>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
        .context("Failed to create worker thread pool")?;

    pool.install(|| {
        tasks.par_iter().enumerate().for_each(|(index, task)| {
            let result = match run_task(task, opts) {
                Ok(result) => result,
                Err(err) => {
                    log::error!("{}: {err:#}", task.folder_name());
                    ExecutionResult::new(task.clone(), LAUNCH_FAILURE_CODE, Duration::ZERO)
                }
            };

            pb.println(progress_line(&result));
            pb.set_message(format!(
                "{}/{}",
                result.task.folder_name(),
                result.task.playbook_name()
            ));
            pb.inc(1);

            push_result(&results, index, result);
        });
    });

    pb.finish_and_clear();

    let mut collected = into_results(results)?;
    collected.sort_by_key(|(index, _)| *index);
    Ok(collected.into_iter().map(|(_, result)| result).collect())
}

fn push_result(
    results: &Arc<Mutex<Vec<(usize, ExecutionResult)>>>,
    index: usize,
    result: ExecutionResult,
) {
    match results.lock() {
        Ok(mut locked) => locked.push((index, result)),
        Err(poisoned) => poisoned.into_inner().push((index, result)),
    }
}

fn into_results(
    results: Arc<Mutex<Vec<(usize, ExecutionResult)>>>,
) -> Result<Vec<(usize, ExecutionResult)>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Run one task to completion, capturing all engine output in its log.
///
/// Launch failures are folded into a `FAIL(1)` result rather than
/// propagated so one broken task cannot stop the batch; only log-file
/// I/O failures abort.
fn run_task(task: &Task, opts: &RunOptions) -> Result<ExecutionResult> {
    let argv = engine_argv(task, opts, false);
    let log_path = opts.log_dir.join(log_file_name(task));
    let mut log = File::create(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    let redacted = render_command(&engine_argv(task, opts, true));
    writeln!(log, "$ {redacted}\n")
        .with_context(|| format!("Failed to write to {}", log_path.display()))?;
    log::debug!("{}: {redacted}", task.folder_name());

    let start = Instant::now();
    let exit_code = match launch(&argv, task, &log) {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(log, "ERROR: {err:#}");
            LAUNCH_FAILURE_CODE
        }
    };
    let duration = start.elapsed();

    Ok(ExecutionResult::new(task.clone(), exit_code, duration))
}

/// Spawn the engine with stdout and stderr interleaved into the log,
/// cwd set to the task folder, environment inherited as-is.
fn launch(argv: &[String], task: &Task, log: &File) -> Result<i32> {
    let (program, args) = argv.split_first().context("Empty engine command line")?;
    let stdout = log.try_clone().context("Failed to clone log handle")?;
    let stderr = log.try_clone().context("Failed to clone log handle")?;

    let status = Command::new(program)
        .args(args)
        .current_dir(&task.folder)
        .stdin(Stdio::inherit())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .status()
        .with_context(|| format!("Failed to execute {program}"))?;

    // Signal-terminated runs carry no exit code; fold them into the
    // launch-failure sentinel.
    Ok(status.code().unwrap_or(LAUNCH_FAILURE_CODE))
}

/// Argument vector for one invocation. `redacted` substitutes masked
/// secret values, for the persisted log header.
fn engine_argv(task: &Task, opts: &RunOptions, redacted: bool) -> Vec<String> {
    let mut argv = vec![
        opts.engine.clone(),
        "-i".to_string(),
        task.inventory.display().to_string(),
        task.playbook.display().to_string(),
        "-u".to_string(),
        opts.user.clone(),
    ];
    if opts.check {
        argv.push("--check".to_string());
    }
    let pairs = if redacted {
        opts.secrets.redacted_pairs()
    } else {
        opts.secrets.extra_var_pairs()
    };
    if !pairs.is_empty() {
        argv.push("--extra-vars".to_string());
        argv.push(pairs.join(" "));
    }
    argv
}

fn log_file_name(task: &Task) -> String {
    format!("{}__{}.log", task.folder_name(), task.playbook_name())
}

/// One line per completed task: `[STATUS] folder/playbook in N.Ns`.
fn progress_line(result: &ExecutionResult) -> String {
    let tag = format!("[{}]", result.status);
    let tag = if result.status.is_pass() {
        tag.green()
    } else {
        tag.red()
    };
    format!(
        "{} {}/{} in {:.1}s",
        tag,
        result.task.folder_name(),
        result.task.playbook_name(),
        result.seconds()
    )
}

/// Render argv the way a shell would accept it, for the log header.
fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
