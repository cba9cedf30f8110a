use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ansible-batch")]
#[command(version)]
#[command(about = "Run ansible-playbook against every task folder under a tree", long_about = None)]
pub struct Cli {
    /// Root directory to scan for task folders
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Marker filename identifying a task folder
    #[arg(long, default_value = "inventory.ini")]
    pub inventory_name: String,

    /// Username passed to ansible-playbook via -u
    #[arg(short, long)]
    pub user: String,

    /// Prompt once for a shared SSH password, reused for every task
    #[arg(long)]
    pub ask_pass_once: bool,

    /// Prompt once for a shared become password, reused for every task
    #[arg(long)]
    pub ask_become_pass_once: bool,

    /// Dry run - pass --check to every invocation
    #[arg(long)]
    pub check: bool,

    /// Number of parallel workers (1 runs tasks strictly in sequence)
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
