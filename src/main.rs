//! Command-line entry point: process every configured target once and exit
//! with a status reflecting the per-target outcomes.

use anyhow::Context;
use clap::Parser;
use pagewatch::{
    load_targets, runner, Fetcher, RunLock, RunOptions, RunSummary, SnapshotStore,
    DEFAULT_USER_AGENT,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    about = "Track webpage changes by snapshotting and diffing normalized HTML"
)]
struct Cli {
    /// Path to the JSON target list
    #[arg(long, env = "PAGEWATCH_TARGETS", default_value = "targets.json")]
    targets: PathBuf,

    /// Root directory for snapshots and diff artifacts
    #[arg(long, env = "PAGEWATCH_DATA_ROOT", default_value = "data")]
    data_root: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, env = "PAGEWATCH_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Equal lines kept around changed regions in rendered diffs
    #[arg(long, env = "PAGEWATCH_DIFF_CONTEXT", default_value_t = 3)]
    diff_context: usize,

    /// Whether a scheduled invocation actually runs
    #[arg(
        long,
        env = "PAGEWATCH_AUTO_RUN",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    auto_run: bool,

    /// User agent sent with every request
    #[arg(long, env = "PAGEWATCH_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            tracing::error!(
                fetch_errors = summary.fetch_errors,
                store_errors = summary.store_errors,
                diff_errors = summary.diff_errors,
                "run completed with failures"
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "run aborted");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<RunSummary> {
    let targets = load_targets(&cli.targets).context("loading target list")?;
    let store = SnapshotStore::new(&cli.data_root);
    let _lock = RunLock::acquire(store.lock_path())?;
    let fetcher = Fetcher::new(Duration::from_secs(cli.timeout_secs), &cli.user_agent)
        .context("building http client")?;

    let mut options = RunOptions::new(chrono::Local::now().date_naive());
    options.auto_run_enabled = cli.auto_run;
    options.diff_context = cli.diff_context;

    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building async runtime")?;
    Ok(rt.block_on(runner::run(&fetcher, &store, &targets, &options)))
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pagewatch=info")),
        )
        .init();
}
