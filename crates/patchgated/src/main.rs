//! patchgated — the staged-approval engine binary.
//!
//! Invoked by an OS-level periodic trigger (cron, systemd timer, task
//! scheduler), one invocation per tick per rollout task:
//!
//! ```text
//! patchgated run --task-id workstations --policy rollout.toml \
//!     --data-dir /var/lib/patchgate --server updates.internal:8530
//! ```
//!
//! The result record is printed to stdout as JSON; logs go to stderr, so
//! the trigger can capture the record alone. The trigger guarantees at
//! most one concurrent run per task id.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use patchgate_api::{ConnectionConfig, HttpAdminApi};
use patchgate_engine::{EngineError, EngineResult, RolloutPolicy, RunOutcome, RunReport, run_once};
use patchgate_store::{StoreError, TrackingStore};

const STORE_FILE: &str = "tracking.redb";

#[derive(Parser)]
#[command(name = "patchgated", about = "Staged patch approval engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute one engine tick for a rollout task.
    Run {
        /// Rollout task this run belongs to.
        #[arg(long)]
        task_id: String,

        /// Path to the rollout policy TOML.
        #[arg(long)]
        policy: PathBuf,

        /// Data directory for the tracking store.
        #[arg(long, default_value = "/var/lib/patchgate")]
        data_dir: PathBuf,

        /// Administration server address (host:port).
        #[arg(long)]
        server: String,

        /// Per-request timeout in seconds.
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Print the tracking store (the rollout audit trail) as JSON.
    Status {
        /// Data directory for the tracking store.
        #[arg(long, default_value = "/var/lib/patchgate")]
        data_dir: PathBuf,
    },

    /// Write a rollout policy scaffold.
    Init {
        /// Where to write the scaffold.
        #[arg(long, default_value = "rollout.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,patchgated=debug,patchgate_engine=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            task_id,
            policy,
            data_dir,
            server,
            timeout,
        } => run(&task_id, &policy, &data_dir, server, timeout).await,
        Command::Status { data_dir } => status(&data_dir),
        Command::Init { path } => init(&path),
    }
}

async fn run(
    task_id: &str,
    policy_path: &Path,
    data_dir: &Path,
    server: String,
    timeout: u64,
) -> anyhow::Result<()> {
    let result = execute_run(task_id, policy_path, data_dir, server, timeout).await;
    let outcome = RunOutcome::from_result(&result);

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

/// The fallible part of `run`, so every terminal error lands in the
/// result record rather than on stderr alone.
async fn execute_run(
    task_id: &str,
    policy_path: &Path,
    data_dir: &Path,
    server: String,
    timeout: u64,
) -> EngineResult<RunReport> {
    let policy = RolloutPolicy::from_file(policy_path)?;

    std::fs::create_dir_all(data_dir)
        .map_err(|e| EngineError::Store(StoreError::Open(e.to_string())))?;
    let store = TrackingStore::open(&data_dir.join(STORE_FILE))?;

    let client = HttpAdminApi::new(
        ConnectionConfig::new(server).with_timeout(Duration::from_secs(timeout)),
    );

    // Ctrl-C stops the phases from starting new API calls; decisions
    // already made are still persisted.
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = cancel_tx.send(true);
        }
    });

    run_once(task_id, &policy, &store, &client, &cancel_rx).await
}

fn status(data_dir: &Path) -> anyhow::Result<()> {
    let store = TrackingStore::open(&data_dir.join(STORE_FILE))?;
    let doc = serde_json::json!({
        "last_updated": store.last_updated()?,
        "entries": store.load()?,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn init(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, RolloutPolicy::scaffold().to_toml_string()?)?;
    info!(path = %path.display(), "policy scaffold written");
    Ok(())
}
