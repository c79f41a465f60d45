//! hostledger command-line runtime.
//!
//! Usage:
//!   hostledger run --config hostledger.toml
//!   hostledger poll network
//!   hostledger demo
//!   hostledger check-config hostledger.toml

mod demo;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hostledger_chain::InMemoryLedger;
use hostledger_config::LedgerSettings;
use hostledger_contracts::{
    block::HashedBlock,
    domain::PollTarget,
    error::{LedgerError, LedgerResult},
};
use hostledger_core::{EventCoordinator, ScanScope};
use hostledger_host::{build_monitors, HostFlavor, SystemCommandRunner};

/// How often `run` logs a status line.
const STATUS_EVERY: Duration = Duration::from_secs(60);

/// How long shutdown waits for in-flight agent polls before the final seal.
const POLL_GRACE: Duration = Duration::from_secs(30);

// ── CLI definition ────────────────────────────────────────────────────────────

/// hostledger: tamper-evident ledger of host security observations.
#[derive(Parser)]
#[command(
    name = "hostledger",
    about = "Tamper-evident ledger of host file, port, and account changes",
    long_about = "Watches file contents, listening ports, and local accounts, and seals\n\
                  every observation into a SHA-256 hash chain with proof of work."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all agents and the sealer on their timers until Ctrl-C.
    Run {
        /// Settings file; built-in defaults when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Host tools to read: windows or linux. Defaults to the build target.
        #[arg(long)]
        flavor: Option<HostFlavor>,
    },
    /// Poll one domain (files, network, accounts, all) once and print the events.
    Poll {
        target: PollTarget,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        flavor: Option<HostFlavor>,
    },
    /// Intake, seal, and verify against an in-memory ledger.
    Demo {
        /// Leading zero hex characters required per block.
        #[arg(long, default_value_t = 2)]
        difficulty: usize,
    },
    /// Load and validate a settings file, then print the effective settings.
    CheckConfig { path: PathBuf },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    // `run` is a long-lived service; everything else is a one-shot command.
    let default_level = match cli.command {
        Command::Run { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let result = match cli.command {
        Command::Run { config, flavor } => run(config.as_deref(), flavor),
        Command::Poll { target, config, flavor } => poll(target, config.as_deref(), flavor),
        Command::Demo { difficulty } => demo::run_scenario(difficulty),
        Command::CheckConfig { path } => check_config(&path),
    };

    if let Err(e) = result {
        eprintln!("hostledger error: {}", e);
        std::process::exit(1);
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

fn load_settings(path: Option<&Path>) -> LedgerResult<LedgerSettings> {
    match path {
        Some(path) => LedgerSettings::from_file(path),
        None => {
            let settings = LedgerSettings::default();
            settings.validate()?;
            Ok(settings)
        }
    }
}

/// Ledger, agents, and coordinator built from `settings`.
fn build_coordinator(
    settings: &LedgerSettings,
    flavor: Option<HostFlavor>,
) -> LedgerResult<Arc<EventCoordinator>> {
    let flavor = flavor.unwrap_or_else(HostFlavor::current);
    let scope = ScanScope::new(settings.monitoring_config()?);
    let ledger = Arc::new(InMemoryLedger::new(settings.difficulty));
    let monitors = build_monitors(flavor, scope.clone(), Arc::new(SystemCommandRunner));

    info!(%flavor, difficulty = settings.difficulty, agents = monitors.len(), "runtime wired");
    Ok(Arc::new(EventCoordinator::new(ledger, monitors, scope)?))
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run(config: Option<&Path>, flavor: Option<HostFlavor>) -> LedgerResult<()> {
    let settings = load_settings(config)?;
    let coordinator = build_coordinator(&settings, flavor)?;
    let schedule = settings.to_schedule();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| LedgerError::TaskFailed {
            reason: format!("failed to start async runtime: {e}"),
        })?;

    runtime.block_on(async {
        let handle = coordinator.start(&schedule);
        let mut status = tokio::time::interval(STATUS_EVERY);
        status.tick().await;

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!(error = %e, "failed to listen for Ctrl-C; shutting down");
                    }
                    break;
                }
                _ = status.tick() => log_status(&coordinator),
            }
        }

        handle.shutdown();
        info!("schedule stopped");
    });

    if let Some(block) = stop_and_seal(runtime, &coordinator)? {
        info!(index = block.index, "final block sealed on shutdown");
    }
    log_status(&coordinator);
    Ok(())
}

/// Wait for blocking polls still running on `runtime`, then seal whatever is
/// queued so the final state is on the chain.
fn stop_and_seal(
    runtime: tokio::runtime::Runtime,
    coordinator: &EventCoordinator,
) -> LedgerResult<Option<HashedBlock>> {
    runtime.shutdown_timeout(POLL_GRACE);
    coordinator.drain_and_seal()
}

fn log_status(coordinator: &EventCoordinator) {
    let pending = coordinator.list_pending().count;
    match coordinator.verify_chain() {
        Ok(status) => info!(pending, length = status.length, valid = status.valid, "ledger status"),
        Err(e) => warn!(pending, error = %e, "ledger status unavailable"),
    }
}

fn poll(target: PollTarget, config: Option<&Path>, flavor: Option<HostFlavor>) -> LedgerResult<()> {
    let settings = load_settings(config)?;
    let coordinator = build_coordinator(&settings, flavor)?;

    let polled = coordinator.trigger_poll(target);
    let pending = coordinator.list_pending();
    info!(polled, events = pending.count, "poll complete");

    println!("{}", to_pretty_json(&pending)?);
    Ok(())
}

fn check_config(path: &Path) -> LedgerResult<()> {
    let settings = LedgerSettings::from_file(path)?;
    println!("{} is valid", path.display());
    println!("  difficulty       {}", settings.difficulty);
    println!("  roots            {:?}", settings.monitoring.roots);
    println!("  excluded_dirs    {:?}", settings.monitoring.excluded_dirs);
    let s = &settings.schedule;
    println!(
        "  schedule (secs)  files {} / network {} / accounts {} / seal {} (offset {})",
        s.file_poll_secs, s.network_poll_secs, s.account_poll_secs, s.seal_secs, s.seal_offset_secs
    );
    Ok(())
}

pub(crate) fn to_pretty_json<T: serde::Serialize>(value: &T) -> LedgerResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| LedgerError::Decode {
        reason: format!("failed to render JSON: {e}"),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
