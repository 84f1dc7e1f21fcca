//! Accumulator Bot — Entry Point
//!
//! Places and confirms a single accumulator against the simulated
//! bookmaker, then exits.
//!
//! Wiring sequence:
//! 1. Load config.toml (path from ACCUMULATOR_CONFIG) + env overrides
//! 2. Init tracing (JSON to stdout, mirrored to the log file)
//! 3. Acquire the run lock (refuse to start if another run holds it)
//! 4. Create SimulatedBookmaker (implements WageringService port)
//! 5. Create BetLog (implements BetRepository port) + RunMetrics
//! 6. Run one BettingSession: login → build → submit → confirm → persist
//! 7. Write metrics textfile, release the lock

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use accumulator_bot::adapters::bookmaker::SimulatedBookmaker;
use accumulator_bot::adapters::metrics::RunMetrics;
use accumulator_bot::adapters::persistence::{BetLog, RunLock};
use accumulator_bot::config::{self, AppConfig, Credentials};
use accumulator_bot::domain::random::SeededRandom;
use accumulator_bot::usecases::{BettingSession, RetryExecutor, RetryPolicy};

/// Environment variable naming the config file.
const CONFIG_PATH_VAR: &str = "ACCUMULATOR_CONFIG";

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config_path =
        std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
    let config = config::loader::load_with_env(&config_path)
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    init_tracing(&config)?;

    info!(
        name = %config.bot.name,
        version = env!("CARGO_PKG_VERSION"),
        stake = %config.wager.default_stake,
        max_legs = config.wager.max_legs,
        min_odds = %config.wager.min_odds,
        mode = %config.wager.selection_mode,
        max_attempts = config.retry.max_attempts,
        "Starting accumulator bot"
    );

    // ── 3. Single-instance guard ────────────────────────────
    let lock = match RunLock::acquire(&config.persistence.data_dir, &config.persistence.lock_file)
        .await
    {
        Ok(lock) => lock,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Another instance appears to be running, exiting");
            return Err(e);
        }
    };

    // ── 4–5. Adapters ───────────────────────────────────────
    let metrics = Arc::new(RunMetrics::new().context("Failed to register metrics")?);
    let bookmaker = Arc::new(SimulatedBookmaker::new(
        config.simulation.clone(),
        config.wager.min_odds,
    ));
    let bet_log = Arc::new(
        BetLog::new(&config.persistence.data_dir, &config.persistence.bets_file)
            .await
            .context("Failed to open bet log")?,
    );
    let retry = RetryExecutor::new(
        RetryPolicy::from(&config.retry),
        Box::new(SeededRandom::from_entropy()),
    )
    .with_observer(metrics.clone());

    // ── 6. One placement run ────────────────────────────────
    let mut session = BettingSession::new(bookmaker, Credentials::from_env(), &config)
        .with_repository(bet_log)
        .with_retry(retry);

    let outcome = session.run_once(config.wager.default_stake).await;
    match &outcome {
        Ok(result) => {
            metrics.record_confirmed(result);
            info!(bet_id = %result.bet_id, state = %session.state(), "Run complete");
        }
        Err(e) => {
            metrics.record_failed();
            error!(error = %e, state = %session.state(), "Run failed");
        }
    }

    // ── 7. Metrics + cleanup ────────────────────────────────
    let metrics_path =
        Path::new(&config.persistence.data_dir).join(&config.persistence.metrics_file);
    if let Err(e) = metrics.write_textfile(&metrics_path).await {
        warn!(error = %format!("{e:#}"), "Failed to write metrics file");
    }

    lock.release().await?;

    outcome.map(|_| ()).context("Accumulator run failed")
}

/// JSON logs to stdout, plus the configured log file when set.
///
/// `RUST_LOG` overrides the configured level.
fn init_tracing(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.bot.log_level));

    let file_layer = match &config.bot.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path}"))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json())
        .with(file_layer)
        .init();

    Ok(())
}
