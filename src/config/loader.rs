//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, layering environment overrides on
//! top, validating all parameters, and providing clear error messages
//! for misconfiguration.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use super::AppConfig;
use crate::domain::selection::SelectionMode;
use crate::domain::wager::MIN_LEGS;

/// Load configuration the way the binary does.
///
/// Reads `path` when it exists (defaults otherwise), applies
/// environment overrides, then validates the result.
///
/// # Errors
/// Returns error on unreadable/unparseable files, malformed overrides
/// or failed validation.
pub fn load_with_env(path: &str) -> Result<AppConfig> {
  let mut config = if Path::new(path).exists() {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file: {path}"))?;
    parse_config(&content)?
  } else {
    info!(path, "No config file found, using defaults");
    AppConfig::default()
  };

  apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
  validate_config(&config)?;
  Ok(config)
}

/// Parse TOML content into an `AppConfig` without validation.
///
/// # Errors
/// Returns error if the TOML is malformed or has wrongly typed fields.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  toml::from_str(content).with_context(|| "Failed to parse config.toml")
}

/// Apply environment overrides through `lookup`.
///
/// Recognised variables: `DEFAULT_STAKE`, `MAX_LEGS`, `MIN_ODDS`,
/// `MAX_RETRIES`, `RETRY_BACKOFF_BASE`, `MATCH_SELECTION`,
/// `SIM_NET_FAIL`, `BOT_LOG_FILE`.
///
/// # Errors
/// Returns error naming the variable whose value fails to parse.
pub fn apply_env_overrides(
  config: &mut AppConfig,
  lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
  if let Some(v) = lookup("DEFAULT_STAKE") {
    config.wager.default_stake = parse_var::<Decimal>("DEFAULT_STAKE", &v)?;
  }
  if let Some(v) = lookup("MAX_LEGS") {
    config.wager.max_legs = parse_var("MAX_LEGS", &v)?;
  }
  if let Some(v) = lookup("MIN_ODDS") {
    config.wager.min_odds = parse_var::<Decimal>("MIN_ODDS", &v)?;
  }
  if let Some(v) = lookup("MAX_RETRIES") {
    config.retry.max_attempts = parse_var("MAX_RETRIES", &v)?;
  }
  if let Some(v) = lookup("RETRY_BACKOFF_BASE") {
    config.retry.backoff_base = parse_var("RETRY_BACKOFF_BASE", &v)?;
  }
  if let Some(v) = lookup("MATCH_SELECTION") {
    config.wager.selection_mode = SelectionMode::from_str(&v)
      .map_err(|e| anyhow::anyhow!("Invalid MATCH_SELECTION: {e}"))?;
  }
  if let Some(v) = lookup("SIM_NET_FAIL") {
    config.simulation.network_failure_rate = parse_var("SIM_NET_FAIL", &v)?;
  }
  if let Some(v) = lookup("BOT_LOG_FILE") {
    config.bot.log_file = if v.trim().is_empty() { None } else { Some(v) };
  }
  Ok(())
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  value
    .trim()
    .parse::<T>()
    .map_err(|e| anyhow::anyhow!("Invalid {name}={value:?}: {e}"))
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive stake and sensible odds floor
/// - At least two legs per accumulator
/// - A usable retry policy
/// - Probabilities in [0, 1]
/// - Non-empty output paths
pub fn validate_config(config: &AppConfig) -> Result<()> {
  // Wager validation
  anyhow::ensure!(
    config.wager.default_stake > Decimal::ZERO,
    "default_stake must be positive, got {}",
    config.wager.default_stake
  );
  anyhow::ensure!(
    config.wager.max_legs >= MIN_LEGS,
    "max_legs must be at least {MIN_LEGS}, got {}",
    config.wager.max_legs
  );
  anyhow::ensure!(
    config.wager.min_odds >= Decimal::ONE,
    "min_odds must be >= 1.0, got {}",
    config.wager.min_odds
  );

  // Retry validation
  anyhow::ensure!(
    config.retry.max_attempts >= 1,
    "max_attempts must be at least 1"
  );
  anyhow::ensure!(
    config.retry.backoff_base > 0.0 && config.retry.backoff_base.is_finite(),
    "backoff_base must be positive, got {}",
    config.retry.backoff_base
  );
  anyhow::ensure!(
    config.retry.max_jitter_secs >= 0.0 && config.retry.max_jitter_secs.is_finite(),
    "max_jitter_secs must be non-negative, got {}",
    config.retry.max_jitter_secs
  );

  // Simulation validation
  let sim = &config.simulation;
  for (name, rate) in [
    ("network_failure_rate", sim.network_failure_rate),
    ("unavailable_rate", sim.unavailable_rate),
    ("odds_change_rate", sim.odds_change_rate),
    ("odds_change_reject_rate", sim.odds_change_reject_rate),
    ("lost_response_rate", sim.lost_response_rate),
  ] {
    anyhow::ensure!(
      (0.0..=1.0).contains(&rate),
      "{name} must be in [0, 1], got {rate}"
    );
  }
  anyhow::ensure!(
    sim.min_event_odds >= 1.0 && sim.max_event_odds >= sim.min_event_odds,
    "event odds range [{}, {}] is invalid",
    sim.min_event_odds,
    sim.max_event_odds
  );

  // Persistence validation
  anyhow::ensure!(
    !config.persistence.bets_file.is_empty(),
    "bets_file must not be empty"
  );
  anyhow::ensure!(
    !config.persistence.lock_file.is_empty(),
    "lock_file must not be empty"
  );

  Ok(())
}
