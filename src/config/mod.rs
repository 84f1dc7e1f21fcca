//! Configuration Module - TOML-based Bot Configuration
//!
//! Loads and validates configuration from `config.toml` with
//! environment variable overrides. The resulting `AppConfig` is built
//! once at startup and passed explicitly to every constructor; the
//! core never reads process-wide settings.

pub mod loader;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::selection::SelectionMode;

/// Top-level bot configuration.
///
/// Every section and field has a default, so an absent or partial
/// `config.toml` still yields a runnable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
  /// Bot identity and logging.
  #[serde(default)]
  pub bot: BotConfig,
  /// Stake and leg selection.
  #[serde(default)]
  pub wager: WagerConfig,
  /// Retry/backoff policy for remote calls.
  #[serde(default)]
  pub retry: RetryConfig,
  /// Simulated bookmaker behaviour.
  #[serde(default)]
  pub simulation: SimulationConfig,
  /// Output files.
  #[serde(default)]
  pub persistence: PersistenceConfig,
}

/// Bot identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
  /// Human-readable bot name.
  #[serde(default = "default_name")]
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// Optional JSON log file mirrored alongside stdout.
  #[serde(default = "default_log_file")]
  pub log_file: Option<String>,
}

/// Wager construction parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct WagerConfig {
  /// Stake used when none is given on the command line.
  #[serde(default = "default_stake")]
  pub default_stake: Decimal,
  /// Maximum legs per accumulator.
  #[serde(default = "default_max_legs")]
  pub max_legs: usize,
  /// Minimum decimal odds for a leg (inclusive).
  #[serde(default = "default_min_odds")]
  pub min_odds: Decimal,
  /// How eligible events are ordered.
  #[serde(default)]
  pub selection_mode: SelectionMode,
}

/// Retry policy applied to every remote call.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
  /// Attempts per remote call, including the first.
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Exponential backoff base in seconds (`base^(k-1)`).
  #[serde(default = "default_backoff_base")]
  pub backoff_base: f64,
  /// Upper bound of the uniform jitter added to each delay (seconds).
  #[serde(default = "default_max_jitter")]
  pub max_jitter_secs: f64,
}

/// Simulated bookmaker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
  /// Probability that any call fails with a transient error.
  #[serde(default = "default_network_failure_rate")]
  pub network_failure_rate: f64,
  /// Probability that a generated event is unavailable.
  #[serde(default = "default_unavailable_rate")]
  pub unavailable_rate: f64,
  /// Probability that odds move during a placement.
  #[serde(default = "default_odds_change_rate")]
  pub odds_change_rate: f64,
  /// Probability that a placement with moved odds is rejected.
  #[serde(default = "default_odds_change_reject_rate")]
  pub odds_change_reject_rate: f64,
  /// Probability that an accepted placement's response is lost.
  #[serde(default)]
  pub lost_response_rate: f64,
  /// Number of events in the feed.
  #[serde(default = "default_event_count")]
  pub event_count: usize,
  /// Lowest generated odds.
  #[serde(default = "default_min_event_odds")]
  pub min_event_odds: f64,
  /// Highest generated odds.
  #[serde(default = "default_max_event_odds")]
  pub max_event_odds: f64,
  /// RNG seed; OS entropy when absent.
  #[serde(default = "default_seed")]
  pub seed: Option<u64>,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for all output files.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  /// JSONL log of confirmed bets.
  #[serde(default = "default_bets_file")]
  pub bets_file: String,
  /// Single-instance lock file.
  #[serde(default = "default_lock_file")]
  pub lock_file: String,
  /// Prometheus textfile written at the end of each run.
  #[serde(default = "default_metrics_file")]
  pub metrics_file: String,
}

/// Bookmaker login credentials.
///
/// Read from `BOT_USERNAME` / `BOT_PASSWORD`; never stored in
/// `config.toml`.
#[derive(Clone)]
pub struct Credentials {
  /// Account username.
  pub username: String,
  /// Account password (never logged).
  pub password: String,
}

impl Credentials {
  /// Create credentials from explicit values.
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }

  /// Load credentials from the process environment, falling back to
  /// the bookmaker's test account.
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Load credentials through an arbitrary variable lookup.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    Self {
      username: lookup("BOT_USERNAME").unwrap_or_else(|| "test_user".to_string()),
      password: lookup("BOT_PASSWORD").unwrap_or_else(|| "test_pass".to_string()),
    }
  }
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

impl Default for BotConfig {
  fn default() -> Self {
    Self {
      name: default_name(),
      log_level: default_log_level(),
      log_file: default_log_file(),
    }
  }
}

impl Default for WagerConfig {
  fn default() -> Self {
    Self {
      default_stake: default_stake(),
      max_legs: default_max_legs(),
      min_odds: default_min_odds(),
      selection_mode: SelectionMode::default(),
    }
  }
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      backoff_base: default_backoff_base(),
      max_jitter_secs: default_max_jitter(),
    }
  }
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      network_failure_rate: default_network_failure_rate(),
      unavailable_rate: default_unavailable_rate(),
      odds_change_rate: default_odds_change_rate(),
      odds_change_reject_rate: default_odds_change_reject_rate(),
      lost_response_rate: 0.0,
      event_count: default_event_count(),
      min_event_odds: default_min_event_odds(),
      max_event_odds: default_max_event_odds(),
      seed: default_seed(),
    }
  }
}

impl Default for PersistenceConfig {
  fn default() -> Self {
    Self {
      data_dir: default_data_dir(),
      bets_file: default_bets_file(),
      lock_file: default_lock_file(),
      metrics_file: default_metrics_file(),
    }
  }
}

// Default value functions for serde

fn default_name() -> String {
  "accumulator-bot".to_string()
}

fn default_log_level() -> String {
  "info".to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_log_file() -> Option<String> {
  Some("accumulator_bot.log".to_string())
}

fn default_stake() -> Decimal {
  dec!(5.0)
}

fn default_max_legs() -> usize {
  4
}

fn default_min_odds() -> Decimal {
  dec!(1.20)
}

fn default_max_attempts() -> u32 {
  5
}

fn default_backoff_base() -> f64 {
  1.5
}

fn default_max_jitter() -> f64 {
  0.5
}

fn default_network_failure_rate() -> f64 {
  0.05
}

fn default_unavailable_rate() -> f64 {
  0.02
}

fn default_odds_change_rate() -> f64 {
  0.08
}

fn default_odds_change_reject_rate() -> f64 {
  0.5
}

fn default_event_count() -> usize {
  20
}

fn default_min_event_odds() -> f64 {
  1.15
}

fn default_max_event_odds() -> f64 {
  3.5
}

#[allow(clippy::unnecessary_wraps)]
fn default_seed() -> Option<u64> {
  Some(42)
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_bets_file() -> String {
  "placed_bets.jsonl".to_string()
}

fn default_lock_file() -> String {
  "accumulator_bot.lock".to_string()
}

fn default_metrics_file() -> String {
  "accumulator_bot.prom".to_string()
}
