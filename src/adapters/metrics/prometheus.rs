//! Prometheus Metrics - Per-run Placement Observability
//!
//! The bot runs once and exits, so metrics are not served over HTTP.
//! They are rendered in the text exposition format and written to a
//! file for a node-exporter textfile collector to pick up.
//!
//! Every remote attempt is counted through the `RetryObserver` hook;
//! the run outcome is recorded once at the end.

use std::path::Path;

use anyhow::{Context, Result};
use prometheus::{Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio::fs;
use tracing::{info, instrument};

use crate::domain::wager::WagerResult;
use crate::usecases::retry::{AttemptOutcome, RetryObserver};

/// Prometheus metrics for one bot run.
///
/// All metrics follow the naming convention `accumulator_bot_*`.
pub struct RunMetrics {
    /// Prometheus registry.
    registry: Registry,
    /// Remote call attempts by operation and outcome.
    pub attempts: IntCounterVec,
    /// Finished runs by result (`confirmed` / `failed`).
    pub runs: IntCounterVec,
    /// Stake of the last confirmed bet.
    pub stake: Gauge,
    /// Combined odds of the last confirmed bet.
    pub combined_odds: Gauge,
    /// Potential return of the last confirmed bet.
    pub potential_return: Gauge,
}

impl RunMetrics {
    /// Create and register all metrics.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let attempts = IntCounterVec::new(
            Opts::new(
                "accumulator_bot_attempts_total",
                "Remote call attempts by operation and outcome",
            ),
            &["operation", "outcome"],
        )?;

        let runs = IntCounterVec::new(
            Opts::new("accumulator_bot_runs_total", "Finished runs by result"),
            &["result"],
        )?;

        let stake = Gauge::new("accumulator_bot_stake", "Stake of the last confirmed bet")?;

        let combined_odds = Gauge::new(
            "accumulator_bot_combined_odds",
            "Combined odds of the last confirmed bet",
        )?;

        let potential_return = Gauge::new(
            "accumulator_bot_potential_return",
            "Potential return of the last confirmed bet",
        )?;

        registry.register(Box::new(attempts.clone()))?;
        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(stake.clone()))?;
        registry.register(Box::new(combined_odds.clone()))?;
        registry.register(Box::new(potential_return.clone()))?;

        Ok(Self {
            registry,
            attempts,
            runs,
            stake,
            combined_odds,
            potential_return,
        })
    }

    /// Record a confirmed bet.
    pub fn record_confirmed(&self, result: &WagerResult) {
        self.runs.with_label_values(&["confirmed"]).inc();
        self.stake.set(to_f64(result.stake));
        self.combined_odds.set(to_f64(result.combined_odds));
        self.potential_return.set(to_f64(result.potential_return));
    }

    /// Record a failed run.
    pub fn record_failed(&self) {
        self.runs.with_label_values(&["failed"]).inc();
    }

    /// Render every registered metric in the text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not UTF-8")
    }

    /// Write the rendered metrics to `path` (tmp file, then rename).
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn write_textfile(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("prom.tmp");

        fs::write(&tmp, self.render()?)
            .await
            .context("Failed to write tmp metrics file")?;
        fs::rename(&tmp, path)
            .await
            .context("Failed to rename metrics file")?;

        info!("Metrics written");
        Ok(())
    }
}

impl RetryObserver for RunMetrics {
    fn on_attempt(&self, label: &str, _attempt: u32, outcome: AttemptOutcome) {
        let outcome = match outcome {
            AttemptOutcome::Succeeded => "succeeded",
            AttemptOutcome::Retrying => "retrying",
            AttemptOutcome::GaveUp => "gave_up",
        };
        self.attempts.with_label_values(&[label, outcome]).inc();
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::wager::BetStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_observer_counts_attempts() {
        let metrics = RunMetrics::new().unwrap();
        metrics.on_attempt("place_wager", 1, AttemptOutcome::Retrying);
        metrics.on_attempt("place_wager", 2, AttemptOutcome::Succeeded);
        metrics.on_attempt("authenticate", 1, AttemptOutcome::Succeeded);

        let retrying = metrics
            .attempts
            .with_label_values(&["place_wager", "retrying"])
            .get();
        let succeeded = metrics
            .attempts
            .with_label_values(&["place_wager", "succeeded"])
            .get();
        assert_eq!((retrying, succeeded), (1, 1));
    }

    #[test]
    fn test_render_includes_confirmed_bet() {
        let metrics = RunMetrics::new().unwrap();
        metrics.record_confirmed(&WagerResult {
            bet_id: "B1000".to_string(),
            status: BetStatus::Accepted,
            legs: Vec::new(),
            stake: dec!(5.00),
            combined_odds: dec!(3.38),
            potential_return: dec!(16.88),
            placed_at: Utc::now(),
        });

        let text = metrics.render().unwrap();
        assert!(text.contains("accumulator_bot_runs_total{result=\"confirmed\"} 1"));
        assert!(text.contains("accumulator_bot_potential_return 16.88"));
    }

    #[tokio::test]
    async fn test_write_textfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot.prom");
        let metrics = RunMetrics::new().unwrap();
        metrics.record_failed();

        metrics.write_textfile(&path).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("accumulator_bot_runs_total{result=\"failed\"} 1"));
    }
}
