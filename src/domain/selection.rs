//! Leg selection.
//!
//! Filters the event feed to eligible events (available, odds at or
//! above the minimum) and orders them according to a `SelectionMode`.
//! Pure apart from `SelectionMode::Random`, which draws from the
//! injected random source.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::event::Event;
use super::random::RandomSource;

/// How eligible events are ordered before truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Highest odds first.
    #[default]
    Top,
    /// Uniform shuffle.
    Random,
    /// Earliest kick-off first.
    FromFeed,
}

impl std::fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Top => write!(f, "top"),
            Self::Random => write!(f, "random"),
            Self::FromFeed => write!(f, "from_feed"),
        }
    }
}

impl FromStr for SelectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "random" => Ok(Self::Random),
            "from_feed" => Ok(Self::FromFeed),
            other => Err(format!(
                "unknown selection mode '{other}' (expected top, random or from_feed)"
            )),
        }
    }
}

/// Chooses accumulator legs from the event feed.
#[derive(Debug, Clone, Copy)]
pub struct MatchSelector {
    /// Inclusive odds floor for eligible events.
    min_odds: Decimal,
}

impl MatchSelector {
    /// Create a selector with the given odds floor.
    pub fn new(min_odds: Decimal) -> Self {
        Self { min_odds }
    }

    /// Odds floor applied by this selector.
    pub fn min_odds(&self) -> Decimal {
        self.min_odds
    }

    /// Select up to `max_legs` events.
    ///
    /// Returns fewer when fewer are eligible, and an empty vector when
    /// none are. Deciding whether the result is enough for a wager is
    /// the caller's job. Ties keep feed order for `Top` and `FromFeed`.
    pub fn select(
        &self,
        events: &[Event],
        mode: SelectionMode,
        max_legs: usize,
        rng: &mut dyn RandomSource,
    ) -> Vec<Event> {
        let mut eligible: Vec<Event> = events
            .iter()
            .filter(|e| e.is_eligible(self.min_odds))
            .cloned()
            .collect();

        if eligible.is_empty() {
            return eligible;
        }

        match mode {
            // sort_by is stable
            SelectionMode::Top => eligible.sort_by(|a, b| b.odds.cmp(&a.odds)),
            SelectionMode::FromFeed => eligible.sort_by_key(|e| e.starts_at),
            SelectionMode::Random => shuffle(&mut eligible, rng),
        }

        eligible.truncate(max_legs);
        eligible
    }
}

/// Fisher–Yates shuffle driven by `rng`.
fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::random::SeededRandom;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn event(id: &str, odds: Decimal, start_min: i64, available: bool) -> Event {
        Event {
            id: id.to_string(),
            home: format!("{id}A"),
            away: format!("{id}B"),
            starts_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
                + Duration::minutes(start_min),
            odds,
            available,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    fn feed() -> Vec<Event> {
        vec![
            event("M001", dec!(1.50), 40, true),
            event("M002", dec!(3.10), 50, true),
            event("M003", dec!(1.15), 10, true),
            event("M004", dec!(2.40), 20, false),
            event("M005", dec!(3.10), 30, true),
            event("M006", dec!(2.00), 60, true),
        ]
    }

    #[test]
    fn test_top_orders_by_odds_descending_with_stable_ties() {
        let selector = MatchSelector::new(dec!(1.20));
        let mut rng = SeededRandom::from_seed(1);
        let legs = selector.select(&feed(), SelectionMode::Top, 3, &mut rng);
        assert_eq!(ids(&legs), vec!["M002", "M005", "M006"]);
    }

    #[test]
    fn test_from_feed_orders_by_start_time() {
        let selector = MatchSelector::new(dec!(1.20));
        let mut rng = SeededRandom::from_seed(1);
        let legs = selector.select(&feed(), SelectionMode::FromFeed, 10, &mut rng);
        assert_eq!(ids(&legs), vec!["M005", "M001", "M002", "M006"]);
    }

    #[test]
    fn test_random_only_returns_eligible_events() {
        let selector = MatchSelector::new(dec!(1.20));
        let mut rng = SeededRandom::from_seed(7);
        let legs = selector.select(&feed(), SelectionMode::Random, 4, &mut rng);
        assert_eq!(legs.len(), 4);
        let mut got = ids(&legs);
        got.sort_unstable();
        assert_eq!(got, vec!["M001", "M002", "M005", "M006"]);
    }

    #[test]
    fn test_random_is_reproducible_with_same_seed() {
        let selector = MatchSelector::new(dec!(1.20));
        let a = selector.select(&feed(), SelectionMode::Random, 2, &mut SeededRandom::from_seed(9));
        let b = selector.select(&feed(), SelectionMode::Random, 2, &mut SeededRandom::from_seed(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_eligible_events_yields_empty() {
        let selector = MatchSelector::new(dec!(5.00));
        let mut rng = SeededRandom::from_seed(1);
        assert!(selector.select(&feed(), SelectionMode::Top, 4, &mut rng).is_empty());
        assert!(selector.select(&[], SelectionMode::Random, 4, &mut rng).is_empty());
    }

    #[test]
    fn test_returns_fewer_than_max_when_short() {
        let selector = MatchSelector::new(dec!(3.00));
        let mut rng = SeededRandom::from_seed(1);
        let legs = selector.select(&feed(), SelectionMode::Top, 4, &mut rng);
        assert_eq!(ids(&legs), vec!["M002", "M005"]);
    }

    #[test]
    fn test_selection_mode_parsing() {
        assert_eq!("top".parse::<SelectionMode>(), Ok(SelectionMode::Top));
        assert_eq!(" FROM_FEED ".parse::<SelectionMode>(), Ok(SelectionMode::FromFeed));
        assert_eq!("random".parse::<SelectionMode>(), Ok(SelectionMode::Random));
        assert!("best".parse::<SelectionMode>().is_err());
        assert_eq!(SelectionMode::FromFeed.to_string(), "from_feed");
    }
}
