//! Ensemble of independent support/resistance heuristics.
//!
//! Each heuristic looks at the bar window with its own simple statistic and
//! proposes one (support, resistance) pair. The ensemble's levels are the
//! arithmetic means of those pairs, and the signal follows the same
//! proximity rule as the swing-based sources.

use tracing::debug;

use super::{check_snapshot, proximity_signal, StrategySource};
use crate::config::StrategyConfig;
use crate::constants::strategy::{ENSEMBLE_MEAN_WINDOW, ENSEMBLE_SMA_BAND, ENSEMBLE_SMA_WINDOW};
use crate::data::snapshot::MarketSnapshot;
use crate::events::Signal;
use crate::fibonacci::indicators::{max, mean, min, trailing_mean};
use crate::fibonacci::LevelClassification;

pub const ENSEMBLE_ID: &str = "ensemble";

/// Columns of the snapshot the heuristics read.
pub struct Window {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
}

impl Window {
    fn from_snapshot(snapshot: &MarketSnapshot) -> Self {
        Self {
            highs: snapshot.highs(),
            lows: snapshot.lows(),
            closes: snapshot.closes(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelPair {
    pub support: f64,
    pub resistance: f64,
}

pub type Heuristic = fn(&Window) -> Option<LevelPair>;

/// Window extremes with a fixed retracement ratio from each end.
fn extreme_ratio(window: &Window, ratio: f64) -> Option<LevelPair> {
    let high = max(&window.highs)?;
    let low = min(&window.lows)?;
    let diff = high - low;
    Some(LevelPair {
        support: low + diff * ratio,
        resistance: high - diff * ratio,
    })
}

fn extreme_236(window: &Window) -> Option<LevelPair> {
    extreme_ratio(window, 0.236)
}

fn extreme_382(window: &Window) -> Option<LevelPair> {
    extreme_ratio(window, 0.382)
}

fn extreme_618(window: &Window) -> Option<LevelPair> {
    extreme_ratio(window, 0.618)
}

fn extreme_786(window: &Window) -> Option<LevelPair> {
    extreme_ratio(window, 0.786)
}

/// Midpoint of the close peak and trough.
fn close_midpoint(window: &Window) -> Option<LevelPair> {
    let peak = max(&window.closes)?;
    let trough = min(&window.closes)?;
    let diff = peak - trough;
    Some(LevelPair {
        support: trough + 0.5 * diff,
        resistance: peak - 0.5 * diff,
    })
}

/// 0.382 retracement between the trailing mean high and mean low.
fn mean_range_382(window: &Window) -> Option<LevelPair> {
    let high = trailing_mean(&window.highs, ENSEMBLE_MEAN_WINDOW)?;
    let low = trailing_mean(&window.lows, ENSEMBLE_MEAN_WINDOW)?;
    let diff = high - low;
    Some(LevelPair {
        support: low + 0.382 * diff,
        resistance: high - 0.382 * diff,
    })
}

/// Fixed-width band around the trailing close SMA.
fn sma_band(window: &Window) -> Option<LevelPair> {
    let sma = trailing_mean(&window.closes, ENSEMBLE_SMA_WINDOW)?;
    Some(LevelPair {
        support: sma * (1.0 - ENSEMBLE_SMA_BAND),
        resistance: sma * (1.0 + ENSEMBLE_SMA_BAND),
    })
}

pub const HEURISTICS: [(&str, Heuristic); 7] = [
    ("extreme_236", extreme_236),
    ("extreme_382", extreme_382),
    ("close_midpoint", close_midpoint),
    ("extreme_618", extreme_618),
    ("mean_range_382", mean_range_382),
    ("sma_band", sma_band),
    ("extreme_786", extreme_786),
];

#[derive(Clone, Debug)]
pub struct EnsembleSource {
    id: String,
    config: StrategyConfig,
}

impl EnsembleSource {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            id: ENSEMBLE_ID.to_string(),
            config,
        }
    }

    /// Every heuristic's pair, in table order.
    pub fn heuristic_levels(&self, snapshot: &MarketSnapshot) -> Vec<(&'static str, LevelPair)> {
        let window = Window::from_snapshot(snapshot);
        HEURISTICS
            .iter()
            .filter_map(|(name, heuristic)| heuristic(&window).map(|pair| (*name, pair)))
            .collect()
    }

    /// Mean support and mean resistance across the heuristics.
    pub fn mean_levels(&self, snapshot: &MarketSnapshot) -> Option<LevelPair> {
        let pairs = self.heuristic_levels(snapshot);
        let supports: Vec<f64> = pairs.iter().map(|(_, p)| p.support).collect();
        let resistances: Vec<f64> = pairs.iter().map(|(_, p)| p.resistance).collect();
        let pair = LevelPair {
            support: mean(&supports)?,
            resistance: mean(&resistances)?,
        };
        debug!(
            "[ENSEMBLE] {} heuristics → support={:.8} resistance={:.8}",
            pairs.len(),
            pair.support,
            pair.resistance
        );
        Some(pair)
    }
}

impl StrategySource for EnsembleSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn compute_levels(&self, snapshot: &MarketSnapshot) -> LevelClassification {
        if check_snapshot(&self.id, snapshot).is_err() {
            return LevelClassification::default();
        }
        match self.mean_levels(snapshot) {
            Some(pair) => LevelClassification::from_prices(
                [pair.support, pair.resistance],
                snapshot.current_price,
            ),
            None => LevelClassification::default(),
        }
    }

    fn compute_signal(&self, snapshot: &MarketSnapshot) -> Signal {
        if let Err(hold) = check_snapshot(&self.id, snapshot) {
            return hold;
        }
        let levels = self.compute_levels(snapshot);
        proximity_signal(
            &self.id,
            &levels,
            snapshot.current_price,
            &self.config.proximity_tiers,
        )
    }
}
