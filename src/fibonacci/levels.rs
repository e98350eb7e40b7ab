//! Fibonacci retracement/extension levels and their support/resistance split.

use serde::{Deserialize, Serialize};

use crate::constants::fibonacci::{EXTENSION_RATIOS, RETRACEMENT_RATIOS};

/// Ratios used to project levels from a swing pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    pub retracements: Vec<f64>,
    #[serde(default)]
    pub extensions: Option<Vec<f64>>,
}

impl Default for RatioSet {
    fn default() -> Self {
        Self {
            retracements: RETRACEMENT_RATIOS.to_vec(),
            extensions: None,
        }
    }
}

impl RatioSet {
    /// Canonical retracements plus the canonical extensions.
    pub fn with_extensions() -> Self {
        Self {
            retracements: RETRACEMENT_RATIOS.to_vec(),
            extensions: Some(EXTENSION_RATIOS.to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        self.retracements.len() + self.extensions.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
    Retracement,
    Extension,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub ratio: f64,
    pub price: f64,
    pub kind: LevelKind,
}

/// Ratio → price mapping for one swing pair, in ratio-set order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelMap {
    pub swing_high: f64,
    pub swing_low: f64,
    pub levels: Vec<Level>,
}

impl LevelMap {
    /// Price of the retracement level for `ratio`, if the ratio set has it.
    pub fn retracement(&self, ratio: f64) -> Option<f64> {
        self.find(ratio, LevelKind::Retracement)
    }

    pub fn extension(&self, ratio: f64) -> Option<f64> {
        self.find(ratio, LevelKind::Extension)
    }

    fn find(&self, ratio: f64, kind: LevelKind) -> Option<f64> {
        self.levels
            .iter()
            .find(|l| l.kind == kind && (l.ratio - ratio).abs() < 1e-12)
            .map(|l| l.price)
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.levels.iter().map(|l| l.price)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn range(&self) -> f64 {
        self.swing_high - self.swing_low
    }
}

/// Projects Fibonacci levels from a swing pair.
///
/// Retracement ratio 0 maps to the swing low and ratio 1 to the swing high;
/// every other retracement is measured down from the high
/// (`high - range * ratio`). Extensions are projected above the high
/// (`high + range * (ratio - 1)`). Reversed inputs are reordered, and a zero
/// range yields a degenerate map rather than an error.
pub fn compute_levels(swing_high: f64, swing_low: f64, ratios: &RatioSet) -> LevelMap {
    let (high, low) = if swing_high >= swing_low {
        (swing_high, swing_low)
    } else {
        (swing_low, swing_high)
    };
    let range = high - low;

    let mut levels = Vec::with_capacity(ratios.len());
    for &ratio in &ratios.retracements {
        let price = if ratio == 0.0 {
            low
        } else if ratio == 1.0 {
            high
        } else {
            high - range * ratio
        };
        levels.push(Level {
            ratio,
            price,
            kind: LevelKind::Retracement,
        });
    }

    if let Some(extensions) = &ratios.extensions {
        for &ratio in extensions {
            levels.push(Level {
                ratio,
                price: high + range * (ratio - 1.0),
                kind: LevelKind::Extension,
            });
        }
    }

    LevelMap {
        swing_high: high,
        swing_low: low,
        levels,
    }
}

/// Levels split around the current price.
///
/// `support` holds levels strictly below the price, nearest first
/// (descending); `resistance` holds levels at or above it, nearest first
/// (ascending).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelClassification {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

impl LevelClassification {
    pub fn from_prices(prices: impl IntoIterator<Item = f64>, current_price: f64) -> Self {
        let (mut support, mut resistance): (Vec<f64>, Vec<f64>) =
            prices.into_iter().partition(|&p| p < current_price);
        support.sort_by(|a, b| b.total_cmp(a));
        resistance.sort_by(|a, b| a.total_cmp(b));
        Self { support, resistance }
    }

    pub fn nearest_support(&self) -> Option<f64> {
        self.support.first().copied()
    }

    pub fn nearest_resistance(&self) -> Option<f64> {
        self.resistance.first().copied()
    }

    /// Relative distance down to the nearest support; infinite when there is none.
    pub fn support_distance(&self, current_price: f64) -> f64 {
        match self.nearest_support() {
            Some(level) if current_price > 0.0 => (current_price - level) / current_price,
            _ => f64::INFINITY,
        }
    }

    /// Relative distance up to the nearest resistance; infinite when there is none.
    pub fn resistance_distance(&self, current_price: f64) -> f64 {
        match self.nearest_resistance() {
            Some(level) if current_price > 0.0 => (level - current_price) / current_price,
            _ => f64::INFINITY,
        }
    }

    pub fn len(&self) -> usize {
        self.support.len() + self.resistance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.resistance.is_empty()
    }
}

pub fn classify(levels: &LevelMap, current_price: f64) -> LevelClassification {
    LevelClassification::from_prices(levels.prices(), current_price)
}
