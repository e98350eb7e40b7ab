use tracing::debug;

use super::{check_snapshot, proximity_signal, StrategySource};
use crate::config::StrategyConfig;
use crate::constants::fibonacci::MIN_SWING_BARS;
use crate::data::snapshot::MarketSnapshot;
use crate::error::DataError;
use crate::events::{Signal, Trend};
use crate::fibonacci::indicators::trailing_mean;
use crate::fibonacci::{classify, compute_levels, find_swing_points, LevelClassification, LevelMap};

pub const SINGLE_SWING_ID: &str = "single_swing";

/// Levels from the most recent swing high/low pair.
#[derive(Clone, Debug)]
pub struct SingleSwingSource {
    id: String,
    config: StrategyConfig,
}

/// Swing pair the levels were projected from.
#[derive(Clone, Debug)]
pub struct SwingAnalysis {
    pub levels: LevelMap,
    pub trend: Trend,
    pub high_index: usize,
    pub low_index: usize,
}

impl SingleSwingSource {
    pub fn new(config: StrategyConfig) -> Self {
        Self::with_id(SINGLE_SWING_ID, config)
    }

    pub fn with_id(id: impl Into<String>, config: StrategyConfig) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Levels from the last swing high's bar high and the last swing low's
    /// bar low.
    ///
    /// The trend (price vs. trailing SMA) is informational only: it is
    /// reported in signal metadata and does not change which swing pair is
    /// used or how the levels are oriented.
    pub fn analyze(&self, snapshot: &MarketSnapshot) -> Result<SwingAnalysis, DataError> {
        if snapshot.len() < MIN_SWING_BARS {
            return Err(DataError::InsufficientData {
                symbol: snapshot.symbol.clone(),
                count: snapshot.len(),
                required: MIN_SWING_BARS,
            });
        }

        let closes = snapshot.closes();
        let swings = find_swing_points(&closes);
        let (high_index, low_index) = match (swings.last_high(), swings.last_low()) {
            (Some(h), Some(l)) => (h, l),
            _ => {
                return Err(DataError::NoSwingPoints {
                    symbol: snapshot.symbol.clone(),
                })
            }
        };

        let trend = match trailing_mean(&closes, self.config.trend_lookback) {
            Some(sma) if snapshot.current_price > sma => Trend::Up,
            _ => Trend::Down,
        };

        let swing_high = snapshot.bars[high_index].high;
        let swing_low = snapshot.bars[low_index].low;
        debug!(
            "[SWING] {} trend={:?} high[{}]={:.8} low[{}]={:.8}",
            snapshot.symbol, trend, high_index, swing_high, low_index, swing_low
        );

        Ok(SwingAnalysis {
            levels: compute_levels(swing_high, swing_low, &self.config.ratios),
            trend,
            high_index,
            low_index,
        })
    }
}

impl StrategySource for SingleSwingSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn compute_levels(&self, snapshot: &MarketSnapshot) -> LevelClassification {
        if check_snapshot(&self.id, snapshot).is_err() {
            return LevelClassification::default();
        }
        match self.analyze(snapshot) {
            Ok(analysis) => classify(&analysis.levels, snapshot.current_price),
            Err(_) => LevelClassification::default(),
        }
    }

    fn compute_signal(&self, snapshot: &MarketSnapshot) -> Signal {
        if let Err(hold) = check_snapshot(&self.id, snapshot) {
            return hold;
        }

        let analysis = match self.analyze(snapshot) {
            Ok(a) => a,
            Err(e) => {
                debug!("[SWING] {} holding for {}: {}", self.id, snapshot.symbol, e);
                return Signal::hold(&self.id).with_note(e.to_string());
            }
        };

        let levels = classify(&analysis.levels, snapshot.current_price);
        let mut signal = proximity_signal(
            &self.id,
            &levels,
            snapshot.current_price,
            &self.config.proximity_tiers,
        );
        if let Some(meta) = signal.metadata.as_mut() {
            meta.trend = Some(analysis.trend);
        }
        signal
    }
}
