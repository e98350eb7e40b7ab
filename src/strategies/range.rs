use super::{check_snapshot, proximity_signal, StrategySource};
use crate::config::StrategyConfig;
use crate::data::snapshot::MarketSnapshot;
use crate::events::Signal;
use crate::fibonacci::indicators::{max, min};
use crate::fibonacci::{classify, compute_levels, LevelClassification, LevelMap};

pub const RANGE_ID: &str = "range";

/// Levels from the extremes of the trailing window: highest high and lowest
/// low over the last `range_lookback` bars.
#[derive(Clone, Debug)]
pub struct RangeSource {
    id: String,
    config: StrategyConfig,
}

impl RangeSource {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            id: RANGE_ID.to_string(),
            config,
        }
    }

    pub fn window_levels(&self, snapshot: &MarketSnapshot) -> Option<LevelMap> {
        let start = snapshot.len().saturating_sub(self.config.range_lookback);
        let window = &snapshot.bars[start..];
        let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
        Some(compute_levels(max(&highs)?, min(&lows)?, &self.config.ratios))
    }
}

impl StrategySource for RangeSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn compute_levels(&self, snapshot: &MarketSnapshot) -> LevelClassification {
        if check_snapshot(&self.id, snapshot).is_err() {
            return LevelClassification::default();
        }
        self.window_levels(snapshot)
            .map(|levels| classify(&levels, snapshot.current_price))
            .unwrap_or_default()
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
