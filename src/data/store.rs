use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use super::snapshot::{Bar, MarketSnapshot};

#[derive(Clone, Debug, Default)]
struct SymbolSeries {
    timeframe: String,
    bars: VecDeque<Bar>,
    last_price: Option<f64>,
}

/// Bounded in-memory bar history, one series per symbol.
#[derive(Clone, Debug)]
pub struct MarketStore {
    series: Arc<Mutex<HashMap<String, SymbolSeries>>>,
    pub limit: usize,
}

impl MarketStore {
    pub fn new(limit: usize) -> Self {
        Self {
            series: Arc::new(Mutex::new(HashMap::new())),
            limit: limit.max(1),
        }
    }

    // A panic while holding the lock leaves the map itself consistent,
    // so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, SymbolSeries>> {
        self.series.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn update_bar(&self, symbol: &str, timeframe: &str, bar: Bar) {
        let mut map = self.lock();
        let series = map.entry(symbol.to_string()).or_default();
        if series.timeframe != timeframe {
            // A new timeframe starts a new series
            series.bars.clear();
            series.timeframe = timeframe.to_string();
        }
        if series.bars.len() >= self.limit {
            series.bars.pop_front();
        }
        series.last_price = Some(bar.close);
        series.bars.push_back(bar);
    }

    pub fn update_price(&self, symbol: &str, price: f64) {
        let mut map = self.lock();
        map.entry(symbol.to_string()).or_default().last_price = Some(price);
    }

    /// Replaces the whole series with the snapshot's bars and price.
    pub fn ingest_snapshot(&self, snapshot: &MarketSnapshot) {
        let skip = snapshot.bars.len().saturating_sub(self.limit);
        let series = SymbolSeries {
            timeframe: snapshot.timeframe.clone(),
            bars: snapshot.bars.iter().skip(skip).cloned().collect(),
            last_price: Some(snapshot.current_price),
        };
        self.lock().insert(snapshot.symbol.clone(), series);
    }

    pub fn get_bar_history(&self, symbol: &str) -> Vec<Bar> {
        let map = self.lock();
        map.get(symbol)
            .map(|s| s.bars.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_latest_bar(&self, symbol: &str) -> Option<Bar> {
        let map = self.lock();
        map.get(symbol).and_then(|s| s.bars.back()).cloned()
    }

    pub fn latest_price(&self, symbol: &str) -> Option<f64> {
        let map = self.lock();
        map.get(symbol).and_then(|s| s.last_price)
    }

    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.lock().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Builds a snapshot from the stored series. Returns `None` when the
    /// symbol has no bars yet.
    pub fn snapshot(&self, symbol: &str) -> Option<MarketSnapshot> {
        let map = self.lock();
        let series = map.get(symbol)?;
        if series.bars.is_empty() {
            return None;
        }
        let bars: Vec<Bar> = series.bars.iter().cloned().collect();
        let current_price = series
            .last_price
            .or_else(|| bars.last().map(|b| b.close))?;
        Some(MarketSnapshot::new(
            symbol,
            series.timeframe.clone(),
            bars,
            current_price,
        ))
    }
}
