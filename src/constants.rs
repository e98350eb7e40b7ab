//! Application-wide constants and magic numbers
//!
//! This module centralizes the tuning values of the signal pipeline so the
//! configuration defaults and the algorithms agree on them.

/// Fibonacci ratio sets
pub mod fibonacci {
    /// Canonical retracement ratios, low endpoint first
    pub const RETRACEMENT_RATIOS: [f64; 7] = [0.0, 0.236, 0.382, 0.5, 0.618, 0.786, 1.0];

    /// Canonical extension ratios (projected above the swing high)
    pub const EXTENSION_RATIOS: [f64; 4] = [1.618, 2.618, 3.618, 4.236];

    /// Bars needed on each side of a swing point
    pub const SWING_NEIGHBORS: usize = 2;

    /// Minimum bars for swing detection (one full 5-bar window)
    pub const MIN_SWING_BARS: usize = 2 * SWING_NEIGHBORS + 1;
}

/// Strategy source defaults
pub mod strategy {
    /// Trailing SMA length used to decide trend direction
    pub const TREND_LOOKBACK: usize = 14;

    /// Trailing window for the range source's extremes
    pub const RANGE_LOOKBACK: usize = 100;

    /// Proximity tiers as (max relative distance, confidence), tightest first
    pub const PROXIMITY_TIERS: [(f64, f64); 2] = [(0.005, 0.8), (0.01, 0.7)];

    /// ML predictions below this confidence fall back to the swing rule
    pub const ML_CONFIDENCE_FLOOR: f64 = 0.6;

    /// Trailing window for the ensemble's mean high/low heuristic
    pub const ENSEMBLE_MEAN_WINDOW: usize = 20;

    /// Trailing window for the ensemble's SMA band heuristic
    pub const ENSEMBLE_SMA_WINDOW: usize = 10;

    /// Half-width of the ensemble's SMA band (5%)
    pub const ENSEMBLE_SMA_BAND: f64 = 0.05;

    /// Feature windows for the ML predictor
    pub const MOMENTUM_WINDOW: usize = 5;
    pub const VOLATILITY_WINDOW: usize = 10;
    pub const VOLUME_WINDOW: usize = 10;
}

/// Aggregation and smoothing defaults
pub mod decision {
    /// Minimum aggregated confidence before a non-HOLD action is emitted
    pub const AGGREGATION_THRESHOLD: f64 = 0.6;

    /// Smoother confidence floor
    pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

    /// Bonus added when the ensemble and secondary sources agree
    pub const AGREEMENT_BOOST: f64 = 0.2;

    /// Default DecisionHistory capacity
    pub const HISTORY_CAPACITY: usize = 100;

    /// Sliding window inspected by the smoother
    pub const SMOOTHING_WINDOW: usize = 3;

    /// Occurrences of the current action inside the window that confirm a trend
    pub const TREND_CONFIRMATION: usize = 2;
}

/// Runtime defaults
pub mod runtime {
    /// Tick every minute, on the minute
    pub const TICK_CRON: &str = "0 * * * * *";

    /// Bars kept per symbol in the in-memory market store
    pub const STORE_BAR_LIMIT: usize = 500;

    /// Paper executor receipts kept in memory
    pub const RECEIPT_LIMIT: usize = 1000;

    /// Default order amount handed to executors
    pub const DEFAULT_AMOUNT: f64 = 0.01;

    /// HTTP timeout for collaborator calls (seconds)
    pub const HTTP_TIMEOUT_SECS: u64 = 10;

    /// Event bus capacity
    pub const BUS_CAPACITY: usize = 1000;

    pub const API_BIND: &str = "0.0.0.0:3000";
}

/// Logging event names for structured logging
pub mod events {
    pub const TICK_STARTED: &str = "tick_started";
    pub const TICK_ABANDONED: &str = "tick_abandoned";
    pub const DECISION_EMITTED: &str = "decision_emitted";
    pub const ORDER_SUBMITTED: &str = "order_submitted";
    pub const ORDER_FAILED: &str = "order_failed";
    pub const SOURCE_SKIPPED: &str = "source_skipped";
}
