//! Merges the opinions of every enabled strategy source into one signal.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{AggregationConfig, AggregationPolicy, WeightNormalization};
use crate::data::snapshot::MarketSnapshot;
use crate::events::{Action, Signal};
use crate::fibonacci::LevelClassification;
use crate::strategies::SourceRegistry;

pub const AGGREGATE_ID: &str = "aggregate";

/// Merged signal plus every source signal that went into it, in registry order.
#[derive(Clone, Debug, Serialize)]
pub struct AggregateReport {
    pub signal: Signal,
    pub sources: Vec<Signal>,
}

/// Union of every source's levels.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AggregatedLevels {
    pub nearest_support: Option<f64>,
    pub nearest_resistance: Option<f64>,
    /// Descending, deduplicated
    pub support: Vec<f64>,
    /// Ascending, deduplicated
    pub resistance: Vec<f64>,
    pub per_source: Vec<(String, LevelClassification)>,
}

pub struct AdapterAggregator {
    registry: SourceRegistry,
    config: AggregationConfig,
}

impl AdapterAggregator {
    pub fn new(registry: SourceRegistry, config: AggregationConfig) -> Self {
        info!(
            "🧮 [AGGREGATOR] {} sources, policy={} threshold={:.2}",
            registry.len(),
            config.policy.as_str(),
            config.threshold
        );
        Self { registry, config }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    pub fn aggregate(&self, snapshot: &MarketSnapshot) -> Signal {
        self.aggregate_detailed(snapshot).signal
    }

    pub fn aggregate_detailed(&self, snapshot: &MarketSnapshot) -> AggregateReport {
        let sources: Vec<Signal> = self
            .registry
            .iter()
            .map(|source| {
                let signal = source.compute_signal(snapshot);
                debug!(
                    "[AGGREGATOR] {} → {} @ {:.2}",
                    signal.source_id, signal.action, signal.confidence
                );
                signal
            })
            .collect();

        let signal = merge_signals(&sources, &self.config);
        info!(
            "🧮 [AGGREGATOR] {} merged {} signals → {} @ {:.2}",
            snapshot.symbol,
            sources.len(),
            signal.action,
            signal.confidence
        );
        AggregateReport { signal, sources }
    }

    pub fn aggregate_levels(&self, snapshot: &MarketSnapshot) -> AggregatedLevels {
        let per_source: Vec<(String, LevelClassification)> = self
            .registry
            .iter()
            .map(|source| (source.id().to_string(), source.compute_levels(snapshot)))
            .collect();

        let mut support: Vec<f64> = per_source.iter().flat_map(|(_, l)| l.support.iter().copied()).collect();
        let mut resistance: Vec<f64> = per_source
            .iter()
            .flat_map(|(_, l)| l.resistance.iter().copied())
            .collect();

        support.sort_by(|a, b| b.total_cmp(a));
        support.dedup();
        resistance.sort_by(|a, b| a.total_cmp(b));
        resistance.dedup();

        AggregatedLevels {
            nearest_support: support.first().copied(),
            nearest_resistance: resistance.first().copied(),
            support,
            resistance,
            per_source,
        }
    }
}

/// Applies the configured policy to already-computed source signals.
///
/// No signals at all yields `{HOLD, 0.0}` under every policy.
pub fn merge_signals(signals: &[Signal], config: &AggregationConfig) -> Signal {
    if signals.is_empty() {
        return Signal::hold(AGGREGATE_ID);
    }
    match config.policy {
        AggregationPolicy::WeightedVote => weighted_vote(signals, config.threshold, config.normalization),
        AggregationPolicy::HighestConfidence => highest_confidence(signals, config.threshold),
        AggregationPolicy::MajorityVote => majority_vote(signals),
    }
}

/// First action in BUY, SELL, HOLD order with the strictly greatest score.
fn best_action(score: impl Fn(Action) -> f64) -> (Action, f64) {
    let mut best = (Action::Buy, score(Action::Buy));
    for action in &Action::ALL[1..] {
        let value = score(*action);
        if value > best.1 {
            best = (*action, value);
        }
    }
    best
}

/// Per-action confidence sums, normalized.
///
/// The winner must reach `threshold` both as its normalized share and as its
/// raw summed confidence; otherwise the result is `{HOLD, 0.0}`. With
/// `ObservedTotal` a lone action always reports 1.0.
fn weighted_vote(signals: &[Signal], threshold: f64, normalization: WeightNormalization) -> Signal {
    let sum = |action: Action| -> f64 {
        signals
            .iter()
            .filter(|s| s.action == action)
            .map(|s| s.confidence)
            .sum()
    };
    let total: f64 = signals.iter().map(|s| s.confidence).sum();
    if total <= 0.0 {
        return Signal::hold(AGGREGATE_ID);
    }

    let denominator = match normalization {
        WeightNormalization::ObservedTotal => total,
        WeightNormalization::PerSource => signals.len() as f64,
    };
    let (action, share) = best_action(|a| sum(a) / denominator);

    if share < threshold || sum(action) < threshold {
        debug!(
            "[AGGREGATOR] weighted vote {} share={:.2} raw={:.2} below {:.2}",
            action,
            share,
            sum(action),
            threshold
        );
        return Signal::hold(AGGREGATE_ID);
    }
    Signal::new(action, share, AGGREGATE_ID)
}

/// The single most confident source; the first one wins ties.
fn highest_confidence(signals: &[Signal], threshold: f64) -> Signal {
    let mut best = Signal::hold(AGGREGATE_ID);
    for signal in signals {
        if signal.confidence > best.confidence {
            best = signal.clone();
        }
    }
    if best.confidence < threshold {
        return Signal::hold(AGGREGATE_ID);
    }
    Signal {
        source_id: AGGREGATE_ID.to_string(),
        ..best
    }
}

/// One vote per source; confidence is the winning vote share. Not gated.
fn majority_vote(signals: &[Signal]) -> Signal {
    let votes = |action: Action| signals.iter().filter(|s| s.action == action).count() as f64;
    let (action, count) = best_action(votes);
    Signal::new(action, count / signals.len() as f64, AGGREGATE_ID)
}
