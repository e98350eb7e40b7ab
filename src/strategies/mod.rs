//! Strategy sources: independent opinions about one market snapshot.
//!
//! Every source answers two questions about a snapshot: where its
//! support/resistance levels sit, and what it would do right now. Sources
//! never fail; bad data degrades to `{HOLD, 0.0}`.

pub mod ensemble;
pub mod ml;
pub mod range;
pub mod registry;
pub mod single_swing;

use tracing::warn;

use crate::config::ProximityTier;
use crate::data::snapshot::MarketSnapshot;
use crate::error::DataError;
use crate::events::{Action, Signal, SignalMetadata};
use crate::fibonacci::LevelClassification;

pub use ensemble::EnsembleSource;
pub use ml::{Features, MlSource, Prediction, Predictor, UntrainedPredictor};
pub use range::RangeSource;
pub use registry::{SourceFactory, SourceRegistry};
pub use single_swing::SingleSwingSource;

pub trait StrategySource: Send + Sync {
    fn id(&self) -> &str;

    /// Support/resistance this source sees around the current price.
    fn compute_levels(&self, snapshot: &MarketSnapshot) -> LevelClassification;

    fn compute_signal(&self, snapshot: &MarketSnapshot) -> Signal;
}

/// Validates the snapshot, logging and returning the `{HOLD, 0.0}` signal
/// on failure.
pub(crate) fn check_snapshot(source_id: &str, snapshot: &MarketSnapshot) -> Result<(), Signal> {
    snapshot.validate().map_err(|e: DataError| {
        warn!("⚠️ [STRATEGY] {} rejected snapshot for {}: {}", source_id, snapshot.symbol, e);
        Signal::hold(source_id).with_note(e.to_string())
    })
}

/// Proximity rule shared by the level-based sources.
///
/// The action is decided against the widest tier: BUY when price sits within
/// it above the nearest support, otherwise SELL when it sits within it below
/// the nearest resistance. The confidence then comes from the tightest tier
/// the chosen side satisfies. No tier matching means HOLD with zero
/// confidence. A missing side never matches.
pub fn proximity_signal(
    source_id: &str,
    levels: &LevelClassification,
    current_price: f64,
    tiers: &[ProximityTier],
) -> Signal {
    let support_distance = levels.support_distance(current_price);
    let resistance_distance = levels.resistance_distance(current_price);

    let metadata = SignalMetadata {
        nearest_support: levels.nearest_support(),
        nearest_resistance: levels.nearest_resistance(),
        support_distance: support_distance.is_finite().then_some(support_distance),
        resistance_distance: resistance_distance.is_finite().then_some(resistance_distance),
        ..SignalMetadata::default()
    };

    if let Some(confidence) = tier_confidence(support_distance, tiers) {
        return Signal::new(Action::Buy, confidence, source_id).with_metadata(metadata);
    }
    if let Some(confidence) = tier_confidence(resistance_distance, tiers) {
        return Signal::new(Action::Sell, confidence, source_id).with_metadata(metadata);
    }

    Signal::hold(source_id).with_metadata(metadata)
}

/// Confidence of the tightest tier containing `distance`.
fn tier_confidence(distance: f64, tiers: &[ProximityTier]) -> Option<f64> {
    tiers
        .iter()
        .filter(|tier| distance < tier.max_distance)
        .min_by(|a, b| a.max_distance.total_cmp(&b.max_distance))
        .map(|tier| tier.confidence)
}
