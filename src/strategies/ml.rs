//! ML-ready strategy source.
//!
//! The learned model is an opaque [`Predictor`] injected at construction.
//! This crate never trains one; the production default is
//! [`UntrainedPredictor`], which makes the source behave exactly like the
//! single-swing rule.

use std::sync::Arc;
use tracing::debug;

use super::single_swing::SingleSwingSource;
use super::{check_snapshot, StrategySource};
use crate::config::StrategyConfig;
use crate::constants::strategy::{MOMENTUM_WINDOW, VOLATILITY_WINDOW, VOLUME_WINDOW};
use crate::data::snapshot::MarketSnapshot;
use crate::events::{clamp_confidence, Action, Signal};
use crate::fibonacci::indicators::{returns, std_dev, trailing_mean};
use crate::fibonacci::{LevelClassification, LevelMap};

pub const ML_ID: &str = "ml_ready";

/// Inputs handed to the predictor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Features {
    /// `(price - level) / price` for every level of the swing map
    pub level_distances: Vec<f64>,
    /// Mean of the last 5 close returns
    pub momentum: f64,
    /// Std-dev of the last 10 close returns
    pub volatility: f64,
    /// Last volume over the mean of the last 10
    pub volume_ratio: f64,
    pub last_return: f64,
}

impl Features {
    pub fn extract(snapshot: &MarketSnapshot, levels: Option<&LevelMap>) -> Self {
        let price = snapshot.current_price;
        let level_distances = levels
            .map(|map| map.prices().map(|l| (price - l) / price).collect())
            .unwrap_or_default();

        let rets = returns(&snapshot.closes());
        let momentum = trailing_mean(&rets, MOMENTUM_WINDOW).unwrap_or(0.0);
        let vol_start = rets.len().saturating_sub(VOLATILITY_WINDOW);
        let volatility = std_dev(&rets[vol_start..]).unwrap_or(0.0);

        let volumes = snapshot.volumes();
        let volume_ratio = match (volumes.last(), trailing_mean(&volumes, VOLUME_WINDOW)) {
            (Some(&last), Some(avg)) if avg > 0.0 => last / avg,
            _ => 1.0,
        };

        Self {
            level_distances,
            momentum,
            volatility,
            volume_ratio,
            last_return: rets.last().copied().unwrap_or(0.0),
        }
    }

    /// Flat vector in a stable order: distances, then the four price features.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut v = self.level_distances.clone();
        v.extend([self.momentum, self.volatility, self.volume_ratio, self.last_return]);
        v
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub action: Action,
    pub confidence: f64,
}

/// Opaque learned model.
pub trait Predictor: Send + Sync {
    /// False until a model is trained or loaded.
    fn is_ready(&self) -> bool;

    /// `None` means the model had no opinion.
    fn predict(&self, features: &Features) -> Option<Prediction>;
}

/// Stand-in used when no model is available.
#[derive(Clone, Copy, Debug, Default)]
pub struct UntrainedPredictor;

impl Predictor for UntrainedPredictor {
    fn is_ready(&self) -> bool {
        false
    }

    fn predict(&self, _features: &Features) -> Option<Prediction> {
        None
    }
}

pub struct MlSource {
    id: String,
    fallback: SingleSwingSource,
    predictor: Arc<dyn Predictor>,
    confidence_floor: f64,
}

impl MlSource {
    pub fn new(config: StrategyConfig, predictor: Arc<dyn Predictor>) -> Self {
        let confidence_floor = config.ml_confidence_floor;
        Self {
            id: ML_ID.to_string(),
            fallback: SingleSwingSource::with_id(ML_ID, config),
            predictor,
            confidence_floor,
        }
    }

    pub fn confidence_floor(&self) -> f64 {
        self.confidence_floor
    }
}

impl StrategySource for MlSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn compute_levels(&self, snapshot: &MarketSnapshot) -> LevelClassification {
        self.fallback.compute_levels(snapshot)
    }

    /// Prediction when it clears the floor and beats the swing rule;
    /// the swing rule otherwise.
    fn compute_signal(&self, snapshot: &MarketSnapshot) -> Signal {
        if let Err(hold) = check_snapshot(&self.id, snapshot) {
            return hold;
        }

        let fallback = self.fallback.compute_signal(snapshot);
        if !self.predictor.is_ready() {
            debug!("[ML] {} predictor not ready, using swing rule", self.id);
            return fallback;
        }

        let analysis = self.fallback.analyze(snapshot).ok();
        let features = Features::extract(snapshot, analysis.as_ref().map(|a| &a.levels));
        let prediction = match self.predictor.predict(&features) {
            Some(p) => Prediction {
                action: p.action,
                confidence: clamp_confidence(p.confidence),
            },
            None => {
                debug!("[ML] {} predictor abstained, using swing rule", self.id);
                return fallback;
            }
        };

        let mut metadata = fallback.metadata.clone().unwrap_or_default();
        metadata.ml_prediction = Some(prediction.action);
        metadata.ml_confidence = Some(prediction.confidence);

        if prediction.confidence < self.confidence_floor || prediction.confidence < fallback.confidence {
            debug!(
                "[ML] {} prediction {} ({:.2}) not used, floor {:.2}, swing {:.2}",
                self.id, prediction.action, prediction.confidence, self.confidence_floor, fallback.confidence
            );
            return Signal {
                metadata: Some(metadata),
                ..fallback
            };
        }

        Signal::new(prediction.action, prediction.confidence, &self.id).with_metadata(metadata)
    }
}
