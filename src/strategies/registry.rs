use std::sync::Arc;
use tracing::{info, warn};

use super::ensemble::{EnsembleSource, ENSEMBLE_ID};
use super::ml::{MlSource, Predictor, UntrainedPredictor, ML_ID};
use super::range::{RangeSource, RANGE_ID};
use super::single_swing::{SingleSwingSource, SINGLE_SWING_ID};
use super::StrategySource;
use crate::config::StrategyConfig;
use crate::constants::events::SOURCE_SKIPPED;
use crate::error::SourceError;

/// Every id the factory knows how to build.
pub const KNOWN_SOURCES: [&str; 4] = [SINGLE_SWING_ID, ENSEMBLE_ID, ML_ID, RANGE_ID];

/// Builds strategy sources by id.
#[derive(Clone)]
pub struct SourceFactory {
    config: StrategyConfig,
    predictor: Arc<dyn Predictor>,
}

impl SourceFactory {
    pub fn new(config: StrategyConfig) -> Self {
        Self {
            config,
            predictor: Arc::new(UntrainedPredictor),
        }
    }

    pub fn with_predictor(mut self, predictor: Arc<dyn Predictor>) -> Self {
        self.predictor = predictor;
        self
    }

    pub fn build(&self, id: &str) -> Result<Arc<dyn StrategySource>, SourceError> {
        let config = self.config.clone();
        match id.trim().to_ascii_lowercase().as_str() {
            SINGLE_SWING_ID => Ok(Arc::new(SingleSwingSource::new(config))),
            ENSEMBLE_ID => Ok(Arc::new(EnsembleSource::new(config))),
            ML_ID => Ok(Arc::new(MlSource::new(config, self.predictor.clone()))),
            RANGE_ID => Ok(Arc::new(RangeSource::new(config))),
            _ => Err(SourceError::Unknown { id: id.to_string() }),
        }
    }
}

/// Ordered set of enabled sources. Order is the order sources are queried
/// in, which decides ties in every aggregation policy.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn StrategySource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds each configured id in order. Ids that fail to build are
    /// logged and left out; the rest keep working.
    pub fn from_ids(factory: &SourceFactory, ids: &[String]) -> Self {
        let mut registry = Self::new();
        for id in ids {
            let result = factory.build(id).and_then(|source| registry.register(source));
            if let Err(e) = result {
                warn!(event = SOURCE_SKIPPED, "⚠️ [REGISTRY] Skipping source: {}", e);
            }
        }
        info!("📋 [REGISTRY] Enabled sources: {:?}", registry.ids());
        registry
    }

    pub fn register(&mut self, source: Arc<dyn StrategySource>) -> Result<(), SourceError> {
        if self.get(source.id()).is_some() {
            return Err(SourceError::Duplicate {
                id: source.id().to_string(),
            });
        }
        self.sources.push(source);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn StrategySource>> {
        self.sources.iter().find(|s| s.id() == id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StrategySource>> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
