use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::{decision, runtime, strategy};
use crate::error::ConfigError;
use crate::fibonacci::RatioSet;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "FIBROUTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProximityTier {
    /// Maximum relative distance `|price - level| / price` for this tier
    pub max_distance: f64,
    pub confidence: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub ratios: RatioSet,
    pub trend_lookback: usize,
    pub range_lookback: usize,
    /// Sorted tightest first during validation
    pub proximity_tiers: Vec<ProximityTier>,
    pub ml_confidence_floor: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            ratios: RatioSet::default(),
            trend_lookback: strategy::TREND_LOOKBACK,
            range_lookback: strategy::RANGE_LOOKBACK,
            proximity_tiers: strategy::PROXIMITY_TIERS
                .iter()
                .map(|&(max_distance, confidence)| ProximityTier {
                    max_distance,
                    confidence,
                })
                .collect(),
            ml_confidence_floor: strategy::ML_CONFIDENCE_FLOOR,
        }
    }
}

/// How the aggregator merges source signals.
///
/// Unrecognized names fall back to majority vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "snake_case")]
pub enum AggregationPolicy {
    #[default]
    WeightedVote,
    HighestConfidence,
    MajorityVote,
}

impl From<String> for AggregationPolicy {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weighted_vote" => AggregationPolicy::WeightedVote,
            "highest_confidence" => AggregationPolicy::HighestConfidence,
            "majority_vote" => AggregationPolicy::MajorityVote,
            other => {
                warn!("⚠️ [CONFIG] Unknown aggregation policy '{}', using majority_vote", other);
                AggregationPolicy::MajorityVote
            }
        }
    }
}

impl AggregationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationPolicy::WeightedVote => "weighted_vote",
            AggregationPolicy::HighestConfidence => "highest_confidence",
            AggregationPolicy::MajorityVote => "majority_vote",
        }
    }
}

/// Denominator used by the weighted vote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightNormalization {
    /// Divide by the sum of all confidences. A lone action always scores 1.0.
    #[default]
    ObservedTotal,
    /// Divide by the number of sources, i.e. a maximum of 1.0 per source.
    PerSource,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub policy: AggregationPolicy,
    pub threshold: f64,
    pub normalization: WeightNormalization,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            policy: AggregationPolicy::WeightedVote,
            threshold: decision::AGGREGATION_THRESHOLD,
            normalization: WeightNormalization::ObservedTotal,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    pub confidence_threshold: f64,
    pub history_capacity: usize,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: decision::CONFIDENCE_THRESHOLD,
            history_capacity: decision::HISTORY_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub symbol: String,
    pub timeframe: String,
    pub enabled_sources: Vec<String>,
    pub secondary_source: String,
    pub agreement_boost: f64,
    pub tick_cron: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC".to_string(),
            timeframe: "1h".to_string(),
            enabled_sources: vec![
                "single_swing".to_string(),
                "ensemble".to_string(),
                "ml_ready".to_string(),
            ],
            secondary_source: "range".to_string(),
            agreement_boost: decision::AGREEMENT_BOOST,
            tick_cron: runtime::TICK_CRON.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    #[default]
    Store,
    Http,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub kind: FeedKind,
    pub url: Option<String>,
    pub store_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            kind: FeedKind::Store,
            url: None,
            store_limit: runtime::STORE_BAR_LIMIT,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    #[default]
    Paper,
    Webhook,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub kind: ExecutorKind,
    pub url: Option<String>,
    /// Defaults to the router symbol
    pub default_symbol: Option<String>,
    pub default_amount: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::Paper,
            url: None,
            default_symbol: None,
            default_amount: runtime::DEFAULT_AMOUNT,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: runtime::API_BIND.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub router: RouterConfig,
    pub strategy: StrategyConfig,
    pub aggregation: AggregationConfig,
    pub smoother: SmootherConfig,
    pub feed: FeedConfig,
    pub executor: ExecutorConfig,
    pub api: ApiConfig,
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{} is outside [0, 1]", value),
        })
    }
}

impl AppConfig {
    /// Loads from `$FIBROUTER_CONFIG` or `config.yaml`. A missing file
    /// yields the defaults; a malformed one is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if !Path::new(&path).exists() {
            info!("ℹ️ [CONFIG] {} not found, using defaults", path);
            return AppConfig::default().validated();
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validated()
    }

    /// Checks ranges and normalizes the proximity tiers (tightest first).
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        check_unit("aggregation.threshold", self.aggregation.threshold)?;
        check_unit("smoother.confidence_threshold", self.smoother.confidence_threshold)?;
        check_unit("strategy.ml_confidence_floor", self.strategy.ml_confidence_floor)?;
        check_unit("router.agreement_boost", self.router.agreement_boost)?;

        if self.smoother.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "smoother.history_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.strategy.ratios.retracements.is_empty() {
            return Err(ConfigError::Invalid {
                field: "strategy.ratios.retracements",
                reason: "at least one ratio is required".to_string(),
            });
        }
        if self.strategy.trend_lookback == 0 || self.strategy.range_lookback == 0 {
            return Err(ConfigError::Invalid {
                field: "strategy.lookback",
                reason: "lookbacks must be at least 1".to_string(),
            });
        }
        if self.strategy.proximity_tiers.is_empty() {
            return Err(ConfigError::Invalid {
                field: "strategy.proximity_tiers",
                reason: "at least one tier is required".to_string(),
            });
        }
        for tier in &self.strategy.proximity_tiers {
            check_unit("strategy.proximity_tiers.confidence", tier.confidence)?;
            if !(tier.max_distance > 0.0 && tier.max_distance.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "strategy.proximity_tiers.max_distance",
                    reason: format!("{} must be positive", tier.max_distance),
                });
            }
        }
        self.strategy
            .proximity_tiers
            .sort_by(|a, b| a.max_distance.total_cmp(&b.max_distance));

        if self.router.secondary_source.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "router.secondary_source",
                reason: "a secondary source id is required".to_string(),
            });
        }
        if self.feed.kind == FeedKind::Http && self.feed.url.is_none() {
            return Err(ConfigError::Invalid {
                field: "feed.url",
                reason: "required when feed.kind is http".to_string(),
            });
        }
        if self.executor.kind == ExecutorKind::Webhook && self.executor.url.is_none() {
            return Err(ConfigError::Invalid {
                field: "executor.url",
                reason: "required when executor.kind is webhook".to_string(),
            });
        }
        Ok(self)
    }

    /// Symbol the executor trades when none is supplied.
    pub fn executor_symbol(&self) -> String {
        self.executor
            .default_symbol
            .clone()
            .unwrap_or_else(|| self.router.symbol.clone())
    }
}
