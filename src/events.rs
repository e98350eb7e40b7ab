use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::data::snapshot::MarketSnapshot;

/// Trading action proposed by a source or committed by the smoother.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    /// Tie-break order used by every aggregation policy.
    pub const ALL: [Action; 3] = [Action::Buy, Action::Sell, Action::Hold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self, Action::Buy | Action::Sell)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    /// Case-insensitive, so "buy", "Buy" and "BUY" all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Action::Buy),
            "sell" => Ok(Action::Sell),
            "hold" => Ok(Action::Hold),
            other => Err(format!("unknown action '{}'", other)),
        }
    }
}

/// Up or down, decided by price vs. a trailing SMA.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// Optional context attached to a signal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_support: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nearest_resistance: Option<f64>,
    /// `(price - support) / price`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_distance: Option<f64>,
    /// `(resistance - price) / price`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resistance_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_confidence: Option<f64>,
    /// Action proposed by the router's secondary source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: Action,
    /// Always within [0, 1]
    pub confidence: f64,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SignalMetadata>,
}

impl Signal {
    pub fn new(action: Action, confidence: f64, source_id: impl Into<String>) -> Self {
        Self {
            action,
            confidence: clamp_confidence(confidence),
            source_id: source_id.into(),
            metadata: None,
        }
    }

    /// The `{HOLD, 0.0}` signal every failure path degrades to.
    pub fn hold(source_id: impl Into<String>) -> Self {
        Self::new(Action::Hold, 0.0, source_id)
    }

    pub fn with_metadata(mut self, metadata: SignalMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.metadata.get_or_insert_with(SignalMetadata::default).note = Some(note.into());
        self
    }
}

/// NaN collapses to 0.0 so a broken source can never win a vote.
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Terminal output of one router tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinalDecision {
    pub symbol: String,
    pub action: Action,
    /// Confidence of the combined signal the smoother received
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub symbol: String,
    pub action: Action,
    pub order_id: Option<String>,
    /// "submitted" | "failed"
    pub status: String,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// Global Event Enum
#[derive(Clone, Debug)]
pub enum Event {
    Snapshot(MarketSnapshot),
    Signal(Signal),
    Decision(FinalDecision),
    Execution(ExecutionReport),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Snapshot(_) => "snapshot",
            Event::Signal(_) => "signal",
            Event::Decision(_) => "decision",
            Event::Execution(_) => "execution",
        }
    }
}
