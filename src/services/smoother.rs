use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::config::SmootherConfig;
use crate::constants::decision::{SMOOTHING_WINDOW, TREND_CONFIRMATION};
use crate::events::{Action, Signal};

/// One combined signal the smoother saw, with what it decided.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Action proposed by the combined signal
    pub action: Action,
    pub confidence: f64,
    /// Action the smoother committed to
    pub decision: Action,
    pub timestamp: DateTime<Utc>,
}

/// Final gate before execution: confidence threshold plus a short
/// trend-consistency check over the latest combined signals.
///
/// Cloning shares the history, so the router and the API see the same one.
#[derive(Clone)]
pub struct DecisionSmoother {
    history: Arc<Mutex<VecDeque<HistoryEntry>>>,
    confidence_threshold: f64,
    capacity: usize,
}

impl DecisionSmoother {
    pub fn new(config: &SmootherConfig) -> Self {
        let capacity = config.history_capacity.max(1);
        Self {
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            confidence_threshold: config.confidence_threshold,
            capacity,
        }
    }

    /// Records the signal and decides what to do about it.
    ///
    /// Every signal enters the history, including ones below the confidence
    /// threshold. A poisoned history lock yields HOLD.
    pub fn analyze(&self, signal: &Signal) -> Action {
        let mut history = match self.history.lock() {
            Ok(h) => h,
            Err(e) => {
                error!("❌ [SMOOTHER] History unavailable, holding: {}", e);
                return Action::Hold;
            }
        };

        history.push_back(HistoryEntry {
            action: signal.action,
            confidence: signal.confidence,
            decision: Action::Hold,
            timestamp: Utc::now(),
        });
        while history.len() > self.capacity {
            history.pop_front();
        }

        let decision = if signal.confidence < self.confidence_threshold {
            info!(
                "🛑 [SMOOTHER] Confidence {:.2} below threshold {:.2}",
                signal.confidence, self.confidence_threshold
            );
            Action::Hold
        } else {
            let recent: Vec<Action> = history.iter().rev().take(SMOOTHING_WINDOW).map(|e| e.action).collect();
            confirm_trend(signal.action, &recent)
        };
        if let Some(entry) = history.back_mut() {
            entry.decision = decision;
        }

        info!(
            "🧭 [SMOOTHER] Decision: {} (signal {} @ {:.2})",
            decision, signal.action, signal.confidence
        );
        decision
    }

    /// Oldest first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        match self.history.lock() {
            Ok(h) => h.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn latest(&self) -> Option<HistoryEntry> {
        self.history.lock().ok().and_then(|h| h.back().cloned())
    }

    pub fn reset_history(&self) {
        match self.history.lock() {
            Ok(mut h) => h.clear(),
            Err(poisoned) => {
                poisoned.into_inner().clear();
                self.history.clear_poison();
            }
        }
        info!("🧹 [SMOOTHER] Signal history reset");
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// `recent` is newest first and includes the current action.
fn confirm_trend(current: Action, recent: &[Action]) -> Action {
    if recent.len() < SMOOTHING_WINDOW {
        return current;
    }

    let count = |a: Action| recent.iter().filter(|&&w| w == a).count();
    if count(current) >= TREND_CONFIRMATION {
        current
    } else if count(Action::Buy) > 0 && count(Action::Sell) > 0 {
        Action::Hold
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_trend_short_history() {
        assert_eq!(confirm_trend(Action::Sell, &[Action::Sell, Action::Buy]), Action::Sell);
    }

    #[test]
    fn test_confirm_trend_hold_with_single_side() {
        let recent = [Action::Hold, Action::Buy, Action::Hold];
        assert_eq!(confirm_trend(Action::Hold, &recent), Action::Hold);
    }

    #[test]
    fn test_poisoned_history_holds_until_reset() {
        let smoother = DecisionSmoother::new(&SmootherConfig::default());
        let shared = smoother.clone();
        let result = std::thread::spawn(move || {
            let _guard = shared.history.lock().unwrap();
            panic!("writer died holding the history lock");
        })
        .join();
        assert!(result.is_err());
        assert!(smoother.history.is_poisoned());

        let strong_buy = Signal::new(Action::Buy, 0.9, "aggregate");
        assert_eq!(smoother.analyze(&strong_buy), Action::Hold);
        assert!(smoother.history().is_empty());
        assert!(smoother.latest().is_none());

        smoother.reset_history();
        assert!(!smoother.history.is_poisoned());
        assert_eq!(smoother.analyze(&strong_buy), Action::Buy);
        assert_eq!(smoother.history().len(), 1);
        assert_eq!(smoother.latest().map(|e| e.decision), Some(Action::Buy));
    }
}
