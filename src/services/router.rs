//! Signal router: one tick turns a market snapshot into at most one order.
//!
//! Per tick the router fetches a snapshot, lets the aggregator merge every
//! enabled source, asks the secondary source for a second opinion, boosts
//! the merged confidence when both agree, and hands the result to the
//! smoother. BUY/SELL decisions go to the executor. Executor failures are
//! logged and reported on the bus; they never retract a decision.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bus::EventBus;
use crate::constants::events::{DECISION_EMITTED, ORDER_FAILED, ORDER_SUBMITTED, TICK_ABANDONED, TICK_STARTED};
use crate::data::feed::MarketDataProvider;
use crate::error::TickError;
use crate::events::{Action, Event, ExecutionReport, FinalDecision, Signal};
use crate::execution::TradeExecutor;
use crate::services::aggregator::AdapterAggregator;
use crate::services::smoother::DecisionSmoother;
use crate::strategies::StrategySource;

/// Merges the aggregated signal with the secondary source's action.
///
/// The result keeps the aggregated action; its confidence grows by `boost`
/// (capped at 1.0) when both actions agree and is untouched otherwise.
pub fn combine_signals(aggregated: &Signal, secondary: Action, boost: f64) -> Signal {
    let confidence = if aggregated.action == secondary {
        (aggregated.confidence + boost).min(1.0)
    } else {
        aggregated.confidence
    };

    let mut combined = Signal::new(aggregated.action, confidence, aggregated.source_id.clone());
    let mut metadata = aggregated.metadata.clone().unwrap_or_default();
    metadata.secondary_action = Some(secondary);
    combined.metadata = Some(metadata);
    combined
}

pub struct SignalRouter {
    symbol: String,
    feed: Arc<dyn MarketDataProvider>,
    aggregator: AdapterAggregator,
    secondary: Arc<dyn StrategySource>,
    smoother: DecisionSmoother,
    executor: Arc<dyn TradeExecutor>,
    bus: EventBus,
    agreement_boost: f64,
    in_flight: Mutex<()>,
}

impl SignalRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: impl Into<String>,
        feed: Arc<dyn MarketDataProvider>,
        aggregator: AdapterAggregator,
        secondary: Arc<dyn StrategySource>,
        smoother: DecisionSmoother,
        executor: Arc<dyn TradeExecutor>,
        bus: EventBus,
        agreement_boost: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            feed,
            aggregator,
            secondary,
            smoother,
            executor,
            bus,
            agreement_boost,
            in_flight: Mutex::new(()),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn smoother(&self) -> &DecisionSmoother {
        &self.smoother
    }

    pub fn aggregator(&self) -> &AdapterAggregator {
        &self.aggregator
    }

    /// Runs one tick. `None` means the tick was abandoned or skipped; the
    /// reason has already been logged.
    pub async fn tick(&self) -> Option<FinalDecision> {
        match self.try_tick().await {
            Ok(decision) => Some(decision),
            Err(TickError::InProgress) => {
                warn!(event = TICK_ABANDONED, "⏭️ [ROUTER] Previous tick still running, skipping");
                None
            }
            Err(e) => {
                error!(event = TICK_ABANDONED, "❌ [ROUTER] Tick abandoned for {}: {}", self.symbol, e);
                None
            }
        }
    }

    pub async fn try_tick(&self) -> Result<FinalDecision, TickError> {
        let _guard = self.in_flight.try_lock().map_err(|_| TickError::InProgress)?;
        info!(event = TICK_STARTED, "🔄 [ROUTER] Tick for {} via {} feed", self.symbol, self.feed.name());

        let snapshot = self.feed.snapshot().await?;
        self.bus.emit(Event::Snapshot(snapshot.clone()));

        let report = self.aggregator.aggregate_detailed(&snapshot);
        for signal in &report.sources {
            self.bus.emit(Event::Signal(signal.clone()));
        }

        let secondary = self.secondary.compute_signal(&snapshot);
        info!(
            "🔀 [ROUTER] Aggregated {} @ {:.2}, secondary {} says {}",
            report.signal.action,
            report.signal.confidence,
            secondary.source_id,
            secondary.action
        );

        let combined = combine_signals(&report.signal, secondary.action, self.agreement_boost);
        self.bus.emit(Event::Signal(combined.clone()));

        let action = self.smoother.analyze(&combined);
        let decision = FinalDecision {
            symbol: snapshot.symbol.clone(),
            action,
            confidence: combined.confidence,
            timestamp: Utc::now(),
        };
        info!(
            event = DECISION_EMITTED,
            "🎯 [ROUTER] Decision for {}: {} (combined {:.2})", decision.symbol, decision.action, decision.confidence
        );
        self.bus.emit(Event::Decision(decision.clone()));

        if action.is_executable() {
            self.execute(&decision).await;
        } else {
            info!("⏸️ [ROUTER] Holding position. No action taken.");
        }

        Ok(decision)
    }

    async fn execute(&self, decision: &FinalDecision) {
        let report = match self.executor.execute(decision.action).await {
            Ok(receipt) => {
                info!(
                    event = ORDER_SUBMITTED,
                    "⚡ [ROUTER] {} order submitted via {} (id: {})",
                    decision.action,
                    self.executor.name(),
                    receipt.order_id
                );
                ExecutionReport {
                    symbol: receipt.symbol,
                    action: receipt.action,
                    order_id: Some(receipt.order_id),
                    status: "submitted".to_string(),
                    detail: None,
                    timestamp: receipt.timestamp,
                }
            }
            Err(e) => {
                error!(
                    event = ORDER_FAILED,
                    "❌ [ROUTER] {} order via {} failed: {}",
                    decision.action,
                    self.executor.name(),
                    e
                );
                ExecutionReport {
                    symbol: decision.symbol.clone(),
                    action: decision.action,
                    order_id: None,
                    status: "failed".to_string(),
                    detail: Some(e.to_string()),
                    timestamp: Utc::now(),
                }
            }
        };
        self.bus.emit(Event::Execution(report));
    }
}
