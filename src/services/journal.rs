use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::events::{Action, Event, ExecutionReport, FinalDecision, Signal};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JournalSummary {
    pub snapshots: u64,
    pub signals: u64,

    pub decisions: u64,
    pub buys: u64,
    pub sells: u64,
    pub holds: u64,

    pub orders_submitted: u64,
    pub orders_failed: u64,

    /// Signals seen per source id
    pub per_source: HashMap<String, u64>,

    pub last_decision: Option<FinalDecision>,
    pub last_execution: Option<ExecutionReport>,

    /// Events dropped because the journal fell behind the bus
    pub lagged: u64,
}

/// Event bus subscriber that logs and tallies pipeline activity.
#[derive(Clone, Default)]
pub struct EventJournal {
    summary: Arc<Mutex<JournalSummary>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JournalSummary> {
        self.summary.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn summary(&self) -> JournalSummary {
        self.lock().clone()
    }

    pub fn start(&self, event_bus: &EventBus) -> tokio::task::JoinHandle<()> {
        let mut rx = event_bus.subscribe();
        let journal = self.clone();

        tokio::spawn(async move {
            info!("📒 [JOURNAL] Event journal started");
            loop {
                match rx.recv().await {
                    Ok(event) => journal.record(&event),
                    Err(RecvError::Lagged(n)) => {
                        warn!("⚠️ [JOURNAL] Fell behind, {} events dropped", n);
                        journal.lock().lagged += n;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            info!("📒 [JOURNAL] Event bus closed, journal stopped");
        })
    }

    pub fn record(&self, event: &Event) {
        match event {
            Event::Snapshot(snapshot) => {
                debug!(
                    "[JOURNAL] Snapshot {} {} ({} bars @ {:.8})",
                    snapshot.symbol,
                    snapshot.timeframe,
                    snapshot.len(),
                    snapshot.current_price
                );
                self.lock().snapshots += 1;
            }
            Event::Signal(signal) => self.on_signal(signal),
            Event::Decision(decision) => self.on_decision(decision),
            Event::Execution(report) => self.on_execution(report),
        }
    }

    fn on_signal(&self, signal: &Signal) {
        debug!(
            "[JOURNAL] Signal {} → {} @ {:.2}",
            signal.source_id, signal.action, signal.confidence
        );
        let mut s = self.lock();
        s.signals += 1;
        *s.per_source.entry(signal.source_id.clone()).or_insert(0) += 1;
    }

    fn on_decision(&self, decision: &FinalDecision) {
        info!(
            "📒 [JOURNAL] {} {} @ {:.2} ({})",
            decision.symbol,
            decision.action,
            decision.confidence,
            decision.timestamp.to_rfc3339()
        );
        let mut s = self.lock();
        s.decisions += 1;
        match decision.action {
            Action::Buy => s.buys += 1,
            Action::Sell => s.sells += 1,
            Action::Hold => s.holds += 1,
        }
        s.last_decision = Some(decision.clone());
    }

    fn on_execution(&self, report: &ExecutionReport) {
        let mut s = self.lock();
        if report.status == "submitted" {
            s.orders_submitted += 1;
        } else {
            s.orders_failed += 1;
        }
        s.last_execution = Some(report.clone());
    }
}
