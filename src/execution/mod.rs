//! Trade execution collaborators.
//!
//! The router hands an executor nothing but the committed action; symbol and
//! amount are the executor's own defaults.

pub mod paper;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AppConfig, ExecutorKind};
use crate::data::store::MarketStore;
use crate::error::ExecutionError;
use crate::events::Action;

pub use paper::PaperExecutor;
pub use webhook::WebhookExecutor;

pub type ExecutionResult<T> = Result<T, ExecutionError>;

/// Acknowledgement of one submitted order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub symbol: String,
    pub action: Action,
    pub amount: f64,
    /// Reference price at submission, when known
    pub price: Option<f64>,
    pub simulated: bool,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait TradeExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Submits a BUY or SELL. HOLD is rejected with `NotExecutable`.
    async fn execute(&self, action: Action) -> ExecutionResult<OrderReceipt>;
}

pub(crate) fn ensure_executable(action: Action) -> ExecutionResult<()> {
    if action.is_executable() {
        Ok(())
    } else {
        Err(ExecutionError::NotExecutable {
            action: action.to_string(),
        })
    }
}

pub fn build_executor(config: &AppConfig, store: Option<MarketStore>) -> ExecutionResult<Arc<dyn TradeExecutor>> {
    let symbol = config.executor_symbol();
    let amount = config.executor.default_amount;

    match config.executor.kind {
        ExecutorKind::Paper => {
            let mut paper = PaperExecutor::new(symbol, amount);
            if let Some(store) = store {
                paper = paper.with_price_source(store);
            }
            Ok(Arc::new(paper))
        }
        ExecutorKind::Webhook => {
            let url = config.executor.url.clone().unwrap_or_default();
            Ok(Arc::new(WebhookExecutor::new(url, symbol, amount)?))
        }
    }
}
