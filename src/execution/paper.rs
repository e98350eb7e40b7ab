use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

use super::{ensure_executable, ExecutionResult, OrderReceipt, TradeExecutor};
use crate::constants::runtime::RECEIPT_LIMIT;
use crate::data::store::MarketStore;
use crate::events::Action;

/// Simulation-mode executor. Nothing leaves the process; every order is
/// acknowledged and kept in a bounded receipt log.
#[derive(Clone)]
pub struct PaperExecutor {
    symbol: String,
    amount: f64,
    receipts: Arc<Mutex<VecDeque<OrderReceipt>>>,
    limit: usize,
    prices: Option<MarketStore>,
}

impl PaperExecutor {
    pub fn new(symbol: impl Into<String>, amount: f64) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
            receipts: Arc::new(Mutex::new(VecDeque::new())),
            limit: RECEIPT_LIMIT,
            prices: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Stamps receipts with the store's latest price for the symbol.
    pub fn with_price_source(mut self, store: MarketStore) -> Self {
        self.prices = Some(store);
        self
    }

    /// Oldest first.
    pub fn receipts(&self) -> Vec<OrderReceipt> {
        let receipts = self.receipts.lock().unwrap_or_else(|p| p.into_inner());
        receipts.iter().cloned().collect()
    }
}

#[async_trait]
impl TradeExecutor for PaperExecutor {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn execute(&self, action: Action) -> ExecutionResult<OrderReceipt> {
        ensure_executable(action)?;

        let receipt = OrderReceipt {
            order_id: Uuid::new_v4().to_string(),
            symbol: self.symbol.clone(),
            action,
            amount: self.amount,
            price: self.prices.as_ref().and_then(|s| s.latest_price(&self.symbol)),
            simulated: true,
            timestamp: Utc::now(),
        };

        {
            let mut receipts = self.receipts.lock().unwrap_or_else(|p| p.into_inner());
            receipts.push_back(receipt.clone());
            while receipts.len() > self.limit {
                receipts.pop_front();
            }
        }

        info!(
            "📝 [PAPER] Simulated {} {} {} @ {} (id: {})",
            action,
            receipt.amount,
            receipt.symbol,
            receipt
                .price
                .map(|p| format!("${:.8}", p))
                .unwrap_or_else(|| "market".to_string()),
            receipt.order_id
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::snapshot::Bar;
    use crate::error::ExecutionError;

    #[tokio::test]
    async fn test_paper_buy_records_receipt() {
        let exec = PaperExecutor::new("BTC", 0.01);
        let receipt = exec.execute(Action::Buy).await.unwrap();
        assert_eq!(receipt.symbol, "BTC");
        assert_eq!(receipt.amount, 0.01);
        assert!(receipt.simulated);
        assert!(receipt.price.is_none());
        assert_eq!(exec.receipts(), vec![receipt]);
    }

    #[tokio::test]
    async fn test_paper_rejects_hold() {
        let exec = PaperExecutor::new("BTC", 0.01);
        let err = exec.execute(Action::Hold).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NotExecutable { .. }));
        assert!(exec.receipts().is_empty());
    }

    #[tokio::test]
    async fn test_paper_receipts_bounded() {
        let exec = PaperExecutor::new("BTC", 0.01).with_limit(3);
        for _ in 0..5 {
            exec.execute(Action::Sell).await.unwrap();
        }
        assert_eq!(exec.receipts().len(), 3);
    }

    #[tokio::test]
    async fn test_paper_uses_store_price() {
        let store = MarketStore::new(10);
        store.update_bar("BTC", "1h", Bar::new(100.0, 101.0, 99.0, 100.5, 1.0));
        let exec = PaperExecutor::new("BTC", 0.5).with_price_source(store);
        let receipt = exec.execute(Action::Sell).await.unwrap();
        assert_eq!(receipt.price, Some(100.5));
    }
}
