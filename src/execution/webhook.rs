use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use super::{ensure_executable, ExecutionResult, OrderReceipt, TradeExecutor};
use crate::constants::runtime::HTTP_TIMEOUT_SECS;
use crate::error::ExecutionError;
use crate::events::Action;

/// Body posted to the collaborator.
#[derive(Debug, Serialize)]
pub struct WebhookOrder<'a> {
    pub action: Action,
    pub symbol: &'a str,
    pub amount: f64,
}

/// Optional fields the collaborator may answer with.
#[derive(Debug, Default, Deserialize)]
struct WebhookAck {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    price: Option<f64>,
}

/// Forwards orders to an external execution service as JSON.
#[derive(Clone)]
pub struct WebhookExecutor {
    client: Client,
    url: String,
    symbol: String,
    amount: f64,
}

impl WebhookExecutor {
    pub fn new(url: impl Into<String>, symbol: impl Into<String>, amount: f64) -> ExecutionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            symbol: symbol.into(),
            amount,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TradeExecutor for WebhookExecutor {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn execute(&self, action: Action) -> ExecutionResult<OrderReceipt> {
        ensure_executable(action)?;

        let order = WebhookOrder {
            action,
            symbol: &self.symbol,
            amount: self.amount,
        };
        let resp = self.client.post(&self.url).json(&order).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            error!("❌ [WEBHOOK] {} rejected {} order: {} {}", self.url, action, status, body);
            return Err(ExecutionError::Http {
                status: status.as_u16(),
                body,
            });
        }

        // Acknowledgement body is optional
        let ack: WebhookAck = serde_json::from_str(&body).unwrap_or_default();
        let receipt = OrderReceipt {
            order_id: ack.order_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            symbol: self.symbol.clone(),
            action,
            amount: self.amount,
            price: ack.price,
            simulated: false,
            timestamp: Utc::now(),
        };
        info!(
            "✅ [WEBHOOK] {} {} {} accepted (id: {})",
            action, receipt.amount, receipt.symbol, receipt.order_id
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_body_shape() {
        let order = WebhookOrder {
            action: Action::Sell,
            symbol: "BTC",
            amount: 0.01,
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["action"], "SELL");
        assert_eq!(json["symbol"], "BTC");
        assert_eq!(json["amount"], 0.01);
    }

    #[tokio::test]
    async fn test_webhook_rejects_hold_without_request() {
        let exec = WebhookExecutor::new("http://127.0.0.1:9/orders", "BTC", 0.01).unwrap();
        let err = exec.execute(Action::Hold).await.unwrap_err();
        assert!(matches!(err, ExecutionError::NotExecutable { .. }));
    }

    #[test]
    fn test_ack_parsing_tolerates_missing_fields() {
        let ack: WebhookAck = serde_json::from_str("{}").unwrap();
        assert!(ack.order_id.is_none());
        let ack: WebhookAck = serde_json::from_str(r#"{"order_id":"abc","price":101.5}"#).unwrap();
        assert_eq!(ack.order_id.as_deref(), Some("abc"));
        assert_eq!(ack.price, Some(101.5));
    }
}
