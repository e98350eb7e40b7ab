//! Market snapshot suppliers.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::snapshot::{MarketSnapshot, SnapshotPayload};
use super::store::MarketStore;
use crate::constants::runtime::HTTP_TIMEOUT_SECS;
use crate::error::FeedError;

pub type FeedResult<T> = Result<T, FeedError>;

/// Supplies one snapshot per router tick.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn snapshot(&self) -> FeedResult<MarketSnapshot>;
}

/// Serves snapshots out of the in-memory [`MarketStore`].
#[derive(Clone)]
pub struct StoreFeed {
    store: MarketStore,
    symbol: String,
}

impl StoreFeed {
    pub fn new(store: MarketStore, symbol: impl Into<String>) -> Self {
        Self {
            store,
            symbol: symbol.into(),
        }
    }
}

#[async_trait]
impl MarketDataProvider for StoreFeed {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn snapshot(&self) -> FeedResult<MarketSnapshot> {
        let snapshot = self.store.snapshot(&self.symbol).ok_or_else(|| FeedError::NoData {
            symbol: self.symbol.clone(),
        })?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

/// Fetches a column-oriented JSON snapshot from a collaborator service:
/// `GET {url}?symbol=..&timeframe=..`.
#[derive(Clone)]
pub struct HttpFeed {
    client: Client,
    url: Url,
    symbol: String,
    timeframe: String,
}

impl HttpFeed {
    pub fn new(url: &str, symbol: impl Into<String>, timeframe: impl Into<String>) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            url: Url::parse(url)?,
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        })
    }

    pub fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_pair("symbol", &self.symbol)
            .append_pair("timeframe", &self.timeframe);
        url
    }
}

#[async_trait]
impl MarketDataProvider for HttpFeed {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn snapshot(&self) -> FeedResult<MarketSnapshot> {
        let url = self.request_url();
        debug!("[FEED] GET {}", url);

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(FeedError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let mut payload: SnapshotPayload = serde_json::from_str(&body)?;
        // Fill identity from our own request when the collaborator omits it.
        payload.symbol.get_or_insert_with(|| self.symbol.clone());
        payload.timeframe.get_or_insert_with(|| self.timeframe.clone());

        Ok(MarketSnapshot::try_from(payload)?)
    }
}
