//! Market snapshots handed to the strategy sources once per tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp: None,
        }
    }
}

/// Immutable view of one symbol's recent price series.
///
/// Bars are time-ordered with the most recent bar last.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub timeframe: String,
    pub bars: Vec<Bar>,
    pub current_price: f64,
}

impl MarketSnapshot {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: impl Into<String>,
        bars: Vec<Bar>,
        current_price: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
            bars,
            current_price,
        }
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Checks everything the strategy sources rely on: at least one bar,
    /// a positive finite price, and finite non-negative OHLCV values.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.bars.is_empty() {
            return Err(DataError::EmptyBars {
                symbol: self.symbol.clone(),
            });
        }
        if !self.current_price.is_finite() || self.current_price <= 0.0 {
            return Err(DataError::InvalidPrice {
                symbol: self.symbol.clone(),
                price: self.current_price,
            });
        }
        for (index, bar) in self.bars.iter().enumerate() {
            let fields = [
                ("open", bar.open),
                ("high", bar.high),
                ("low", bar.low),
                ("close", bar.close),
                ("volume", bar.volume),
            ];
            for (field, value) in fields {
                if !value.is_finite() || value < 0.0 {
                    return Err(DataError::InvalidBar {
                        symbol: self.symbol.clone(),
                        index,
                        field,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Column-oriented wire form of a snapshot, as produced by the external
/// market-data collaborator. Every OHLCV column is required; the current
/// price defaults to the last close.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
    pub open: Option<Vec<f64>>,
    pub high: Option<Vec<f64>>,
    pub low: Option<Vec<f64>>,
    pub close: Option<Vec<f64>>,
    pub volume: Option<Vec<f64>>,
    #[serde(default)]
    pub timestamps: Option<Vec<DateTime<Utc>>>,
    pub current_price: Option<f64>,
}

fn required(column: Option<Vec<f64>>, field: &str) -> Result<Vec<f64>, DataError> {
    column.ok_or_else(|| DataError::MissingField {
        field: field.to_string(),
    })
}

impl TryFrom<SnapshotPayload> for MarketSnapshot {
    type Error = DataError;

    fn try_from(payload: SnapshotPayload) -> Result<Self, Self::Error> {
        let symbol = payload.symbol.ok_or_else(|| DataError::MissingField {
            field: "symbol".to_string(),
        })?;
        let timeframe = payload.timeframe.unwrap_or_else(|| "1h".to_string());

        let close = required(payload.close, "close")?;
        let open = required(payload.open, "open")?;
        let high = required(payload.high, "high")?;
        let low = required(payload.low, "low")?;
        let volume = required(payload.volume, "volume")?;

        let expected = close.len();
        for (field, column) in [("open", &open), ("high", &high), ("low", &low), ("volume", &volume)] {
            if column.len() != expected {
                return Err(DataError::LengthMismatch {
                    field,
                    expected,
                    actual: column.len(),
                });
            }
        }
        if let Some(ts) = &payload.timestamps {
            if ts.len() != expected {
                return Err(DataError::LengthMismatch {
                    field: "timestamps",
                    expected,
                    actual: ts.len(),
                });
            }
        }

        let bars: Vec<Bar> = (0..expected)
            .map(|i| Bar {
                open: open[i],
                high: high[i],
                low: low[i],
                close: close[i],
                volume: volume[i],
                timestamp: payload.timestamps.as_ref().map(|ts| ts[i]),
            })
            .collect();

        let current_price = match payload.current_price.or_else(|| close.last().copied()) {
            Some(price) => price,
            None => return Err(DataError::EmptyBars { symbol }),
        };

        let snapshot = MarketSnapshot {
            symbol,
            timeframe,
            bars,
            current_price,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SnapshotPayload {
        SnapshotPayload {
            symbol: Some("BTC".to_string()),
            timeframe: Some("1h".to_string()),
            open: Some(vec![100.0, 101.0, 102.0]),
            high: Some(vec![101.0, 103.0, 104.0]),
            low: Some(vec![99.0, 100.0, 101.0]),
            close: Some(vec![100.5, 102.5, 103.0]),
            volume: Some(vec![10.0, 12.0, 9.0]),
            timestamps: None,
            current_price: None,
        }
    }

    #[test]
    fn test_payload_converts_to_bars() {
        let snapshot = MarketSnapshot::try_from(payload()).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.bars[1].high, 103.0);
        // Falls back to the last close
        assert_eq!(snapshot.current_price, 103.0);
    }

    #[test]
    fn test_payload_missing_column() {
        let mut p = payload();
        p.volume = None;
        let err = MarketSnapshot::try_from(p).unwrap_err();
        assert_eq!(
            err,
            DataError::MissingField {
                field: "volume".to_string()
            }
        );
    }

    #[test]
    fn test_payload_length_mismatch() {
        let mut p = payload();
        p.high = Some(vec![101.0]);
        let err = MarketSnapshot::try_from(p).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { field: "high", .. }));
    }

    #[test]
    fn test_validate_rejects_bad_price() {
        let snapshot = MarketSnapshot::new("ETH", "1h", vec![Bar::new(1.0, 1.0, 1.0, 1.0, 1.0)], 0.0);
        assert!(matches!(
            snapshot.validate(),
            Err(DataError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan_bar() {
        let snapshot = MarketSnapshot::new(
            "ETH",
            "1h",
            vec![Bar::new(1.0, f64::NAN, 1.0, 1.0, 1.0)],
            1.0,
        );
        assert_eq!(
            snapshot.validate(),
            Err(DataError::InvalidBar {
                symbol: "ETH".to_string(),
                index: 0,
                field: "high"
            })
        );
    }
}
