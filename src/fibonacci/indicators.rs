//! Small statistics over price columns. Pure, no I/O.

use crate::constants::fibonacci::{MIN_SWING_BARS, SWING_NEIGHBORS};

/// Indices of local extremes in a close series.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwingPoints {
    pub highs: Vec<usize>,
    pub lows: Vec<usize>,
}

impl SwingPoints {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    pub fn last_high(&self) -> Option<usize> {
        self.highs.last().copied()
    }

    pub fn last_low(&self) -> Option<usize> {
        self.lows.last().copied()
    }
}

/// Finds swing highs/lows over a 5-bar window.
///
/// Index `i` is a swing high iff `closes[i]` is strictly greater than both
/// neighbors on each side, and a swing low iff strictly less. Fewer than five
/// closes yields empty sets.
pub fn find_swing_points(closes: &[f64]) -> SwingPoints {
    let mut points = SwingPoints::default();
    if closes.len() < MIN_SWING_BARS {
        return points;
    }

    for i in SWING_NEIGHBORS..closes.len() - SWING_NEIGHBORS {
        let c = closes[i];
        let neighbors = (1..=SWING_NEIGHBORS).flat_map(|k| [closes[i - k], closes[i + k]]);

        if neighbors.clone().all(|n| c > n) {
            points.highs.push(i);
        }
        if neighbors.into_iter().all(|n| c < n) {
            points.lows.push(i);
        }
    }
    points
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of the last `period` values (all of them when fewer are available).
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    let start = values.len().saturating_sub(period.max(1));
    mean(&values[start..])
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Simple returns `close[i] / close[i-1] - 1`, skipping zero denominators.
pub fn returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_mean_uses_available_values() {
        assert_eq!(trailing_mean(&[1.0, 2.0, 3.0], 14), Some(2.0));
        assert_eq!(trailing_mean(&[1.0, 2.0, 3.0, 5.0], 2), Some(4.0));
        assert_eq!(trailing_mean(&[], 3), None);
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_returns_skip_zero() {
        let r = returns(&[0.0, 100.0, 110.0]);
        assert_eq!(r.len(), 1);
        assert!((r[0] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(max(&[1.0, 5.0, 3.0]), Some(5.0));
        assert_eq!(min(&[1.0, 5.0, 3.0]), Some(1.0));
        assert_eq!(max(&[]), None);
    }
}
