//! Core data types shared across calculators

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::error::{SignalError, SignalResult};

/// Ticker of a series, e.g. `SPY` or `2330.TW`
///
/// Shared as `Arc<str>`: pair scans clone both tickers into every candidate.
/// Surrounding whitespace is dropped so `"AAPL, MSFT"` splits cleanly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(ticker: impl AsRef<str>) -> Self {
        Symbol(Arc::from(ticker.as_ref().trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Symbol {
    fn from(ticker: &str) -> Self {
        Symbol::new(ticker)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ticker = String::deserialize(deserializer)?;
        Ok(Symbol::new(ticker))
    }
}

/// One trade (or bulk-classified bar) fed to the VPIN estimator.
///
/// `direction > 0` counts as buy volume, anything else as sell volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeTick {
    pub volume: f64,
    pub direction: f64,
}

impl VolumeTick {
    pub fn new(volume: f64, direction: f64) -> Self {
        Self { volume, direction }
    }

    /// Classify a bar by the sign of its price change (bulk classification)
    pub fn from_price_change(volume: f64, price_change: f64) -> Self {
        let direction = if price_change > 0.0 {
            1.0
        } else if price_change < 0.0 {
            -1.0
        } else {
            0.0
        };
        Self::new(volume, direction)
    }

    #[inline]
    pub fn is_buy(&self) -> bool {
        self.direction > 0.0
    }
}

/// Column-major matrix of aligned series (T rows x N columns).
///
/// Callers align and truncate their series before building one; construction
/// rejects ragged input instead of silently truncating.
#[derive(Debug, Clone, Default)]
pub struct SeriesMatrix {
    columns: Vec<Vec<f64>>,
    rows: usize,
}

impl SeriesMatrix {
    pub fn from_columns(columns: Vec<Vec<f64>>) -> SignalResult<Self> {
        let rows = columns.first().map_or(0, Vec::len);
        for (column, values) in columns.iter().enumerate() {
            if values.len() != rows {
                return Err(SignalError::LengthMismatch {
                    column,
                    expected: rows,
                    actual: values.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build from row-major data, the layout CSV readers produce.
    pub fn from_rows(rows: &[Vec<f64>]) -> SignalResult<Self> {
        let width = rows.first().map_or(0, Vec::len);
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SignalError::InvalidConfiguration(format!(
                    "row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    width
                )));
            }
            for (column, &value) in row.iter().enumerate() {
                columns[column].push(value);
            }
        }
        Self::from_columns(columns)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn columns(&self) -> impl Iterator<Item = &[f64]> {
        self.columns.iter().map(Vec::as_slice)
    }
}

/// Simple returns from a price path (`p[t] / p[t-1] - 1`).
///
/// Non-positive previous prices produce a zero return rather than infinity.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_serializes_as_plain_string() {
        let symbol = Symbol::new("2330.TW");
        assert_eq!(serde_json::to_string(&symbol).unwrap(), "\"2330.TW\"");
        let parsed: Symbol = serde_json::from_str("\" 2330.TW \"").unwrap();
        assert_eq!(parsed, symbol);
        assert_eq!(Symbol::from(" SPY\t").to_string(), "SPY");
    }

    #[test]
    fn test_volume_tick_direction() {
        assert!(VolumeTick::from_price_change(10.0, 0.5).is_buy());
        assert!(!VolumeTick::from_price_change(10.0, -0.5).is_buy());
        assert!(!VolumeTick::from_price_change(10.0, 0.0).is_buy());
    }

    #[test]
    fn test_matrix_rejects_ragged_columns() {
        let err = SeriesMatrix::from_columns(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            SignalError::LengthMismatch {
                column: 1,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_matrix_from_rows() {
        let m = SeriesMatrix::from_rows(&[vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]])
            .unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.column(1), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_simple_returns() {
        let r = simple_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] + 0.10).abs() < 1e-12);
    }
}
