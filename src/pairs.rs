//! Statistical arbitrage pair screening
//!
//! Screens every unordered pair of a universe for correlated returns, fits a
//! hedge ratio by OLS and measures how stretched and how mean-reverting the
//! resulting price spread is. This is an approximation, not a cointegration
//! test: the half-life comes from an AR(1) fit of the spread on its own lag.

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::stats;
use crate::types::{SeriesMatrix, Symbol};

/// Half-life reported for spreads that do not mean-revert (phi outside (0, 1))
pub const INVALID_HALF_LIFE: f64 = 999.0;

/// Observations required before the hedge ratio is estimated
const MIN_HEDGE_OBSERVATIONS: usize = 10;
/// Observations required before the spread z-score is computed
const MIN_SPREAD_OBSERVATIONS: usize = 20;

/// Pair screening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairConfig {
    /// Minimum absolute return correlation for a pair to be kept
    pub min_correlation: f64,
    /// |z| beyond which a spread trade is signalled
    pub entry_zscore: f64,
    /// Longest acceptable half-life, in periods
    pub max_half_life: f64,
}

impl Default for PairConfig {
    fn default() -> Self {
        PairConfig {
            min_correlation: 0.7,
            entry_zscore: 2.0,
            max_half_life: 30.0,
        }
    }
}

/// Trading signal for a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSignal {
    /// Half-life invalid or too long
    NoOpportunity,
    /// Spread rich: short A, long B
    ShortSpread,
    /// Spread cheap: long A, short B
    LongSpread,
    Wait,
}

impl PairSignal {
    pub fn description(&self) -> &'static str {
        match self {
            PairSignal::NoOpportunity => "Half-life too long or invalid",
            PairSignal::ShortSpread => "Z above threshold: short A, long B",
            PairSignal::LongSpread => "Z below threshold: long A, short B",
            PairSignal::Wait => "Z inside band",
        }
    }
}

/// One screened pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCandidate {
    pub symbol_a: Symbol,
    pub symbol_b: Symbol,
    pub correlation: f64,
    pub hedge_ratio: f64,
    pub spread_zscore: f64,
    pub half_life_days: f64,
    pub signal: PairSignal,
}

/// Z-score and half-life of a price spread
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadStats {
    pub zscore: f64,
    pub half_life: f64,
}

/// OLS hedge ratio `cov(a, b) / var(b)` of two return series
///
/// Defaults to 1.0 with fewer than ten observations or a flat `b`.
pub fn estimate_hedge_ratio(returns_a: &[f64], returns_b: &[f64]) -> f64 {
    if returns_a.len() != returns_b.len() || returns_a.len() < MIN_HEDGE_OBSERVATIONS {
        return 1.0;
    }

    let var_b = stats::sample_variance(returns_b);
    if var_b == 0.0 {
        return 1.0;
    }
    stats::sample_covariance(returns_a, returns_b) / var_b
}

/// Half-life of a spread from the AR(1) slope of `spread[t]` on `spread[t-1]`
pub fn spread_half_life(spread: &[f64]) -> f64 {
    if spread.len() < 3 {
        return 0.0;
    }

    match stats::ols_slope(&spread[..spread.len() - 1], &spread[1..]) {
        Some(phi) if phi > 0.0 && phi < 1.0 => {
            let half_life = -std::f64::consts::LN_2 / phi.ln();
            if half_life.is_finite() {
                half_life
            } else {
                INVALID_HALF_LIFE
            }
        }
        _ => INVALID_HALF_LIFE,
    }
}

/// Z-score of the latest spread value and the spread's half-life
///
/// `spread = prices_a - hedge_ratio * prices_b`. Fewer than twenty
/// observations or a flat spread give a zero z-score and zero half-life.
pub fn spread_zscore(prices_a: &[f64], prices_b: &[f64], hedge_ratio: f64) -> SpreadStats {
    let flat = SpreadStats {
        zscore: 0.0,
        half_life: 0.0,
    };
    if prices_a.len() != prices_b.len() || prices_a.len() < MIN_SPREAD_OBSERVATIONS {
        return flat;
    }

    let spread: Vec<f64> = prices_a
        .iter()
        .zip(prices_b)
        .map(|(&a, &b)| a - hedge_ratio * b)
        .collect();

    let std = stats::population_std(&spread);
    if std == 0.0 {
        return flat;
    }

    let last = spread[spread.len() - 1];
    SpreadStats {
        zscore: (last - stats::mean(&spread)) / std,
        half_life: spread_half_life(&spread),
    }
}

/// Map a spread reading to a trading signal
pub fn classify_pair(zscore: f64, half_life: f64, config: &PairConfig) -> PairSignal {
    if half_life > config.max_half_life || half_life <= 0.0 {
        return PairSignal::NoOpportunity;
    }

    if zscore > config.entry_zscore {
        PairSignal::ShortSpread
    } else if zscore < -config.entry_zscore {
        PairSignal::LongSpread
    } else {
        PairSignal::Wait
    }
}

/// Screen one pair; `None` when it fails the correlation screen
fn screen_pair(
    symbol_a: &Symbol,
    symbol_b: &Symbol,
    returns: (&[f64], &[f64]),
    prices: (&[f64], &[f64]),
    config: &PairConfig,
) -> Option<PairCandidate> {
    let correlation = stats::pearson(returns.0, returns.1);
    if correlation.abs() < config.min_correlation {
        return None;
    }

    let hedge_ratio = estimate_hedge_ratio(returns.0, returns.1);
    let spread = spread_zscore(prices.0, prices.1, hedge_ratio);

    if !hedge_ratio.is_finite() || !spread.zscore.is_finite() || !spread.half_life.is_finite() {
        tracing::debug!(
            "Pair {}/{} skipped: non-finite spread statistics",
            symbol_a,
            symbol_b
        );
        return None;
    }

    Some(PairCandidate {
        symbol_a: symbol_a.clone(),
        symbol_b: symbol_b.clone(),
        correlation,
        hedge_ratio,
        spread_zscore: spread.zscore,
        half_life_days: spread.half_life,
        signal: classify_pair(spread.zscore, spread.half_life, config),
    })
}

/// Scan every unordered pair of the universe
///
/// `returns` and `prices` are aligned T x N matrices whose columns follow
/// `symbols`. Candidates come back sorted by |z-score| descending; pairs
/// that fail the correlation screen or produce degenerate statistics are
/// dropped without aborting the scan.
pub fn scan_pairs(
    symbols: &[Symbol],
    returns: &SeriesMatrix,
    prices: &SeriesMatrix,
    config: &PairConfig,
) -> Vec<PairCandidate> {
    let n = symbols.len().min(returns.cols()).min(prices.cols());
    if n != symbols.len() {
        tracing::warn!(
            "Pair scan universe truncated to {} of {} symbols (returns={}, prices={} columns)",
            n,
            symbols.len(),
            returns.cols(),
            prices.cols()
        );
    }

    let pairs: Vec<(usize, usize)> = (0..n).tuple_combinations().collect();
    let mut candidates: Vec<PairCandidate> = pairs
        .into_par_iter()
        .filter_map(|(i, j)| {
            screen_pair(
                &symbols[i],
                &symbols[j],
                (returns.column(i), returns.column(j)),
                (prices.column(i), prices.column(j)),
                config,
            )
        })
        .collect();

    candidates.sort_by(|a, b| b.spread_zscore.abs().total_cmp(&a.spread_zscore.abs()));

    tracing::debug!(
        "Pair scan: {} symbols, {} candidates above |corr| >= {}",
        n,
        candidates.len(),
        config.min_correlation
    );

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn wave(n: usize, freq: f64, amp: f64) -> Vec<f64> {
        (0..n).map(|i| ((i as f64) * freq).sin() * amp).collect()
    }

    #[test]
    fn test_hedge_ratio_defaults() {
        assert_eq!(estimate_hedge_ratio(&[0.1; 5], &[0.2; 5]), 1.0);
        assert_eq!(estimate_hedge_ratio(&wave(20, 0.5, 1.0), &[0.2; 20]), 1.0);
    }

    #[test]
    fn test_hedge_ratio_recovers_scale() {
        let b = wave(50, 0.5, 0.02);
        let a: Vec<f64> = b.iter().map(|x| 1.5 * x).collect();
        assert_abs_diff_eq!(estimate_hedge_ratio(&a, &b), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_exponential_spread_half_life() {
        let spread: Vec<f64> = (0..40).map(|t| 5.0 * 0.87_f64.powi(t)).collect();
        let expected = -std::f64::consts::LN_2 / 0.87_f64.ln();
        assert_abs_diff_eq!(spread_half_life(&spread), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_explosive_spread_is_invalid() {
        let spread: Vec<f64> = (0..40).map(|t| 1.05_f64.powi(t)).collect();
        assert_eq!(spread_half_life(&spread), INVALID_HALF_LIFE);
        let oscillating: Vec<f64> = (0..40).map(|t| if t % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert_eq!(spread_half_life(&oscillating), INVALID_HALF_LIFE);
    }

    #[test]
    fn test_spread_zscore_short_history() {
        let stats = spread_zscore(&[1.0; 10], &[1.0; 10], 1.0);
        assert_eq!(stats.zscore, 0.0);
        assert_eq!(stats.half_life, 0.0);
    }

    #[test]
    fn test_classify_pair() {
        let config = PairConfig::default();
        assert_eq!(classify_pair(2.5, 5.0, &config), PairSignal::ShortSpread);
        assert_eq!(classify_pair(-2.5, 5.0, &config), PairSignal::LongSpread);
        assert_eq!(classify_pair(1.0, 5.0, &config), PairSignal::Wait);
        assert_eq!(classify_pair(3.0, 45.0, &config), PairSignal::NoOpportunity);
        assert_eq!(classify_pair(3.0, 0.0, &config), PairSignal::NoOpportunity);
        assert_eq!(
            classify_pair(3.0, INVALID_HALF_LIFE, &config),
            PairSignal::NoOpportunity
        );
    }

    #[test]
    fn test_scan_skips_uncorrelated_pairs() {
        let symbols = vec![Symbol::new("A"), Symbol::new("B"), Symbol::new("C")];
        let base = wave(60, 0.4, 0.02);
        let noise: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let returns = SeriesMatrix::from_columns(vec![base.clone(), base.clone(), noise]).unwrap();
        let prices = SeriesMatrix::from_columns(vec![
            wave(60, 0.1, 5.0).iter().map(|p| p + 100.0).collect(),
            vec![100.0; 60],
            vec![50.0; 60],
        ])
        .unwrap();

        let candidates = scan_pairs(&symbols, &returns, &prices, &PairConfig::default());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].symbol_a.as_str(), "A");
        assert_eq!(candidates[0].symbol_b.as_str(), "B");
        assert_abs_diff_eq!(candidates[0].hedge_ratio, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scan_sorted_by_abs_zscore() {
        let symbols = vec![Symbol::new("A"), Symbol::new("B"), Symbol::new("C")];
        let base = wave(40, 0.4, 0.02);
        let returns =
            SeriesMatrix::from_columns(vec![base.clone(), base.clone(), base.clone()]).unwrap();
        // A-C spread ends far from its mean, A-B and B-C less so
        let mut a: Vec<f64> = (0..40).map(|t| 100.0 + ((t as f64) * 0.9).sin()).collect();
        a[39] = 104.0;
        let mut b = vec![100.0; 40];
        b[39] = 102.0;
        let c = vec![100.0; 40];
        let prices = SeriesMatrix::from_columns(vec![a, b, c]).unwrap();

        let candidates = scan_pairs(&symbols, &returns, &prices, &PairConfig::default());
        assert_eq!(candidates.len(), 3);
        for window in candidates.windows(2) {
            assert!(window[0].spread_zscore.abs() >= window[1].spread_zscore.abs());
        }
    }

    #[test]
    fn test_scan_tolerates_short_symbol_list() {
        let symbols = vec![Symbol::new("A")];
        let base = wave(30, 0.4, 0.02);
        let returns = SeriesMatrix::from_columns(vec![base.clone(), base]).unwrap();
        let prices = SeriesMatrix::from_columns(vec![vec![1.0; 30], vec![1.0; 30]]).unwrap();
        assert!(scan_pairs(&symbols, &returns, &prices, &PairConfig::default()).is_empty());
    }
}
