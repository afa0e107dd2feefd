//! Backtest overfitting diagnostics
//!
//! Walk-forward equity stitching, Probability of Backtest Overfitting and
//! combinatorially purged cross-validation with purge/embargo filters.

use serde::{Deserialize, Serialize};

use crate::stats;

/// Drawdown above which a walk-forward curve is not considered monotonic
pub const MAX_WFO_DRAWDOWN: f64 = 0.2;
/// PBO below which a strategy is considered not overfit
pub const PBO_ROBUST: f64 = 0.3;
/// Trading periods per year used to annualize fold Sharpes
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Stitched out-of-sample walk-forward result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WfoResult {
    pub equity_curve: Vec<f64>,
    pub is_monotonic: bool,
}

/// Walk-forward stitch of out-of-sample returns
///
/// The series is cut into `n_splits` consecutive windows; the first
/// `in_sample_pct` of each window is skipped and the remainder contributes
/// to a cumulative-sum equity curve. A curve is monotonic when it ends above
/// where it started and its worst drawdown stays under 20%.
pub fn walk_forward(returns: &[f64], n_splits: usize, in_sample_pct: f64) -> WfoResult {
    if n_splits == 0 || returns.len() < 2 * n_splits {
        tracing::debug!(
            "Walk-forward skipped: {} returns for {} splits",
            returns.len(),
            n_splits
        );
        return WfoResult::default();
    }

    let split_size = returns.len() / n_splits;
    let mut oos = Vec::with_capacity(returns.len());
    for split in 0..n_splits {
        let start = split * split_size;
        let end = (start + split_size).min(returns.len());
        let is_end = start + (split_size as f64 * in_sample_pct.clamp(0.0, 1.0)) as usize;
        if is_end < end {
            oos.extend_from_slice(&returns[is_end..end]);
        }
    }

    let equity_curve: Vec<f64> = oos
        .iter()
        .scan(0.0, |acc, r| {
            *acc += r;
            Some(*acc)
        })
        .collect();

    let is_monotonic = match (equity_curve.first(), equity_curve.last()) {
        (Some(first), Some(last)) => last > first && max_drawdown(&equity_curve) < MAX_WFO_DRAWDOWN,
        _ => false,
    };

    WfoResult {
        equity_curve,
        is_monotonic,
    }
}

/// In-sample and out-of-sample Sharpe of each walk-forward window
///
/// Uses the same windows as [`walk_forward`]; useful as PBO input when only
/// one return series is available. Empty when the series is too short.
pub fn split_sharpes(returns: &[f64], n_splits: usize, in_sample_pct: f64) -> (Vec<f64>, Vec<f64>) {
    if n_splits == 0 || returns.len() < 2 * n_splits {
        return (Vec::new(), Vec::new());
    }

    let split_size = returns.len() / n_splits;
    (0..n_splits)
        .map(|split| {
            let start = split * split_size;
            let end = start + split_size;
            let is_end = start + (split_size as f64 * in_sample_pct.clamp(0.0, 1.0)) as usize;
            (
                fold_sharpe(&returns[start..is_end]),
                fold_sharpe(&returns[is_end..end]),
            )
        })
        .unzip()
}

/// Largest peak-to-trough drop relative to the running peak
pub fn max_drawdown(curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;
    for &value in curve {
        peak = peak.max(value);
        worst = worst.max((peak - value) / (peak.abs() + 1e-8));
    }
    worst
}

/// Probability of Backtest Overfitting
///
/// Takes the configuration with the best in-sample Sharpe (first on ties)
/// and returns its out-of-sample rank divided by the number of
/// configurations: rank 0 is the best out-of-sample result, so 0 means the
/// in-sample winner also won out of sample. Empty or mismatched input is
/// treated as fully overfit (1.0).
pub fn probability_of_backtest_overfitting(is_sharpes: &[f64], oos_sharpes: &[f64]) -> f64 {
    if is_sharpes.is_empty() || is_sharpes.len() != oos_sharpes.len() {
        return 1.0;
    }

    let best_is = is_sharpes
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if v > is_sharpes[best] { i } else { best });

    // Descending by OOS Sharpe; stable so ties keep input order
    let mut order: Vec<usize> = (0..oos_sharpes.len()).collect();
    order.sort_by(|&a, &b| oos_sharpes[b].total_cmp(&oos_sharpes[a]));

    let rank = order.iter().position(|&i| i == best_is).unwrap_or(order.len());
    rank as f64 / is_sharpes.len() as f64
}

/// Combined reading of walk-forward stability and PBO
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WfoInterpretation {
    Robust,
    Cautious,
    Unstable,
    Invalid,
}

impl WfoInterpretation {
    pub fn description(&self) -> &'static str {
        match self {
            WfoInterpretation::Robust => "Robust: stable out-of-sample equity, low overfitting",
            WfoInterpretation::Cautious => "Cautious: stable equity but overfitting risk",
            WfoInterpretation::Unstable => "Unstable: low overfitting but erratic equity",
            WfoInterpretation::Invalid => "Invalid: unstable and likely overfit",
        }
    }
}

pub fn interpret_wfo(is_monotonic: bool, pbo: f64) -> WfoInterpretation {
    match (is_monotonic, pbo < PBO_ROBUST) {
        (true, true) => WfoInterpretation::Robust,
        (true, false) => WfoInterpretation::Cautious,
        (false, true) => WfoInterpretation::Unstable,
        (false, false) => WfoInterpretation::Invalid,
    }
}

/// Combinatorially purged cross-validation summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpcvResult {
    pub fold_sharpes: Vec<f64>,
    pub mean_sharpe: f64,
    pub std_sharpe: f64,
    /// Share of folds with a negative Sharpe
    pub failure_probability: f64,
    pub is_valid: bool,
}

impl CpcvResult {
    fn insufficient() -> Self {
        CpcvResult {
            fold_sharpes: Vec::new(),
            mean_sharpe: 0.0,
            std_sharpe: 0.0,
            failure_probability: 1.0,
            is_valid: false,
        }
    }
}

/// Annualized Sharpe of one fold
fn fold_sharpe(fold: &[f64]) -> f64 {
    if fold.len() < 2 {
        return 0.0;
    }
    let std = stats::sample_std(fold);
    if std == 0.0 || !std.is_finite() {
        return 0.0;
    }
    stats::mean(fold) / std * PERIODS_PER_YEAR.sqrt()
}

/// Cross-validate a return series over `n_splits` folds
///
/// `std_sharpe` is the sample (ddof = 1) spread of the fold Sharpes. Valid when the mean fold Sharpe exceeds 1.0 and fewer than 30% of folds
/// lose money.
pub fn cpcv_validate(returns: &[f64], n_splits: usize) -> CpcvResult {
    if n_splits == 0 || returns.len() < 2 * n_splits {
        return CpcvResult::insufficient();
    }

    // Folds are equal-sized; trailing returns past `n_splits * fold_size` are unused
    let fold_size = returns.len() / n_splits;
    let fold_sharpes: Vec<f64> = returns
        .chunks_exact(fold_size)
        .take(n_splits)
        .map(fold_sharpe)
        .collect();

    let mean_sharpe = stats::mean(&fold_sharpes);
    let std_sharpe = stats::sample_std(&fold_sharpes);
    let failures = fold_sharpes.iter().filter(|&&s| s < 0.0).count();
    let failure_probability = failures as f64 / fold_sharpes.len() as f64;
    let is_valid = mean_sharpe > 1.0 && failure_probability < 0.3;

    tracing::debug!(
        "CPCV: {} folds, mean sharpe {:.3}, failure {:.2}, valid={}",
        n_splits,
        mean_sharpe,
        failure_probability,
        is_valid
    );

    CpcvResult {
        fold_sharpes,
        mean_sharpe,
        std_sharpe,
        failure_probability,
        is_valid,
    }
}

/// Drop training indices that overlap, or sit within `purge_window` before,
/// the test window `[test_start, test_end]`
pub fn purge(
    train_indices: &[usize],
    test_start: usize,
    test_end: usize,
    purge_window: usize,
) -> Vec<usize> {
    train_indices
        .iter()
        .copied()
        .filter(|&idx| idx + purge_window < test_start || idx > test_end)
        .collect()
}

/// Drop training indices within `embargo_window` after the test window ends
pub fn embargo(train_indices: &[usize], test_end: usize, embargo_window: usize) -> Vec<usize> {
    train_indices
        .iter()
        .copied()
        .filter(|&idx| idx <= test_end || idx > test_end + embargo_window)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_walk_forward_needs_two_per_split() {
        let result = walk_forward(&[0.01; 9], 5, 0.7);
        assert!(result.equity_curve.is_empty());
        assert!(!result.is_monotonic);
    }

    #[test]
    fn test_walk_forward_stitches_oos_windows() {
        // 2 splits of 10, first 7 of each skipped -> 6 OOS points
        let returns: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let result = walk_forward(&returns, 2, 0.7);
        let expected = [7.0, 15.0, 24.0, 41.0, 59.0, 78.0];
        assert_eq!(result.equity_curve.len(), expected.len());
        for (got, want) in result.equity_curve.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want);
        }
        assert!(result.is_monotonic);
    }

    #[test]
    fn test_walk_forward_deep_drawdown_not_monotonic() {
        let mut returns = vec![1.0; 10];
        returns.extend([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, -5.0, 0.1, 0.1]);
        let result = walk_forward(&returns, 2, 0.5);
        assert!(!result.is_monotonic);
    }

    #[test]
    fn test_split_sharpes_one_pair_per_window() {
        let returns: Vec<f64> = (0..40).map(|i| 0.001 * ((i % 3) as f64 + 1.0)).collect();
        let (is, oos) = split_sharpes(&returns, 4, 0.5);
        assert_eq!(is.len(), 4);
        assert_eq!(oos.len(), 4);
        assert!(is.iter().chain(&oos).all(|s| *s > 0.0));
        assert!(split_sharpes(&returns[..5], 4, 0.5).0.is_empty());
    }

    #[test]
    fn test_pbo() {
        assert_eq!(probability_of_backtest_overfitting(&[], &[]), 1.0);
        assert_eq!(probability_of_backtest_overfitting(&[1.0], &[1.0, 2.0]), 1.0);
        // IS winner (index 2) is worst OOS: rank 3 of 4
        let pbo = probability_of_backtest_overfitting(&[0.5, 1.0, 2.0, 0.1], &[0.9, 0.8, 0.1, 0.3]);
        assert_abs_diff_eq!(pbo, 0.75);
        // IS winner also OOS winner
        assert_eq!(probability_of_backtest_overfitting(&[2.0, 1.0], &[1.5, 0.5]), 0.0);
    }

    #[test]
    fn test_interpret_wfo() {
        assert_eq!(interpret_wfo(true, 0.1), WfoInterpretation::Robust);
        assert_eq!(interpret_wfo(true, 0.5), WfoInterpretation::Cautious);
        assert_eq!(interpret_wfo(false, 0.1), WfoInterpretation::Unstable);
        assert_eq!(interpret_wfo(false, 0.3), WfoInterpretation::Invalid);
    }

    #[test]
    fn test_cpcv_insufficient_data() {
        let result = cpcv_validate(&[0.01; 5], 5);
        assert!(result.fold_sharpes.is_empty());
        assert_eq!(result.failure_probability, 1.0);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_cpcv_consistent_gains_are_valid() {
        let returns: Vec<f64> = (0..100)
            .map(|i| if i % 2 == 0 { 0.002 } else { 0.001 })
            .collect();
        let result = cpcv_validate(&returns, 5);
        assert_eq!(result.fold_sharpes.len(), 5);
        assert_eq!(result.failure_probability, 0.0);
        assert!(result.mean_sharpe > 1.0);
        assert!(result.is_valid);
    }

    #[test]
    fn test_cpcv_fold_bounds_and_sample_std() {
        // 11 returns over 5 folds of 2: the trailing -0.5 belongs to no fold
        let returns = [
            0.01, 0.03, 0.02, 0.04, -0.01, 0.02, 0.03, 0.01, 0.02, 0.05, -0.5,
        ];
        let result = cpcv_validate(&returns, 5);
        let expected = [22.449944, 33.674916, 3.741657, 22.449944, 26.191602];
        assert_eq!(result.fold_sharpes.len(), expected.len());
        for (got, want) in result.fold_sharpes.iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-5);
        }
        assert_eq!(result.failure_probability, 0.0);
        assert_abs_diff_eq!(result.mean_sharpe, 21.701613, epsilon = 1e-5);
        // ddof = 1; the population spread would be 9.871170
        assert_abs_diff_eq!(result.std_sharpe, 11.036304, epsilon = 1e-5);
    }

    #[test]
    fn test_purge_and_embargo() {
        let train: Vec<usize> = (0..20).collect();
        let purged = purge(&train, 10, 12, 2);
        assert_eq!(purged, vec![0, 1, 2, 3, 4, 5, 6, 7, 13, 14, 15, 16, 17, 18, 19]);
        let embargoed = embargo(&train, 12, 3);
        assert_eq!(embargoed.len(), 17);
        assert!(!embargoed.contains(&13) && !embargoed.contains(&15));
        assert!(embargoed.contains(&12) && embargoed.contains(&16));
    }
}
