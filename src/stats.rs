//! Descriptive statistics helpers
//!
//! Thin wrappers over `statrs` that pin down the degenerate cases every
//! calculator relies on: empty input yields 0 instead of NaN, and flat
//! series yield a correlation of 0 instead of a division by zero.

use statrs::function::erf::{erfc, erfc_inv};
use statrs::statistics::Statistics;
use std::f64::consts::SQRT_2;

/// Standard deviation below which a series is treated as flat
pub const FLAT_STD: f64 = 1e-10;

/// Arithmetic mean (0 for an empty slice)
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().mean()
}

/// Population standard deviation, ddof = 0 (0 for an empty slice)
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().copied().population_std_dev()
}

/// Sample variance, ddof = 1 (0 with fewer than two observations)
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.iter().copied().variance()
}

/// Sample standard deviation, ddof = 1
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Sample covariance, ddof = 1 (0 if lengths differ or fewer than two points)
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    a.iter().copied().covariance(b.iter().copied())
}

/// Pearson correlation coefficient
///
/// Returns 0 when lengths differ, fewer than two points are given, either
/// side is flat, or the result is not finite.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }

    let std_a = population_std(a);
    let std_b = population_std(b);
    if std_a < FLAT_STD || std_b < FLAT_STD {
        return 0.0;
    }

    let cov = a.iter().copied().population_covariance(b.iter().copied());
    let corr = cov / (std_a * std_b);
    if corr.is_finite() {
        corr.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Least-squares slope of `y = alpha + beta * x`
///
/// `None` when the regression is undefined (mismatched lengths, fewer than two
/// points, or constant `x`).
pub fn ols_slope(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mx = mean(x);
    let my = mean(y);
    let (sxy, sxx) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            let dx = xi - mx;
            (sxy + dx * (yi - my), sxx + dx * dx)
        });

    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    slope.is_finite().then_some(slope)
}

/// Population central moments (m2, m3, m4)
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let mu = mean(values);
    let (m2, m3, m4) = values.iter().fold((0.0, 0.0, 0.0), |(m2, m3, m4), &v| {
        let d = v - mu;
        let d2 = d * d;
        (m2 + d2, m3 + d2 * d, m4 + d2 * d2)
    });
    (m2 / n, m3 / n, m4 / n)
}

/// Sample skewness (biased, Fisher-Pearson). 0 for flat or empty input.
pub fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let (m2, m3, _) = central_moments(values);
    if m2 <= 0.0 {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

/// Sample kurtosis (biased, non-excess: normal = 3). 3 for flat or empty input.
pub fn kurtosis(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 3.0;
    }
    let (m2, _, m4) = central_moments(values);
    if m2 <= 0.0 {
        return 3.0;
    }
    m4 / (m2 * m2)
}

/// Standard normal CDF
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Standard normal quantile (inverse CDF)
///
/// `p = 0` and `p = 1` map to negative and positive infinity.
pub fn norm_ppf(p: f64) -> f64 {
    -SQRT_2 * erfc_inv(2.0 * p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(mean(&values), 5.0);
        assert_abs_diff_eq!(population_std(&values), 2.0, epsilon = 1e-12);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(population_std(&[]), 0.0);
    }

    #[test]
    fn test_pearson_perfect_and_flat() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [8.0, 6.0, 4.0, 2.0];
        assert_abs_diff_eq!(pearson(&a, &b), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pearson(&a, &c), -1.0, epsilon = 1e-12);
        assert_eq!(pearson(&a, &[1.0, 1.0, 1.0, 1.0]), 0.0);
        assert_eq!(pearson(&a, &b[..3]), 0.0);
    }

    #[test]
    fn test_ols_slope() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(ols_slope(&x, &y).unwrap(), 2.0, epsilon = 1e-12);
        assert!(ols_slope(&[1.0, 1.0], &[2.0, 3.0]).is_none());
    }

    #[test]
    fn test_sample_covariance_matches_definition() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 3.0, 2.0];
        // means 2, 2; products (-1)(-1) + 0 + (1)(0) = 1; / (n-1)
        assert_abs_diff_eq!(sample_covariance(&a, &b), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sample_variance(&a), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_moments_of_symmetric_sample() {
        let values = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert_abs_diff_eq!(skewness(&values), 0.0, epsilon = 1e-12);
        // m2 = 2, m4 = 6.8
        assert_abs_diff_eq!(kurtosis(&values), 1.7, epsilon = 1e-12);
        assert_eq!(kurtosis(&[1.0, 1.0]), 3.0);
    }

    #[test]
    fn test_normal_distribution() {
        assert_abs_diff_eq!(norm_cdf(0.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(norm_cdf(1.959964), 0.975, epsilon = 1e-6);
        assert_abs_diff_eq!(norm_ppf(0.975), 1.959964, epsilon = 1e-5);
        assert_eq!(norm_ppf(0.0), f64::NEG_INFINITY);
    }
}
