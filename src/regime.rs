//! Volatility regime detection
//!
//! A deliberately simple two-state classifier: it compares the volatility of
//! the most recent window with the window before it and maps the ratio to a
//! bull probability. No hidden-state model is fitted.
//!
//! State 0: low volatility (usually bull market)
//! State 1: high volatility (usually bear market)

use serde::{Deserialize, Serialize};

use crate::stats;

/// Added to the prior volatility before dividing
const VOL_EPSILON: f64 = 1e-8;

/// Regime detector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Observations per volatility window
    pub lookback: usize,
    /// Volatility ratio above which the regime is high-vol
    pub vol_threshold: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        RegimeConfig {
            lookback: 60,
            vol_threshold: 1.5,
        }
    }
}

/// Regime reading for one query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub state: u8,
    pub bull_probability: f64,
}

impl RegimeState {
    /// Reading returned when there is not enough history
    pub const NEUTRAL: RegimeState = RegimeState {
        state: 0,
        bull_probability: 0.5,
    };

    pub fn is_high_volatility(&self) -> bool {
        self.state == 1
    }
}

/// Detect the current regime with the default configuration
pub fn detect_regime(returns: &[f64]) -> RegimeState {
    detect_regime_with(returns, &RegimeConfig::default())
}

/// Detect the current regime from a return series
pub fn detect_regime_with(returns: &[f64], config: &RegimeConfig) -> RegimeState {
    let lookback = config.lookback;
    if lookback == 0 || returns.len() < lookback {
        return RegimeState::NEUTRAL;
    }

    let n = returns.len();
    let recent = &returns[n - lookback..];
    let recent_std = stats::population_std(recent);

    let prior_std = if n >= lookback * 2 {
        stats::population_std(&returns[n - 2 * lookback..n - lookback])
    } else {
        recent_std
    };

    let vol_ratio = recent_std / (prior_std + VOL_EPSILON);

    let (state, mut bull_prob) = if vol_ratio > config.vol_threshold {
        (1, 0.3)
    } else if vol_ratio < 1.0 / config.vol_threshold {
        (0, 0.8)
    } else {
        (0, 0.5 + (1.0 - vol_ratio) * 0.3)
    };

    // Nudge by direction of the recent drift
    if stats::mean(recent) > 0.0 {
        bull_prob += 0.1;
    } else {
        bull_prob -= 0.1;
    }

    tracing::debug!(
        "Regime: recent_std={:.6}, prior_std={:.6}, vol_ratio={:.3}, state={}",
        recent_std,
        prior_std,
        vol_ratio,
        state
    );

    RegimeState {
        state,
        bull_probability: bull_prob.clamp(0.0, 1.0),
    }
}

/// Human-readable regime label derived from the bull probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeLabel {
    BullMarket,
    NeutralBullish,
    NeutralBearish,
    BearMarket,
}

impl RegimeLabel {
    pub fn from_bull_probability(bull_probability: f64) -> Self {
        if bull_probability > 0.7 {
            RegimeLabel::BullMarket
        } else if bull_probability > 0.5 {
            RegimeLabel::NeutralBullish
        } else if bull_probability > 0.3 {
            RegimeLabel::NeutralBearish
        } else {
            RegimeLabel::BearMarket
        }
    }

    pub fn stance(&self) -> &'static str {
        match self {
            RegimeLabel::BullMarket => "Residual momentum strategy",
            RegimeLabel::NeutralBullish => "Standard allocation",
            RegimeLabel::NeutralBearish => "Reduce and observe",
            RegimeLabel::BearMarket => "Defensive strategy",
        }
    }
}

/// Regime after combining trend persistence, volatility and factor drift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinedRegime {
    StructuralBreak,
    TrendingBull,
    RangeBound,
    PanicBear,
    Neutral,
}

/// Combine Hurst exponent, bull probability and PCA cosine similarity
///
/// Returns the combined regime and its Kelly regime factor in [0, 0.5].
/// A structural break (factor loadings rotated away from their history)
/// overrides everything else.
pub fn combine_regime_signals(
    hurst: f64,
    bull_probability: f64,
    pca_cosine: f64,
) -> (CombinedRegime, f64) {
    if pca_cosine < 0.8 {
        return (CombinedRegime::StructuralBreak, 0.0);
    }

    if hurst > 0.55 && bull_probability > 0.7 {
        (CombinedRegime::TrendingBull, 0.5)
    } else if hurst < 0.45 {
        (CombinedRegime::RangeBound, 0.25)
    } else if bull_probability < 0.3 {
        (CombinedRegime::PanicBear, 0.0)
    } else {
        (CombinedRegime::Neutral, 0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Alternating +/- amplitude around a small drift
    fn alternating(n: usize, amplitude: f64, drift: f64) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { drift + amplitude } else { drift - amplitude })
            .collect()
    }

    #[test]
    fn test_short_series_is_neutral() {
        let returns = alternating(59, 0.01, 0.0);
        assert_eq!(detect_regime(&returns), RegimeState::NEUTRAL);
        assert_eq!(detect_regime(&[]), RegimeState::NEUTRAL);
    }

    #[test]
    fn test_single_window_uses_recent_vol_as_prior() {
        // 60..119 observations: ratio ~1, intermediate branch
        let returns = alternating(80, 0.01, 0.001);
        let regime = detect_regime(&returns);
        assert_eq!(regime.state, 0);
        // 0.5 + (1 - ~1) * 0.3 + 0.1 nudge
        assert_abs_diff_eq!(regime.bull_probability, 0.6, epsilon = 1e-4);
    }

    #[test]
    fn test_volatility_spike_is_high_vol_state() {
        let mut returns = alternating(60, 0.01, 0.0);
        returns.extend(alternating(60, 0.03, -0.001));
        let regime = detect_regime(&returns);
        assert_eq!(regime.state, 1);
        assert_abs_diff_eq!(regime.bull_probability, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_volatility_compression_is_bullish() {
        let mut returns = alternating(60, 0.03, 0.0);
        returns.extend(alternating(60, 0.01, 0.001));
        let regime = detect_regime(&returns);
        assert_eq!(regime.state, 0);
        assert_abs_diff_eq!(regime.bull_probability, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_lookback() {
        let config = RegimeConfig {
            lookback: 10,
            vol_threshold: 1.5,
        };
        let mut returns = alternating(10, 0.01, 0.0);
        returns.extend(alternating(10, 0.05, 0.0));
        assert!(detect_regime_with(&returns, &config).is_high_volatility());
    }

    #[test]
    fn test_regime_label_bands() {
        assert_eq!(RegimeLabel::from_bull_probability(0.9), RegimeLabel::BullMarket);
        assert_eq!(RegimeLabel::from_bull_probability(0.6), RegimeLabel::NeutralBullish);
        assert_eq!(RegimeLabel::from_bull_probability(0.4), RegimeLabel::NeutralBearish);
        assert_eq!(RegimeLabel::from_bull_probability(0.3), RegimeLabel::BearMarket);
    }

    #[test]
    fn test_combine_regime_signals() {
        assert_eq!(
            combine_regime_signals(0.7, 0.9, 0.5),
            (CombinedRegime::StructuralBreak, 0.0)
        );
        assert_eq!(
            combine_regime_signals(0.6, 0.8, 0.95),
            (CombinedRegime::TrendingBull, 0.5)
        );
        assert_eq!(
            combine_regime_signals(0.4, 0.8, 0.95),
            (CombinedRegime::RangeBound, 0.25)
        );
        assert_eq!(
            combine_regime_signals(0.5, 0.2, 0.95),
            (CombinedRegime::PanicBear, 0.0)
        );
        assert_eq!(
            combine_regime_signals(0.5, 0.5, 0.95),
            (CombinedRegime::Neutral, 0.25)
        );
    }
}
