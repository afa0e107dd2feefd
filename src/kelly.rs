//! Regime-adjusted Kelly position sizing
//!
//! ```text
//! f_final = K_regime * K_vix * (b*p - q) / b
//! ```
//!
//! where `b = avg_win / |avg_loss|`, `p` is the win rate and `q = 1 - p`.
//! The result is clamped to `[0, max_position]`.

use serde::{Deserialize, Serialize};

use crate::risk::VixTier;

/// Kelly fraction scaled by regime and VIX factors
///
/// A zero average loss, a non-positive payoff ratio and negative edge all
/// size to zero.
pub fn kelly_fraction(
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    regime_factor: f64,
    vix_factor: f64,
    max_position: f64,
) -> f64 {
    if avg_loss == 0.0 {
        return 0.0;
    }

    let base = base_kelly(win_rate, avg_win, avg_loss);
    let sized = regime_factor * vix_factor * base;
    if !sized.is_finite() {
        return 0.0;
    }
    sized.max(0.0).min(max_position.max(0.0))
}

/// Unscaled Kelly fraction `(b*p - q) / b`
pub fn base_kelly(win_rate: f64, avg_win: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 0.0;
    }
    let b = avg_win / avg_loss.abs();
    if b > 0.0 {
        (b * win_rate - (1.0 - win_rate)) / b
    } else {
        0.0
    }
}

/// Market regime as named by the surrounding application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeKind {
    TrendBull,
    RangeBound,
    PanicBear,
    EventDriven,
}

impl RegimeKind {
    /// K_regime in [0, 0.5]
    pub fn kelly_factor(&self) -> f64 {
        match self {
            RegimeKind::TrendBull => 0.5,
            RegimeKind::RangeBound => 0.25,
            RegimeKind::PanicBear => 0.0,
            RegimeKind::EventDriven => 0.25,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "TREND_BULL" => Some(RegimeKind::TrendBull),
            "RANGE_BOUND" => Some(RegimeKind::RangeBound),
            "PANIC_BEAR" => Some(RegimeKind::PanicBear),
            "EVENT_DRIVEN" => Some(RegimeKind::EventDriven),
            _ => None,
        }
    }
}

/// Regime factor by name; unknown regimes get the neutral 0.25
pub fn regime_factor(name: &str) -> f64 {
    RegimeKind::parse(name).map_or(0.25, |kind| kind.kelly_factor())
}

/// Configuration for KellySizer using builder pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KellyConfig {
    /// Cap on the fraction allocated to a single position
    pub max_position: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self { max_position: 0.10 }
    }
}

impl KellyConfig {
    /// Set maximum position fraction
    pub fn with_max_position(mut self, max_position: f64) -> Self {
        self.max_position = max_position;
        self
    }

    /// Build the sizer
    pub fn build(self) -> KellySizer {
        KellySizer::from_config(self)
    }
}

/// Breakdown of one sizing decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KellyPosition {
    pub base_kelly: f64,
    pub regime_factor: f64,
    pub vix_factor: f64,
    pub fraction: f64,
}

/// Kelly sizer bound to a position cap
#[derive(Debug, Clone)]
pub struct KellySizer {
    pub max_position: f64,
}

impl KellySizer {
    pub fn from_config(config: KellyConfig) -> Self {
        KellySizer {
            max_position: config.max_position,
        }
    }

    /// Size with explicit regime and VIX factors
    pub fn size(
        &self,
        win_rate: f64,
        avg_win: f64,
        avg_loss: f64,
        regime_factor: f64,
        vix_factor: f64,
    ) -> KellyPosition {
        let fraction = kelly_fraction(
            win_rate,
            avg_win,
            avg_loss,
            regime_factor,
            vix_factor,
            self.max_position,
        );

        tracing::debug!(
            "Kelly sizing: p={:.3} win={:.4} loss={:.4} k_regime={:.2} k_vix={:.2} -> {:.4}",
            win_rate,
            avg_win,
            avg_loss,
            regime_factor,
            vix_factor,
            fraction
        );

        KellyPosition {
            base_kelly: base_kelly(win_rate, avg_win, avg_loss),
            regime_factor,
            vix_factor,
            fraction,
        }
    }

    /// Size using the VIX tier multiplier for the current VIX reading
    pub fn size_for_market(
        &self,
        win_rate: f64,
        avg_win: f64,
        avg_loss: f64,
        regime_factor: f64,
        vix: f64,
    ) -> KellyPosition {
        let vix_factor = VixTier::from_vix(vix).kelly_multiplier();
        self.size(win_rate, avg_win, avg_loss, regime_factor, vix_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_base_kelly() {
        // b = 2, p = 0.6 -> (1.2 - 0.4) / 2 = 0.4
        assert_abs_diff_eq!(base_kelly(0.6, 2.0, 1.0), 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(base_kelly(0.6, 2.0, -1.0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_loss_sizes_to_zero() {
        assert_eq!(kelly_fraction(0.9, 2.0, 0.0, 0.5, 1.0, 0.1), 0.0);
    }

    #[test]
    fn test_negative_edge_sizes_to_zero() {
        assert_eq!(kelly_fraction(0.2, 1.0, 1.0, 0.5, 1.0, 0.1), 0.0);
        assert_eq!(kelly_fraction(0.6, -1.0, 1.0, 0.5, 1.0, 0.1), 0.0);
    }

    #[test]
    fn test_scaled_and_capped() {
        // 0.5 * 0.5 * 0.4 = 0.1 -> within cap 0.2
        assert_abs_diff_eq!(kelly_fraction(0.6, 2.0, 1.0, 0.5, 0.5, 0.2), 0.1, epsilon = 1e-12);
        // 0.5 * 1.0 * 0.4 = 0.2 -> capped at 0.1
        assert_abs_diff_eq!(kelly_fraction(0.6, 2.0, 1.0, 0.5, 1.0, 0.1), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_regime_factor_lookup() {
        assert_eq!(regime_factor("TREND_BULL"), 0.5);
        assert_eq!(regime_factor("panic_bear"), 0.0);
        assert_eq!(regime_factor("something else"), 0.25);
    }

    #[test]
    fn test_sizer_uses_vix_tier() {
        let sizer = KellyConfig::default().with_max_position(1.0).build();
        let position = sizer.size_for_market(0.6, 2.0, 1.0, 0.5, 30.0);
        assert_eq!(position.vix_factor, 0.5);
        assert_abs_diff_eq!(position.fraction, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(position.base_kelly, 0.4, epsilon = 1e-12);
    }
}
