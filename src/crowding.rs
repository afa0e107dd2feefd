//! Factor crowding and liquidity-crunch screen
//!
//! Four independent checks; any subset may fire at once. Also the
//! execution-time alpha decay check for individual signals.

use serde::{Deserialize, Serialize};

use crate::stats;
use crate::types::SeriesMatrix;

/// Crowding thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrowdingConfig {
    /// Average pairwise correlation above which a factor is crowded
    pub max_correlation: f64,
    /// Days to cover above which an exit would move the market
    pub max_days_to_cover: f64,
    /// DSR below which the strategy should be retired
    pub min_dsr: f64,
    /// Alpha half-life (weeks) below which the edge is decaying
    pub min_alpha_half_life_weeks: f64,
}

impl Default for CrowdingConfig {
    fn default() -> Self {
        CrowdingConfig {
            max_correlation: 0.8,
            max_days_to_cover: 10.0,
            min_dsr: 0.95,
            min_alpha_half_life_weeks: 2.0,
        }
    }
}

/// One fired crowding check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrowdingFlag {
    HighCorrelation,
    LiquidityRisk,
    StrategyRetirement,
    AlphaDecaying,
}

impl CrowdingFlag {
    pub fn status(&self) -> &'static str {
        match self {
            CrowdingFlag::HighCorrelation => "high correlation",
            CrowdingFlag::LiquidityRisk => "liquidity risk",
            CrowdingFlag::StrategyRetirement => "strategy retirement",
            CrowdingFlag::AlphaDecaying => "alpha decaying",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            CrowdingFlag::HighCorrelation => "reduce factor exposure",
            CrowdingFlag::LiquidityRisk => "liquidity crisis warning",
            CrowdingFlag::StrategyRetirement => "strategy retirement warning",
            CrowdingFlag::AlphaDecaying => "cancel trades",
        }
    }
}

/// Inputs that come from outside the return matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrowdingInputs {
    pub position_notional: f64,
    pub avg_daily_volume: f64,
    pub dsr: f64,
    pub alpha_half_life_weeks: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdingAssessment {
    pub avg_correlation: f64,
    pub days_to_cover: f64,
    pub flags: Vec<CrowdingFlag>,
    /// Fired statuses joined with " + ", or "normal"
    pub status: String,
    /// Fired actions joined with "; ", or "maintain strategy"
    pub action: String,
}

impl CrowdingAssessment {
    pub fn is_normal(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Mean of the upper-triangle Pearson correlations between columns
///
/// 0 with fewer than two columns.
pub fn average_pairwise_correlation(returns: &SeriesMatrix) -> f64 {
    let n = returns.cols();
    if n < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut count = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            total += stats::pearson(returns.column(i), returns.column(j));
            count += 1;
        }
    }
    total / count as f64
}

/// Days needed to exit a position at average daily volume
pub fn days_to_cover(position_notional: f64, avg_daily_volume: f64) -> f64 {
    if avg_daily_volume <= 0.0 {
        return f64::INFINITY;
    }
    position_notional / avg_daily_volume
}

/// Alpha half-life in weeks from a weekly alpha series
///
/// Smooths with a 4-period rolling mean and reads the decay from the first
/// and last smoothed values. Infinite when the series is too short or the
/// alpha is not decaying.
pub fn estimate_alpha_half_life(alpha: &[f64]) -> f64 {
    const WINDOW: usize = 4;
    if alpha.len() < WINDOW {
        return f64::INFINITY;
    }

    let rolling: Vec<f64> = alpha.windows(WINDOW).map(stats::mean).collect();
    let (first, last) = match (rolling.first(), rolling.last()) {
        (Some(&f), Some(&l)) if f != 0.0 => (f, l),
        _ => return f64::INFINITY,
    };

    let decay = last / first;
    if decay > 0.0 && decay < 1.0 {
        -std::f64::consts::LN_2 / decay.ln() * rolling.len() as f64 / 12.0
    } else {
        f64::INFINITY
    }
}

/// Remaining-alpha share at or above which the full position is taken
pub const ALPHA_EXECUTE_FULL: f64 = 0.6;
/// Remaining-alpha share at or above which half the position is taken
pub const ALPHA_EXECUTE_HALF: f64 = 0.4;

/// Go/no-go on a signal whose edge may have been eaten before execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlphaDecision {
    ExecuteFull,
    ExecuteHalf,
    Abort,
}

impl AlphaDecision {
    fn from_remaining(remaining: f64) -> Self {
        if remaining >= ALPHA_EXECUTE_FULL {
            AlphaDecision::ExecuteFull
        } else if remaining >= ALPHA_EXECUTE_HALF {
            AlphaDecision::ExecuteHalf
        } else {
            AlphaDecision::Abort
        }
    }

    /// Share of the planned position to execute
    pub fn position_multiplier(&self) -> f64 {
        match self {
            AlphaDecision::ExecuteFull => 1.0,
            AlphaDecision::ExecuteHalf => 0.5,
            AlphaDecision::Abort => 0.0,
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            AlphaDecision::ExecuteFull => "sufficient",
            AlphaDecision::ExecuteHalf => "moderate",
            AlphaDecision::Abort => "insufficient",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaDecayCheck {
    pub decision: AlphaDecision,
    /// Remaining move to target over the move originally expected
    pub remaining: f64,
    pub advice: String,
}

/// Decide whether a signal still carries enough alpha to trade
///
/// The expected gain is `entry_price * initial_alpha`; what is left of it is
/// `target_price - current_price`. A non-positive alpha or entry price, or a
/// non-finite ratio, aborts with nothing remaining.
pub fn check_alpha_decay(
    initial_alpha: f64,
    entry_price: f64,
    target_price: f64,
    current_price: f64,
) -> AlphaDecayCheck {
    let expected_gain = entry_price * initial_alpha;
    let remaining = if initial_alpha > 0.0 && entry_price > 0.0 && expected_gain > 0.0 {
        (target_price - current_price) / expected_gain
    } else {
        f64::NAN
    };

    let (decision, remaining) = if remaining.is_finite() {
        (AlphaDecision::from_remaining(remaining), remaining)
    } else {
        (AlphaDecision::Abort, 0.0)
    };

    let pct = remaining * 100.0;
    let advice = match decision {
        AlphaDecision::ExecuteFull => format!("{:.0}% of alpha left, execute full position", pct),
        AlphaDecision::ExecuteHalf => format!("{:.0}% of alpha left, halve the position", pct),
        AlphaDecision::Abort => format!("{:.0}% of alpha left, abort trade", pct),
    };

    tracing::debug!("Alpha decay: remaining={:.3} -> {:?}", remaining, decision);

    AlphaDecayCheck {
        decision,
        remaining,
        advice,
    }
}

/// Run all crowding checks
pub fn assess_crowding(
    returns: &SeriesMatrix,
    inputs: &CrowdingInputs,
    config: &CrowdingConfig,
) -> CrowdingAssessment {
    let avg_correlation = average_pairwise_correlation(returns);
    let days_to_cover = days_to_cover(inputs.position_notional, inputs.avg_daily_volume);

    let mut flags = Vec::new();
    if avg_correlation > config.max_correlation {
        flags.push(CrowdingFlag::HighCorrelation);
    }
    if days_to_cover > config.max_days_to_cover {
        flags.push(CrowdingFlag::LiquidityRisk);
    }
    if inputs.dsr < config.min_dsr {
        flags.push(CrowdingFlag::StrategyRetirement);
    }
    if inputs.alpha_half_life_weeks < config.min_alpha_half_life_weeks {
        flags.push(CrowdingFlag::AlphaDecaying);
    }

    let (status, action) = if flags.is_empty() {
        ("normal".to_string(), "maintain strategy".to_string())
    } else {
        (
            flags.iter().map(|f| f.status()).collect::<Vec<_>>().join(" + "),
            flags.iter().map(|f| f.action()).collect::<Vec<_>>().join("; "),
        )
    };

    if !flags.is_empty() {
        tracing::warn!("Crowding detected: {} ({})", status, action);
    }

    CrowdingAssessment {
        avg_correlation,
        days_to_cover,
        flags,
        status,
        action,
    }
}
