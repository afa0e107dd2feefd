//! Volume-synchronized probability of informed trading (VPIN)
//!
//! Trades are poured into fixed-volume buckets. Each full bucket records its
//! order-flow imbalance `|buy - sell| / (buy + sell)`; VPIN is the mean
//! imbalance of the most recent buckets. Buy/sell classification is supplied
//! by the caller through [`VolumeTick::direction`].

use serde::{Deserialize, Serialize};

use crate::error::{SignalError, SignalResult};
use crate::types::VolumeTick;

/// VPIN at or above which the reading is Elevated
pub const VPIN_ELEVATED: f64 = 0.4;
/// VPIN at or above which the reading is High
pub const VPIN_HIGH: f64 = 0.6;
/// VPIN at or above which trading should halt
pub const VPIN_WARNING: f64 = 0.8;
/// VPIN above which the composite classifier goes to DEFCON 2
pub const VPIN_DEFCON2_TRIGGER: f64 = 0.95;

/// VPIN estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VpinConfig {
    /// Volume per bucket
    pub bucket_size: f64,
    /// Number of most recent buckets averaged
    pub lookback_buckets: usize,
}

impl Default for VpinConfig {
    fn default() -> Self {
        VpinConfig {
            bucket_size: 50.0,
            lookback_buckets: 50,
        }
    }
}

/// Compute VPIN over a trade sequence
///
/// Returns 0 when fewer than two buckets fill up. A non-positive bucket size
/// or a zero lookback is a programming error and fails fast.
pub fn calculate_vpin(ticks: &[VolumeTick], config: &VpinConfig) -> SignalResult<f64> {
    if !(config.bucket_size.is_finite() && config.bucket_size > 0.0) {
        return Err(SignalError::InvalidConfiguration(format!(
            "bucket_size must be positive, got {}",
            config.bucket_size
        )));
    }
    if config.lookback_buckets == 0 {
        return Err(SignalError::InvalidConfiguration(
            "lookback_buckets must be at least 1".to_string(),
        ));
    }

    let mut imbalances = Vec::new();
    let mut completed_buckets = 0usize;
    let mut cumulative = 0.0;
    let mut buy = 0.0;
    let mut sell = 0.0;

    for tick in ticks {
        if !tick.volume.is_finite() {
            continue;
        }
        let volume = tick.volume.abs();
        if tick.is_buy() {
            buy += volume;
        } else {
            sell += volume;
        }
        cumulative += volume;

        if cumulative >= config.bucket_size {
            completed_buckets += 1;
            let total = buy + sell;
            if total > 0.0 {
                imbalances.push((buy - sell).abs() / total);
            }
            buy = 0.0;
            sell = 0.0;
            cumulative = 0.0;
        }
    }

    if completed_buckets < 2 || imbalances.is_empty() {
        tracing::debug!(
            "VPIN: only {} complete buckets from {} ticks",
            completed_buckets,
            ticks.len()
        );
        return Ok(0.0);
    }

    let recent = &imbalances[imbalances.len().saturating_sub(config.lookback_buckets)..];
    Ok(recent.iter().sum::<f64>() / recent.len() as f64)
}

/// Ordered VPIN severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VpinLevel {
    Normal,
    Elevated,
    High,
    Critical,
}

impl VpinLevel {
    pub fn name(&self) -> &'static str {
        match self {
            VpinLevel::Normal => "NORMAL",
            VpinLevel::Elevated => "ELEVATED",
            VpinLevel::High => "HIGH",
            VpinLevel::Critical => "CRITICAL",
        }
    }
}

/// Action attached to a VPIN classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VpinAction {
    NormalTrading,
    MonitorLiquidity,
    ReduceSize,
    HaltTrading,
    /// Toxicity high enough to force the composite tier to DEFCON 2
    Defensive,
}

impl VpinAction {
    pub fn description(&self) -> &'static str {
        match self {
            VpinAction::NormalTrading => "Normal trading",
            VpinAction::MonitorLiquidity => "Monitor liquidity",
            VpinAction::ReduceSize => "Reduce position size",
            VpinAction::HaltTrading => "Halt trading (Warning)",
            VpinAction::Defensive => "Defensive mode (DEFCON 2)",
        }
    }

    pub fn halts_trading(&self) -> bool {
        matches!(self, VpinAction::HaltTrading | VpinAction::Defensive)
    }
}

/// Classify a VPIN value into a level and an action
pub fn classify_vpin(vpin: f64) -> (VpinLevel, VpinAction) {
    if vpin >= VPIN_DEFCON2_TRIGGER {
        (VpinLevel::Critical, VpinAction::Defensive)
    } else if vpin >= VPIN_WARNING {
        (VpinLevel::Critical, VpinAction::HaltTrading)
    } else if vpin >= VPIN_HIGH {
        (VpinLevel::High, VpinAction::ReduceSize)
    } else if vpin >= VPIN_ELEVATED {
        (VpinLevel::Elevated, VpinAction::MonitorLiquidity)
    } else {
        (VpinLevel::Normal, VpinAction::NormalTrading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn config(bucket_size: f64, lookback_buckets: usize) -> VpinConfig {
        VpinConfig {
            bucket_size,
            lookback_buckets,
        }
    }

    #[test]
    fn test_rejects_bad_bucket_size() {
        assert!(calculate_vpin(&[], &config(0.0, 10)).is_err());
        assert!(calculate_vpin(&[], &config(-5.0, 10)).is_err());
        assert!(calculate_vpin(&[], &config(f64::NAN, 10)).is_err());
        assert!(calculate_vpin(&[], &config(10.0, 0)).is_err());
    }

    #[test]
    fn test_needs_two_buckets() {
        let ticks = vec![VolumeTick::new(60.0, 1.0)];
        assert_eq!(calculate_vpin(&ticks, &config(50.0, 10)).unwrap(), 0.0);
        assert_eq!(calculate_vpin(&[], &config(50.0, 10)).unwrap(), 0.0);
    }

    #[test]
    fn test_one_sided_flow_is_fully_toxic() {
        let ticks: Vec<VolumeTick> = (0..10).map(|_| VolumeTick::new(25.0, 1.0)).collect();
        assert_abs_diff_eq!(calculate_vpin(&ticks, &config(50.0, 10)).unwrap(), 1.0);
    }

    #[test]
    fn test_balanced_flow_is_clean() {
        let ticks: Vec<VolumeTick> = (0..10)
            .map(|i| VolumeTick::new(25.0, if i % 2 == 0 { 1.0 } else { -1.0 }))
            .collect();
        assert_abs_diff_eq!(calculate_vpin(&ticks, &config(50.0, 10)).unwrap(), 0.0);
    }

    #[test]
    fn test_lookback_uses_latest_buckets() {
        // Two balanced buckets followed by two one-sided buckets
        let mut ticks = vec![
            VolumeTick::new(25.0, 1.0),
            VolumeTick::new(25.0, -1.0),
            VolumeTick::new(25.0, 1.0),
            VolumeTick::new(25.0, -1.0),
        ];
        ticks.extend((0..4).map(|_| VolumeTick::new(25.0, -1.0)));
        assert_abs_diff_eq!(calculate_vpin(&ticks, &config(50.0, 2)).unwrap(), 1.0);
        assert_abs_diff_eq!(calculate_vpin(&ticks, &config(50.0, 4)).unwrap(), 0.5);
    }

    #[test]
    fn test_classify_bands() {
        assert_eq!(classify_vpin(0.1).0, VpinLevel::Normal);
        assert_eq!(classify_vpin(0.45).0, VpinLevel::Elevated);
        assert_eq!(classify_vpin(0.65).0, VpinLevel::High);
        assert_eq!(classify_vpin(0.85), (VpinLevel::Critical, VpinAction::HaltTrading));
        assert_eq!(classify_vpin(0.97), (VpinLevel::Critical, VpinAction::Defensive));
        assert!(classify_vpin(0.97).1.halts_trading());
        assert!(VpinLevel::Critical > VpinLevel::High);
    }
}
