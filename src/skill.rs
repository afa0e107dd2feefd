//! Skill versus luck on a strategy track record
//!
//! The Deflated Sharpe Ratio corrects an observed Sharpe for the number of
//! configurations tried before it was picked; the Probabilistic Sharpe Ratio
//! corrects it for sample length and non-normal returns. Both are
//! probabilities in [0, 1].

use serde::{Deserialize, Serialize};

use crate::stats;
use crate::validation::probability_of_backtest_overfitting;

/// Euler-Mascheroni constant
pub const EULER_GAMMA: f64 = 0.5772156649;

/// DSR above which a record is Skill Dominated
pub const SKILL_DOMINATED_DSR: f64 = 0.95;
/// DSR above which a record shows Possible Skill
pub const POSSIBLE_SKILL_DSR: f64 = 0.75;
/// DSR above which a record is Indeterminate
pub const INDETERMINATE_DSR: f64 = 0.50;

/// Skill validator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillConfig {
    /// Dispersion of Sharpe ratios across trials
    pub sr_std: f64,
    /// Number of configurations tried before this one was selected
    pub n_trials: usize,
    /// Sharpe the PSR is tested against
    pub benchmark_sharpe: f64,
}

impl Default for SkillConfig {
    fn default() -> Self {
        SkillConfig {
            sr_std: 1.0,
            n_trials: 1,
            benchmark_sharpe: 0.0,
        }
    }
}

/// Expected maximum Sharpe among `n_trials` unskilled trials
///
/// A single trial gives `Φ⁻¹(0) = -∞`: nothing was selected, so any observed
/// Sharpe clears the bar.
fn expected_max_sharpe(n_trials: usize, sr_std: f64) -> f64 {
    let n = n_trials as f64;
    let first = stats::norm_ppf(1.0 - 1.0 / n);
    let second = stats::norm_ppf(1.0 - 1.0 / (n * std::f64::consts::E));
    sr_std * ((1.0 - EULER_GAMMA) * first + EULER_GAMMA * second)
}

fn as_probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Deflated Sharpe Ratio
///
/// Returns 0 when `n_trials < 1`, `n_obs < 1` or `sr_std` is not positive,
/// and 1 for a single trial with a finite Sharpe.
pub fn deflated_sharpe_ratio(sr: f64, n_trials: usize, n_obs: usize, sr_std: f64) -> f64 {
    if n_trials < 1 || n_obs < 1 || !(sr_std > 0.0) {
        return 0.0;
    }

    let max_sr = expected_max_sharpe(n_trials, sr_std);
    let z = (sr - max_sr) * (n_obs as f64).sqrt() / sr_std;
    if z == f64::INFINITY {
        return 1.0;
    }
    as_probability(stats::norm_cdf(z))
}

/// Probabilistic Sharpe Ratio against `benchmark_sr`
///
/// `kurt` is non-excess (3 for normal returns). Returns 0 when
/// `n_obs < 2` or the standard-error term is not positive.
pub fn probabilistic_sharpe_ratio(
    sr: f64,
    benchmark_sr: f64,
    n_obs: usize,
    skew: f64,
    kurt: f64,
) -> f64 {
    if n_obs < 2 {
        return 0.0;
    }

    let variance =
        (1.0 + 0.5 * sr * sr - skew * sr + ((kurt - 3.0) / 4.0) * sr * sr) / (n_obs as f64 - 1.0);
    if !(variance.is_finite() && variance > 0.0) {
        return 0.0;
    }

    as_probability(stats::norm_cdf((sr - benchmark_sr) / variance.sqrt()))
}

/// Skill verdict on a DSR value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillVerdict {
    SkillDominated,
    PossibleSkill,
    Indeterminate,
    LuckDominated,
}

impl SkillVerdict {
    pub fn from_dsr(dsr: f64) -> Self {
        if dsr > SKILL_DOMINATED_DSR {
            SkillVerdict::SkillDominated
        } else if dsr > POSSIBLE_SKILL_DSR {
            SkillVerdict::PossibleSkill
        } else if dsr > INDETERMINATE_DSR {
            SkillVerdict::Indeterminate
        } else {
            SkillVerdict::LuckDominated
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillVerdict::SkillDominated => "skill dominated",
            SkillVerdict::PossibleSkill => "possible skill",
            SkillVerdict::Indeterminate => "indeterminate",
            SkillVerdict::LuckDominated => "luck dominated",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            SkillVerdict::SkillDominated => "Increase allocation",
            SkillVerdict::PossibleSkill => "Maintain allocation",
            SkillVerdict::Indeterminate => "Reduce allocation",
            SkillVerdict::LuckDominated => "Consider discontinuing",
        }
    }
}

/// Skill statistics for one return sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAssessment {
    /// Per-period Sharpe (sample mean over sample std)
    pub sharpe: f64,
    pub dsr: f64,
    pub psr: f64,
    pub pbo: f64,
    pub verdict: SkillVerdict,
}

/// Per-period Sharpe ratio; 0 with fewer than two returns or a flat sample
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let std = stats::sample_std(returns);
    if !(std > stats::FLAT_STD) {
        return 0.0;
    }
    stats::mean(returns) / std
}

/// Assess a track record
///
/// `is_sharpes` and `oos_sharpes` are the in-sample and out-of-sample Sharpes
/// of every configuration tried; they feed the PBO estimate.
pub fn assess_skill(
    returns: &[f64],
    config: &SkillConfig,
    is_sharpes: &[f64],
    oos_sharpes: &[f64],
) -> SkillAssessment {
    let sharpe = sharpe_ratio(returns);
    let n_obs = returns.len();

    let dsr = deflated_sharpe_ratio(sharpe, config.n_trials, n_obs, config.sr_std);
    let psr = probabilistic_sharpe_ratio(
        sharpe,
        config.benchmark_sharpe,
        n_obs,
        stats::skewness(returns),
        stats::kurtosis(returns),
    );
    let pbo = probability_of_backtest_overfitting(is_sharpes, oos_sharpes);
    let verdict = SkillVerdict::from_dsr(dsr);

    tracing::debug!(
        "Skill: sharpe={:.4} dsr={:.4} psr={:.4} pbo={:.3} verdict={}",
        sharpe,
        dsr,
        psr,
        pbo,
        verdict.label()
    );

    SkillAssessment {
        sharpe,
        dsr,
        psr,
        pbo,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dsr_degenerate_inputs() {
        assert_eq!(deflated_sharpe_ratio(1.0, 0, 100, 1.0), 0.0);
        assert_eq!(deflated_sharpe_ratio(1.0, 10, 0, 1.0), 0.0);
        assert_eq!(deflated_sharpe_ratio(1.0, 10, 100, 0.0), 0.0);
        assert_eq!(deflated_sharpe_ratio(1.0, 10, 100, -0.5), 0.0);
        assert_eq!(deflated_sharpe_ratio(1.0, 1, 100, 0.0), 0.0);
    }

    #[test]
    fn test_dsr_single_trial_is_certain() {
        assert_eq!(expected_max_sharpe(1, 1.0), f64::NEG_INFINITY);
        assert_eq!(deflated_sharpe_ratio(-0.5, 1, 100, 1.0), 1.0);
        assert_eq!(deflated_sharpe_ratio(0.0, 1, 100, 1.0), 1.0);
        assert_eq!(deflated_sharpe_ratio(2.0, 1, 1, 0.3), 1.0);
    }

    #[test]
    fn test_dsr_two_trials_matches_closed_form() {
        // E[max] = (1 - g) * ppf(0.5) + g * ppf(1 - 1 / 2e) = g * ppf(1 - 1 / 2e)
        let max_sr = expected_max_sharpe(2, 1.0);
        assert_abs_diff_eq!(
            max_sr,
            EULER_GAMMA * stats::norm_ppf(1.0 - 0.5 / std::f64::consts::E),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            deflated_sharpe_ratio(max_sr, 2, 100, 1.0),
            0.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_dsr_penalizes_more_trials() {
        let few = deflated_sharpe_ratio(0.3, 2, 50, 0.1);
        let many = deflated_sharpe_ratio(0.3, 1000, 50, 0.1);
        assert!(few > many);
        assert!((0.0..=1.0).contains(&few));
        assert!((0.0..=1.0).contains(&many));
    }

    #[test]
    fn test_psr() {
        assert_eq!(probabilistic_sharpe_ratio(0.5, 0.0, 1, 0.0, 3.0), 0.0);
        assert_abs_diff_eq!(
            probabilistic_sharpe_ratio(0.0, 0.0, 100, 0.0, 3.0),
            0.5,
            epsilon = 1e-9
        );
        let strong = probabilistic_sharpe_ratio(0.3, 0.0, 252, 0.0, 3.0);
        assert!(strong > 0.99 && strong <= 1.0);
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(SkillVerdict::from_dsr(0.96), SkillVerdict::SkillDominated);
        assert_eq!(SkillVerdict::from_dsr(0.95), SkillVerdict::PossibleSkill);
        assert_eq!(SkillVerdict::from_dsr(0.6), SkillVerdict::Indeterminate);
        assert_eq!(SkillVerdict::from_dsr(0.5), SkillVerdict::LuckDominated);
        assert_eq!(SkillVerdict::LuckDominated.action(), "Consider discontinuing");
    }

    #[test]
    fn test_sharpe_ratio() {
        assert_eq!(sharpe_ratio(&[0.01]), 0.0);
        assert_eq!(sharpe_ratio(&[0.01, 0.01, 0.01]), 0.0);
        // mean 2, sample std 1
        assert_abs_diff_eq!(sharpe_ratio(&[1.0, 2.0, 3.0]), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_default_config_single_trial_verdict() {
        // Losing record, but with one trial there is no selection to deflate
        let losing: Vec<f64> = (0..100)
            .map(|i| if i % 3 == 0 { 0.004 } else { -0.003 })
            .collect();
        let assessment = assess_skill(&losing, &SkillConfig::default(), &[], &[]);
        assert!(assessment.sharpe < 0.0);
        assert_eq!(assessment.dsr, 1.0);
        assert_eq!(assessment.verdict, SkillVerdict::SkillDominated);
        assert!(assessment.psr < 0.5);
        assert_eq!(assessment.pbo, 1.0);
    }

    #[test]
    fn test_assess_skill_on_steady_gains() {
        let returns: Vec<f64> = (0..252)
            .map(|i| if i % 4 == 0 { -0.002 } else { 0.004 })
            .collect();
        let assessment = assess_skill(&returns, &SkillConfig::default(), &[1.0, 0.5], &[0.8, 0.2]);
        assert!(assessment.sharpe > 0.5);
        assert_eq!(assessment.verdict, SkillVerdict::SkillDominated);
        assert!(assessment.psr > 0.95);
        assert_abs_diff_eq!(assessment.pbo, 0.0);
    }
}
