//! Skill command implementation

use anyhow::{Context, Result};
use quant_signals::data::load_series;
use quant_signals::skill::{assess_skill, SkillAssessment};
use quant_signals::validation::{
    cpcv_validate, interpret_wfo, split_sharpes, walk_forward, CpcvResult, WfoInterpretation,
};
use quant_signals::Config;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Share of each walk-forward window used in-sample
const IN_SAMPLE_PCT: f64 = 0.7;

#[derive(Serialize)]
struct SkillOutput {
    observations: usize,
    assessment: SkillAssessment,
    action: &'static str,
    wfo_monotonic: bool,
    wfo_final_equity: Option<f64>,
    wfo: WfoInterpretation,
    wfo_description: &'static str,
    cpcv: CpcvResult,
}

pub fn run(config: &Config, path: &Path, n_trials: Option<usize>, splits: usize) -> Result<()> {
    let returns: Vec<f64> = load_series(path)
        .with_context(|| format!("Failed to load returns from {}", path.display()))?
        .into_iter()
        .map(|o| o.close)
        .collect();
    info!("Assessing {} returns from {}", returns.len(), path.display());

    let mut skill_config = config.skill.clone();
    if let Some(n) = n_trials {
        skill_config.n_trials = n;
    }

    // Walk-forward windows stand in for the configurations behind PBO
    let (is_sharpes, oos_sharpes) = split_sharpes(&returns, splits, IN_SAMPLE_PCT);
    let assessment = assess_skill(&returns, &skill_config, &is_sharpes, &oos_sharpes);

    let wfo_result = walk_forward(&returns, splits, IN_SAMPLE_PCT);
    let wfo = interpret_wfo(wfo_result.is_monotonic, assessment.pbo);
    let cpcv = cpcv_validate(&returns, splits);

    info!(
        "Verdict: {} (DSR {:.3}), walk-forward {:?}",
        assessment.verdict.label(),
        assessment.dsr,
        wfo
    );

    super::print_json(&SkillOutput {
        observations: returns.len(),
        action: assessment.verdict.action(),
        assessment,
        wfo_monotonic: wfo_result.is_monotonic,
        wfo_final_equity: wfo_result.equity_curve.last().copied(),
        wfo,
        wfo_description: wfo.description(),
        cpcv,
    })
}
