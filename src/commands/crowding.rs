//! Crowding command implementation

use anyhow::Result;
use quant_signals::crowding::{assess_crowding, check_alpha_decay, AlphaDecision, CrowdingInputs};
use quant_signals::data::CsvMarketData;
use quant_signals::Config;
use tracing::{info, warn};

pub fn run(
    config: &Config,
    symbols: &str,
    notional: f64,
    avg_volume: f64,
    dsr: f64,
    alpha_half_life: f64,
) -> Result<()> {
    let symbols = super::parse_symbols(symbols);
    let provider = CsvMarketData::new(&config.data.dir);
    let (loaded, _, returns) = provider.load_universe(&symbols)?;
    info!("Crowding screen over {} symbols", loaded.len());

    let inputs = CrowdingInputs {
        position_notional: notional,
        avg_daily_volume: avg_volume,
        dsr,
        alpha_half_life_weeks: alpha_half_life,
    };
    let assessment = assess_crowding(&returns, &inputs, &config.crowding);

    super::print_json(&assessment)
}

pub fn run_alpha_decay(initial_alpha: f64, entry: f64, target: f64, current: f64) -> Result<()> {
    let check = check_alpha_decay(initial_alpha, entry, target, current);
    if check.decision == AlphaDecision::Abort {
        warn!("Signal alpha exhausted: {}", check.advice);
    } else {
        info!("{}", check.advice);
    }

    super::print_json(&check)
}
