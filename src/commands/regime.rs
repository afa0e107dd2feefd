//! Regime command implementation

use anyhow::Result;
use quant_signals::data::{CsvMarketData, MarketDataProvider};
use quant_signals::regime::{detect_regime_with, RegimeLabel, RegimeState};
use quant_signals::report::Reading;
use quant_signals::{Config, Symbol};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct RegimeOutput {
    symbol: Symbol,
    observations: usize,
    regime: Reading<RegimeState>,
    label: RegimeLabel,
    stance: &'static str,
}

pub fn run(config: &Config, symbol: &str) -> Result<()> {
    let symbol = Symbol::new(symbol);
    let provider = CsvMarketData::new(&config.data.dir);
    let returns = provider.returns(&symbol)?;
    info!("Detecting regime for {} over {} returns", symbol, returns.len());

    let state = detect_regime_with(&returns, &config.regime);
    let regime = if returns.len() < config.regime.lookback {
        Reading::fallback(state)
    } else {
        Reading::live(state)
    };
    let label = RegimeLabel::from_bull_probability(state.bull_probability);

    super::print_json(&RegimeOutput {
        symbol,
        observations: returns.len(),
        regime,
        label,
        stance: label.stance(),
    })
}
