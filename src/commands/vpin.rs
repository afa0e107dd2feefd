//! VPIN command implementation

use anyhow::Result;
use quant_signals::data::{CsvMarketData, MarketDataProvider};
use quant_signals::policy::{Alert, VpinExceededPolicy};
use quant_signals::vpin::{calculate_vpin, classify_vpin, VpinAction, VpinLevel};
use quant_signals::{Config, Symbol};
use serde::Serialize;
use tracing::info;

const REPLAY_STEPS: usize = 200;

#[derive(Serialize)]
struct VpinOutput {
    symbol: Symbol,
    ticks: usize,
    vpin: f64,
    level: VpinLevel,
    action: VpinAction,
    action_description: &'static str,
    /// Escalations seen while replaying the history
    alerts: Vec<Alert>,
}

pub fn run(config: &Config, symbol: &str) -> Result<()> {
    let symbol = Symbol::new(symbol);
    let provider = CsvMarketData::new(&config.data.dir);
    let ticks = provider.volume_ticks(&symbol)?;

    let vpin = calculate_vpin(&ticks, &config.vpin)?;
    let (level, action) = classify_vpin(vpin);
    info!("{} VPIN {:.3} ({})", symbol, vpin, level.name());

    // Replay the history through the alert policy in about REPLAY_STEPS steps
    let step = (ticks.len() / REPLAY_STEPS).max(1);
    let mut policy = VpinExceededPolicy::new();
    let mut alerts = Vec::new();
    for end in (step..=ticks.len()).step_by(step) {
        let running = calculate_vpin(&ticks[..end], &config.vpin)?;
        if let Some(alert) = policy.evaluate(running) {
            alerts.push(alert);
        }
    }

    super::print_json(&VpinOutput {
        symbol,
        ticks: ticks.len(),
        vpin,
        level,
        action,
        action_description: action.description(),
        alerts,
    })
}
