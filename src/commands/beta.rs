//! Beta command implementation

use anyhow::Result;
use quant_signals::beta::{estimate_lead_lag, kalman_beta, BetaEstimate, LeadLag};
use quant_signals::data::{CsvMarketData, MarketDataProvider};
use quant_signals::{Config, Symbol};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
struct BetaOutput {
    driver: Symbol,
    dependent: Symbol,
    observations: usize,
    beta: Option<BetaEstimate>,
    lead_lag: LeadLag,
}

pub fn run(config: &Config, driver: &str, dependent: &str) -> Result<()> {
    let driver = Symbol::new(driver);
    let dependent = Symbol::new(dependent);
    let provider = CsvMarketData::new(&config.data.dir);

    let driver_returns = provider.returns(&driver)?;
    let dependent_returns = provider.returns(&dependent)?;

    // Align on the common tail
    let n = driver_returns.len().min(dependent_returns.len());
    if n < driver_returns.len().max(dependent_returns.len()) {
        warn!(
            "Series lengths differ ({} vs {}), using the last {}",
            driver_returns.len(),
            dependent_returns.len(),
            n
        );
    }
    let x = &driver_returns[driver_returns.len() - n..];
    let y = &dependent_returns[dependent_returns.len() - n..];

    let path = kalman_beta(
        x,
        y,
        config.beta.process_noise,
        config.beta.observation_noise,
    );
    let lead_lag = estimate_lead_lag(x, y, config.beta.max_lag);
    info!(
        "{} vs {}: lag {} (corr {:.3})",
        dependent, driver, lead_lag.lag, lead_lag.correlation
    );

    super::print_json(&BetaOutput {
        driver,
        dependent,
        observations: n,
        beta: path.last().copied(),
        lead_lag,
    })
}
