//! Defcon command implementation

use anyhow::Result;
use quant_signals::data::{CsvMarketData, MarketDataProvider};
use quant_signals::kelly::KellySizer;
use quant_signals::report::{build_risk_report, MarketInputs, TradeStats};
use quant_signals::{Config, Symbol};
use tracing::{info, warn};

/// Readings supplied on the command line
pub struct DefconArgs {
    pub vix: Option<f64>,
    pub gex: Option<f64>,
    pub vpin: Option<f64>,
    pub gli_z: Option<f64>,
    pub symbol: Option<String>,
    pub win_rate: Option<f64>,
    pub avg_win: Option<f64>,
    pub avg_loss: Option<f64>,
}

pub fn run(config: &Config, args: DefconArgs) -> Result<()> {
    let provider = CsvMarketData::new(&config.data.dir);

    // A missing benchmark file degrades to a fallback regime instead of failing
    let returns = match args.symbol.as_deref().map(Symbol::new) {
        Some(symbol) => match provider.returns(&symbol) {
            Ok(returns) => Some(returns),
            Err(e) => {
                warn!("Regime input unavailable for {}: {:#}", symbol, e);
                None
            }
        },
        None => None,
    };

    let inputs = MarketInputs {
        returns,
        vix: args.vix,
        gex: args.gex,
        vpin: args.vpin,
        gli_z: args.gli_z,
    };

    let trades = match (args.win_rate, args.avg_win, args.avg_loss) {
        (Some(win_rate), Some(avg_win), Some(avg_loss)) => Some(TradeStats {
            win_rate,
            avg_win,
            avg_loss,
        }),
        _ => None,
    };

    let sizer = KellySizer::from_config(config.kelly.clone());
    let report = build_risk_report(&inputs, &config.regime, &sizer, trades.as_ref());
    info!("{}: {}", report.defcon, report.defcon.action());

    super::print_json(&report)
}
