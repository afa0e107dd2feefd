//! Pairs command implementation

use anyhow::Result;
use quant_signals::data::CsvMarketData;
use quant_signals::pairs::scan_pairs;
use quant_signals::Config;
use tracing::info;

pub fn run(config: &Config, symbols: &str) -> Result<()> {
    let symbols = super::parse_symbols(symbols);
    if symbols.len() < 2 {
        anyhow::bail!("Need at least two symbols to scan for pairs");
    }

    let provider = CsvMarketData::new(&config.data.dir);
    let (loaded, prices, returns) = provider.load_universe(&symbols)?;

    info!("Scanning {} symbols over {} observations", loaded.len(), returns.rows());
    let candidates = scan_pairs(&loaded, &returns, &prices, &config.pairs);
    info!("Found {} candidate pairs", candidates.len());

    super::print_json(&candidates)
}
