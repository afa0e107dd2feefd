//! Kelly command implementation

use anyhow::Result;
use quant_signals::kelly::{regime_factor, KellySizer, RegimeKind};
use quant_signals::Config;
use tracing::{info, warn};

pub fn run(
    config: &Config,
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    regime: &str,
    vix: f64,
) -> Result<()> {
    if !(0.0..=1.0).contains(&win_rate) {
        anyhow::bail!("win rate must be within [0, 1], got {}", win_rate);
    }
    if RegimeKind::parse(regime).is_none() {
        warn!("Unknown regime '{}', using the neutral factor", regime);
    }

    let sizer = KellySizer::from_config(config.kelly.clone());
    let position = sizer.size_for_market(win_rate, avg_win, avg_loss, regime_factor(regime), vix);
    info!(
        "Kelly fraction {:.4} (cap {:.2})",
        position.fraction, sizer.max_position
    );

    super::print_json(&position)
}
