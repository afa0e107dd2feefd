//! Risk snapshot assembled from the individual indicators
//!
//! Every reading carries a [`DataSource`] so a neutral default produced for
//! missing or insufficient data cannot be mistaken for a calm market.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kelly::{KellyPosition, KellySizer, RegimeKind};
use crate::regime::{detect_regime_with, RegimeConfig, RegimeLabel, RegimeState};
use crate::risk::{calculate_defcon, DefconLevel, GexLevel, VixTier};
use crate::vpin::{classify_vpin, VpinAction, VpinLevel};

/// VIX assumed when no quote is available (Tier 1)
pub const FALLBACK_VIX: f64 = 20.0;
/// VPIN assumed when the tick feed is unavailable
pub const FALLBACK_VPIN: f64 = 0.55;
/// GEX assumed when no option positioning is available
pub const FALLBACK_GEX: f64 = 0.0;
pub const FALLBACK_GLI_Z: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    Live,
    Fallback,
}

/// A value tagged with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Reading<T> {
    pub fn live(value: T) -> Self {
        Reading {
            value,
            source: DataSource::Live,
        }
    }

    pub fn fallback(value: T) -> Self {
        Reading {
            value,
            source: DataSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        Reading {
            value: f(self.value),
            source: self.source,
        }
    }
}

/// Resolve an optional live value against its fallback
fn reading_or(value: Option<f64>, fallback: f64) -> Reading<f64> {
    match value {
        Some(v) if v.is_finite() => Reading::live(v),
        _ => Reading::fallback(fallback),
    }
}

/// Current market readings; `None` means the feed was unavailable
#[derive(Debug, Clone, Default)]
pub struct MarketInputs {
    pub returns: Option<Vec<f64>>,
    pub vix: Option<f64>,
    pub gex: Option<f64>,
    pub vpin: Option<f64>,
    pub gli_z: Option<f64>,
}

/// Historical trade statistics for position sizing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub generated_at: DateTime<Utc>,
    pub regime: Reading<RegimeState>,
    pub regime_label: RegimeLabel,
    pub vix: Reading<f64>,
    pub vix_tier: VixTier,
    pub vpin: Reading<f64>,
    pub vpin_level: VpinLevel,
    pub vpin_action: VpinAction,
    pub gex: Reading<f64>,
    pub gex_level: GexLevel,
    pub gli_z: Reading<f64>,
    pub defcon: DefconLevel,
    pub permission: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kelly: Option<KellyPosition>,
}

impl RiskReport {
    /// True if any input fell back to its default
    pub fn has_fallback(&self) -> bool {
        self.regime.is_fallback()
            || self.vix.is_fallback()
            || self.vpin.is_fallback()
            || self.gex.is_fallback()
            || self.gli_z.is_fallback()
    }
}

fn regime_kind(label: RegimeLabel) -> RegimeKind {
    match label {
        RegimeLabel::BullMarket => RegimeKind::TrendBull,
        RegimeLabel::NeutralBullish | RegimeLabel::NeutralBearish => RegimeKind::RangeBound,
        RegimeLabel::BearMarket => RegimeKind::PanicBear,
    }
}

/// Build a risk snapshot
///
/// When `trades` is given, a Kelly position is sized from the detected
/// regime and the VIX tier.
pub fn build_risk_report(
    inputs: &MarketInputs,
    regime_config: &RegimeConfig,
    sizer: &KellySizer,
    trades: Option<&TradeStats>,
) -> RiskReport {
    let regime = match inputs.returns.as_deref() {
        Some(returns) if returns.len() >= regime_config.lookback => {
            Reading::live(detect_regime_with(returns, regime_config))
        }
        _ => Reading::fallback(RegimeState::NEUTRAL),
    };
    let regime_label = RegimeLabel::from_bull_probability(regime.value.bull_probability);

    let vix = reading_or(inputs.vix, FALLBACK_VIX);
    let vpin = reading_or(inputs.vpin, FALLBACK_VPIN);
    let gex = reading_or(inputs.gex, FALLBACK_GEX);
    let gli_z = reading_or(inputs.gli_z, FALLBACK_GLI_Z);

    let vix_tier = VixTier::from_vix(vix.value);
    let (vpin_level, vpin_action) = classify_vpin(vpin.value);
    let defcon = calculate_defcon(
        vix.value,
        regime.value.state,
        vpin.value,
        gli_z.value,
        gex.value,
    );

    let kelly = trades.map(|t| {
        let regime_factor = regime_kind(regime_label).kelly_factor();
        sizer.size(
            t.win_rate,
            t.avg_win,
            t.avg_loss,
            regime_factor,
            vix_tier.kelly_multiplier(),
        )
    });

    let report = RiskReport {
        generated_at: Utc::now(),
        regime,
        regime_label,
        vix,
        vix_tier,
        vpin,
        vpin_level,
        vpin_action,
        gex,
        gex_level: GexLevel::from_gex(gex.value),
        gli_z,
        defcon,
        permission: defcon.permission().to_string(),
        kelly,
    };

    if report.has_fallback() {
        tracing::warn!("Risk report built with fallback inputs; {} may be optimistic", defcon);
    }

    report
}
