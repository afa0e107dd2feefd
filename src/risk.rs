//! Composite risk classification
//!
//! Combines market readings into ordinal risk tiers:
//!
//! - DEFCON 1-5 from VIX, regime state, VPIN and dealer gamma exposure,
//!   evaluated as a first-match cascade so the worst signal wins
//! - VIX fear tier (4 bands) with its Kelly exposure multiplier
//! - GEX level (5 bands) from net dealer gamma exposure
//! - Liquidity pulse: z-score of a global liquidity composite
//!
//! Every classifier is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use crate::stats;
use crate::vpin::VPIN_DEFCON2_TRIGGER;

/// VIX at or above which the system hands over to a human
pub const VIX_DEFCON_1: f64 = 50.0;
pub const VIX_DEFCON_2: f64 = 40.0;
pub const VIX_DEFCON_3: f64 = 30.0;
pub const VIX_DEFCON_4: f64 = 20.0;

/// Net gamma exposure below which dealers amplify moves
pub const GEX_FLIP: f64 = 0.0;

/// VIX tier upper bounds
pub const VIX_TIER_0_MAX: f64 = 15.0;
pub const VIX_TIER_1_MAX: f64 = 25.0;
pub const VIX_TIER_2_MAX: f64 = 40.0;

/// Composite risk tier (5 = safest, 1 = most severe)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefconLevel {
    Defcon1 = 1,
    Defcon2 = 2,
    Defcon3 = 3,
    Defcon4 = 4,
    Defcon5 = 5,
}

impl DefconLevel {
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// 0 for DEFCON 5 up to 4 for DEFCON 1
    pub fn severity(&self) -> u8 {
        5 - self.value()
    }

    pub fn permission(&self) -> &'static str {
        match self {
            DefconLevel::Defcon1 => "Manual takeover",
            DefconLevel::Defcon2 => "Defensive mode",
            DefconLevel::Defcon3 => "Restricted mode",
            DefconLevel::Defcon4 => "Full auto, no new positions",
            DefconLevel::Defcon5 => "Full auto",
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            DefconLevel::Defcon1 => "Kill switch, all cash or treasuries",
            DefconLevel::Defcon2 => "Flatten alpha, keep only cash and hedges",
            DefconLevel::Defcon3 => "Exposure capped at 50%, no new positions",
            DefconLevel::Defcon4 => "No new positions, reduce only",
            DefconLevel::Defcon5 => "Normal trading",
        }
    }
}

impl std::fmt::Display for DefconLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DEFCON_{}", self.value())
    }
}

/// Classify the composite risk tier
///
/// First match wins, most severe first. `gli_z` is carried for reporting
/// and does not move the tier.
pub fn calculate_defcon(vix: f64, regime_state: u8, vpin: f64, gli_z: f64, gex: f64) -> DefconLevel {
    let level = if vix >= VIX_DEFCON_1 {
        DefconLevel::Defcon1
    } else if vix >= VIX_DEFCON_2 || gex < GEX_FLIP || vpin > VPIN_DEFCON2_TRIGGER {
        DefconLevel::Defcon2
    } else if vix >= VIX_DEFCON_3 {
        DefconLevel::Defcon3
    } else if vix >= VIX_DEFCON_4 || regime_state >= 2 {
        DefconLevel::Defcon4
    } else {
        DefconLevel::Defcon5
    };

    tracing::debug!(
        "DEFCON: vix={:.2} regime={} vpin={:.3} gli_z={:.2} gex={:.2} -> {}",
        vix,
        regime_state,
        vpin,
        gli_z,
        gex,
        level
    );

    level
}

/// VIX fear tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VixTier {
    /// VIX < 15
    Tier0,
    /// 15 <= VIX < 25
    Tier1,
    /// 25 <= VIX < 40
    Tier2,
    /// VIX >= 40
    Tier3,
}

impl VixTier {
    pub fn from_vix(vix: f64) -> Self {
        if vix < VIX_TIER_0_MAX {
            VixTier::Tier0
        } else if vix < VIX_TIER_1_MAX {
            VixTier::Tier1
        } else if vix < VIX_TIER_2_MAX {
            VixTier::Tier2
        } else {
            VixTier::Tier3
        }
    }

    /// Exposure multiplier applied to Kelly sizing
    pub fn kelly_multiplier(&self) -> f64 {
        match self {
            VixTier::Tier0 => 1.0,
            VixTier::Tier1 => 0.75,
            VixTier::Tier2 => 0.50,
            VixTier::Tier3 => 0.25,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VixTier::Tier0 => "TIER_0",
            VixTier::Tier1 => "TIER_1",
            VixTier::Tier2 => "TIER_2",
            VixTier::Tier3 => "TIER_3",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VixTier::Tier0 => "Calm (100% Exposure)",
            VixTier::Tier1 => "Alert (75% Exposure)",
            VixTier::Tier2 => "Tense (50% Exposure)",
            VixTier::Tier3 => "Panic (25% Exposure)",
        }
    }

    /// Tier 2 and above count as risky for the composite alert
    pub fn is_risky(&self) -> bool {
        *self >= VixTier::Tier2
    }
}

/// Dealer gamma positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GexLevel {
    StrongShort,
    MildShort,
    Neutral,
    MildLong,
    StrongLong,
}

impl GexLevel {
    /// Classify net gamma exposure expressed in billions
    pub fn from_gex(gex_billions: f64) -> Self {
        if gex_billions > 5.0 {
            GexLevel::StrongLong
        } else if gex_billions > 2.0 {
            GexLevel::MildLong
        } else if gex_billions < -5.0 {
            GexLevel::StrongShort
        } else if gex_billions < -2.0 {
            GexLevel::MildShort
        } else {
            GexLevel::Neutral
        }
    }

    pub fn is_short(&self) -> bool {
        matches!(self, GexLevel::StrongShort | GexLevel::MildShort)
    }

    pub fn name(&self) -> &'static str {
        match self {
            GexLevel::StrongShort => "STRONG_SHORT",
            GexLevel::MildShort => "MILD_SHORT",
            GexLevel::Neutral => "NEUTRAL",
            GexLevel::MildLong => "MILD_LONG",
            GexLevel::StrongLong => "STRONG_LONG",
        }
    }
}

/// Liquidity regime from the global liquidity z-score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityState {
    InsufficientData,
    Neutral,
    /// z > 2
    Tsunami,
    /// 0 < z <= 2
    Expansion,
    /// -2 < z <= 0
    Contraction,
    /// z <= -2
    Drought,
}

impl LiquidityState {
    pub fn from_z(z: f64) -> Self {
        if z > 2.0 {
            LiquidityState::Tsunami
        } else if z > 0.0 {
            LiquidityState::Expansion
        } else if z > -2.0 {
            LiquidityState::Contraction
        } else {
            LiquidityState::Drought
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            LiquidityState::InsufficientData => "Insufficient data",
            LiquidityState::Neutral => "Normal operations",
            LiquidityState::Tsunami => "Go all-in on risk assets",
            LiquidityState::Expansion => "Normal operations",
            LiquidityState::Contraction => "Defensive mode, reduce positions",
            LiquidityState::Drought => "Cash is king",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityPulse {
    pub z_score: f64,
    pub state: LiquidityState,
}

/// Weighted liquidity composite
pub fn gli_composite(balance_sheet: f64, m2_yoy: f64) -> f64 {
    balance_sheet * 0.6 + m2_yoy * 0.4
}

/// Z-score of today's liquidity composite against its trailing history
pub fn calculate_liquidity_pulse(balance_sheet: f64, m2_yoy: f64, history: &[f64]) -> LiquidityPulse {
    if history.len() < 2 {
        return LiquidityPulse {
            z_score: 0.0,
            state: LiquidityState::InsufficientData,
        };
    }

    let std = stats::population_std(history);
    if std == 0.0 || !std.is_finite() {
        return LiquidityPulse {
            z_score: 0.0,
            state: LiquidityState::Neutral,
        };
    }

    let z_score = (gli_composite(balance_sheet, m2_yoy) - stats::mean(history)) / std;
    LiquidityPulse {
        z_score,
        state: LiquidityState::from_z(z_score),
    }
}
