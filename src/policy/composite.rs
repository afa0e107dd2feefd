use super::{Alert, AlertLevel};
use crate::risk::{GexLevel, VixTier};

/// VIX level behind the composite alert threshold (Tier 2 floor)
pub const COMPOSITE_VIX_THRESHOLD: f64 = 25.0;

/// Alerts when elevated fear meets short dealer gamma
///
/// Fires once on the transition into the risky state; stays quiet while the
/// condition holds and re-arms silently once it clears.
#[derive(Debug, Clone, Default)]
pub struct CompositeRiskPolicy {
    previous_triggered: bool,
}

impl CompositeRiskPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_triggered(&self) -> bool {
        self.previous_triggered
    }

    pub fn evaluate(
        &mut self,
        tier: VixTier,
        gex_level: GexLevel,
        vix: f64,
        gex: f64,
    ) -> Option<Alert> {
        let triggered = tier.is_risky() && gex_level.is_short();
        let was_triggered = std::mem::replace(&mut self.previous_triggered, triggered);
        if !triggered || was_triggered {
            return None;
        }

        let extreme_vix = tier == VixTier::Tier3;
        let extreme_gex = gex_level == GexLevel::StrongShort;
        let (level, action) = match (extreme_vix, extreme_gex) {
            (true, true) => (
                AlertLevel::Critical,
                "Cut 50%+ immediately, activate defensive mode",
            ),
            (true, false) => (
                AlertLevel::Severe,
                "Emergency cut 50%+, GEX short amplifies risk",
            ),
            (false, true) => (AlertLevel::Severe, "Cut 30%, watch gamma squeeze risk"),
            (false, false) => (AlertLevel::Warning, "Cut 20-30%, raise alert"),
        };

        let alert = Alert {
            code: "COMPOSITE_RISK".to_string(),
            level,
            message: format!(
                "Composite risk: VIX {} + GEX {}",
                tier.name(),
                gex_level.name()
            ),
            current_value: vix,
            threshold: COMPOSITE_VIX_THRESHOLD,
            action: action.to_string(),
            secondary_value: Some(gex),
        };

        tracing::info!(level = ?alert.level, vix, gex, "{}", alert.message);
        Some(alert)
    }

    pub fn reset(&mut self) {
        self.previous_triggered = false;
    }
}
