use super::{Alert, AlertLevel, EscalationPolicy, SeverityLadder};
use crate::risk::VixTier;

impl SeverityLadder for VixTier {
    const SUBJECT: &'static str = "VIX Tier";

    fn label(&self) -> &'static str {
        self.name()
    }

    fn code(&self) -> String {
        format!("VIX_{}", self.name())
    }

    fn alert_level(&self) -> AlertLevel {
        match self {
            VixTier::Tier3 => AlertLevel::Critical,
            VixTier::Tier2 => AlertLevel::Severe,
            VixTier::Tier0 | VixTier::Tier1 => AlertLevel::Warning,
        }
    }

    fn threshold(&self) -> f64 {
        match self {
            VixTier::Tier0 | VixTier::Tier1 => 20.0,
            VixTier::Tier2 => 25.0,
            VixTier::Tier3 => 35.0,
        }
    }

    fn action(&self) -> &'static str {
        self.description()
    }
}

/// Alerts when the VIX tier climbs
#[derive(Debug, Clone, Default)]
pub struct VixTierChangedPolicy {
    inner: EscalationPolicy<VixTier>,
}

impl VixTierChangedPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate an already-classified tier
    pub fn evaluate(&mut self, tier: VixTier, vix: f64) -> Option<Alert> {
        self.inner.evaluate(tier, vix)
    }

    /// Classify a raw VIX reading and evaluate it
    pub fn evaluate_vix(&mut self, vix: f64) -> Option<Alert> {
        self.evaluate(VixTier::from_vix(vix), vix)
    }

    pub fn previous(&self) -> Option<VixTier> {
        self.inner.previous()
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calm_to_tense_alerts_once() {
        let mut policy = VixTierChangedPolicy::new();
        assert!(policy.evaluate_vix(12.0).is_none());
        assert!(policy.evaluate_vix(13.0).is_none());

        let alert = policy.evaluate_vix(30.0).unwrap();
        assert_eq!(alert.code, "VIX_TIER_2");
        assert_eq!(alert.level, AlertLevel::Severe);
        assert_eq!(alert.message, "VIX Tier escalation: TIER_0 → TIER_2");
        assert_eq!(alert.threshold, 25.0);
        assert_eq!(alert.current_value, 30.0);
        assert_eq!(alert.action, VixTier::Tier2.description());
    }

    #[test]
    fn test_decline_is_silent() {
        let mut policy = VixTierChangedPolicy::new();
        policy.evaluate_vix(45.0);
        assert!(policy.evaluate_vix(20.0).is_none());
        assert_eq!(policy.previous(), Some(VixTier::Tier1));

        let alert = policy.evaluate_vix(45.0).unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(alert.code, "VIX_TIER_3");
    }
}
