use super::{Alert, AlertLevel, EscalationPolicy, SeverityLadder};
use crate::vpin::VpinLevel;

/// VPIN at which the alert ladder reaches Elevated
pub const VPIN_ALERT_ELEVATED: f64 = 0.75;
/// VPIN at which the alert ladder reaches High
pub const VPIN_ALERT_HIGH: f64 = 0.85;
/// VPIN at which the alert ladder reaches Critical
pub const VPIN_ALERT_CRITICAL: f64 = 0.95;

/// Alert-ladder level for a raw VPIN value
///
/// Stricter than [`crate::vpin::classify_vpin`]: alerts are reserved for
/// toxicity well past the trading-action bands.
fn alert_level_for(vpin: f64) -> VpinLevel {
    if vpin >= VPIN_ALERT_CRITICAL {
        VpinLevel::Critical
    } else if vpin >= VPIN_ALERT_HIGH {
        VpinLevel::High
    } else if vpin >= VPIN_ALERT_ELEVATED {
        VpinLevel::Elevated
    } else {
        VpinLevel::Normal
    }
}

impl SeverityLadder for VpinLevel {
    const SUBJECT: &'static str = "VPIN";

    fn label(&self) -> &'static str {
        self.name()
    }

    fn code(&self) -> String {
        format!("VPIN_{}", self.name())
    }

    fn alert_level(&self) -> AlertLevel {
        match self {
            VpinLevel::Normal => AlertLevel::Info,
            VpinLevel::Elevated => AlertLevel::Warning,
            VpinLevel::High => AlertLevel::Severe,
            VpinLevel::Critical => AlertLevel::Critical,
        }
    }

    fn threshold(&self) -> f64 {
        match self {
            VpinLevel::Normal | VpinLevel::Elevated => VPIN_ALERT_ELEVATED,
            VpinLevel::High => VPIN_ALERT_HIGH,
            VpinLevel::Critical => VPIN_ALERT_CRITICAL,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            VpinLevel::Normal => "No action",
            VpinLevel::Elevated => "Watch market volatility",
            VpinLevel::High => "Reduce new positions",
            VpinLevel::Critical => "Consider reducing or hedging",
        }
    }
}

/// Alerts when order-flow toxicity crosses a higher VPIN band
#[derive(Debug, Clone, Default)]
pub struct VpinExceededPolicy {
    inner: EscalationPolicy<VpinLevel>,
}

impl VpinExceededPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&mut self, vpin: f64) -> Option<Alert> {
        self.inner.evaluate(alert_level_for(vpin), vpin)
    }

    pub fn previous(&self) -> Option<VpinLevel> {
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
    fn test_alert_bands() {
        assert_eq!(alert_level_for(0.5), VpinLevel::Normal);
        assert_eq!(alert_level_for(0.75), VpinLevel::Elevated);
        assert_eq!(alert_level_for(0.9), VpinLevel::High);
        assert_eq!(alert_level_for(0.99), VpinLevel::Critical);
    }

    #[test]
    fn test_escalation_sequence() {
        let mut policy = VpinExceededPolicy::new();
        assert!(policy.evaluate(0.3).is_none());
        // Inside the same band: no alert
        assert!(policy.evaluate(0.6).is_none());

        let alert = policy.evaluate(0.88).unwrap();
        assert_eq!(alert.code, "VPIN_HIGH");
        assert_eq!(alert.level, AlertLevel::Severe);
        assert_eq!(alert.threshold, VPIN_ALERT_HIGH);
        assert_eq!(alert.action, "Reduce new positions");

        assert!(policy.evaluate(0.8).is_none());
        let alert = policy.evaluate(0.97).unwrap();
        assert_eq!(alert.message, "VPIN escalation: ELEVATED → CRITICAL");
    }
}
