//! Escalation-only alert policies
//!
//! Each policy remembers the last severity it saw and emits an [`Alert`]
//! only when severity strictly increases. Repeated readings at the same or a
//! lower level are absorbed, which keeps a noisy indicator from flooding the
//! alert channel. [`EscalationPolicy::reset`] forgets the remembered level.
//!
//! Policies are single-owner state machines (`&mut self`); callers sharing
//! one across threads wrap it in a `Mutex`.

mod composite;
mod vix_tier;
mod vpin;

pub use composite::CompositeRiskPolicy;
pub use vix_tier::VixTierChangedPolicy;
pub use vpin::{VpinExceededPolicy, VPIN_ALERT_CRITICAL, VPIN_ALERT_ELEVATED, VPIN_ALERT_HIGH};

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Info,
    Warning,
    Severe,
    Critical,
}

/// Alert emitted on a severity increase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub code: String,
    pub level: AlertLevel,
    pub message: String,
    pub current_value: f64,
    pub threshold: f64,
    pub action: String,
    /// Second reading behind a composite alert (GEX for composite risk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_value: Option<f64>,
}

/// Ordered severity ladder a policy escalates along
///
/// `Ord` defines the rank: a higher variant is more severe.
pub trait SeverityLadder: Copy + Ord + Debug {
    /// Subject named in the alert message, e.g. "VIX Tier"
    const SUBJECT: &'static str;

    fn label(&self) -> &'static str;
    fn code(&self) -> String;
    fn alert_level(&self) -> AlertLevel;
    fn threshold(&self) -> f64;
    fn action(&self) -> &'static str;
}

/// Generic escalation-only policy over a severity ladder
#[derive(Debug, Clone)]
pub struct EscalationPolicy<L: SeverityLadder> {
    previous: Option<L>,
}

impl<L: SeverityLadder> Default for EscalationPolicy<L> {
    fn default() -> Self {
        Self { previous: None }
    }
}

impl<L: SeverityLadder> EscalationPolicy<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level seen, if any
    pub fn previous(&self) -> Option<L> {
        self.previous
    }

    /// Record `current` and return an alert if it ranks above the previous level
    pub fn evaluate(&mut self, current: L, value: f64) -> Option<Alert> {
        let previous = self.previous.replace(current)?;
        if current <= previous {
            return None;
        }

        let alert = Alert {
            code: current.code(),
            level: current.alert_level(),
            message: format!(
                "{} escalation: {} → {}",
                L::SUBJECT,
                previous.label(),
                current.label()
            ),
            current_value: value,
            threshold: current.threshold(),
            action: current.action().to_string(),
            secondary_value: None,
        };

        tracing::info!(
            code = %alert.code,
            level = ?alert.level,
            value,
            "{}",
            alert.message
        );

        Some(alert)
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Ladder {
        Low,
        Mid,
        High,
    }

    impl SeverityLadder for Ladder {
        const SUBJECT: &'static str = "Test";

        fn label(&self) -> &'static str {
            match self {
                Ladder::Low => "LOW",
                Ladder::Mid => "MID",
                Ladder::High => "HIGH",
            }
        }

        fn code(&self) -> String {
            format!("TEST_{}", self.label())
        }

        fn alert_level(&self) -> AlertLevel {
            match self {
                Ladder::Low => AlertLevel::Info,
                Ladder::Mid => AlertLevel::Warning,
                Ladder::High => AlertLevel::Critical,
            }
        }

        fn threshold(&self) -> f64 {
            1.0
        }

        fn action(&self) -> &'static str {
            "act"
        }
    }

    #[test]
    fn test_first_observation_is_silent() {
        let mut policy = EscalationPolicy::new();
        assert!(policy.evaluate(Ladder::High, 1.0).is_none());
        assert_eq!(policy.previous(), Some(Ladder::High));
    }

    #[test]
    fn test_only_strict_increase_alerts() {
        let mut policy = EscalationPolicy::new();
        let sequence = [
            Ladder::Low,
            Ladder::Low,
            Ladder::Mid,
            Ladder::Low,
            Ladder::Mid,
            Ladder::High,
            Ladder::High,
        ];
        let alerts: Vec<Alert> = sequence
            .iter()
            .filter_map(|&level| policy.evaluate(level, 0.0))
            .collect();

        // Low->Mid, Low->Mid, Mid->High
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[2].message, "Test escalation: MID → HIGH");
        assert_eq!(alerts[2].level, AlertLevel::Critical);
    }

    #[test]
    fn test_reset_forgets_level() {
        let mut policy = EscalationPolicy::new();
        policy.evaluate(Ladder::Low, 0.0);
        policy.reset();
        assert!(policy.previous().is_none());
        assert!(policy.evaluate(Ladder::High, 0.0).is_none());
    }

    #[test]
    fn test_alert_level_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&AlertLevel::Critical).unwrap(),
            "\"CRITICAL\""
        );
    }
}
