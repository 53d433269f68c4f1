//! Retry decision: combines a classification with current usage.
//!
//! The decision chain is evaluated in order and the first disqualifying
//! step ends the chain. The recurring-failure check runs afterwards in
//! every case, overriding a positive verdict and adding its own reason.
//! Every reason that fired is kept so callers can show the whole rationale.

use serde::{Deserialize, Serialize};

use crate::classifier::Classification;
use crate::config::EngineConfig;
use crate::domain::Severity;
use crate::usage::UsageMetrics;

/// Outcome of a retry decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryVerdict {
    pub recommended: bool,
    /// Every reason that fired, in evaluation order.
    pub reasons: Vec<String>,
}

/// Named retry tunables.
///
/// The quota floor and cost multiplier are heuristics carried over as-is;
/// they have no derivation beyond operational experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub quota_floor_minutes: u64,
    pub cost_multiplier: u64,
    pub failure_rate_threshold: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            quota_floor_minutes: config.quota_floor_minutes,
            cost_multiplier: config.retry_cost_multiplier,
            failure_rate_threshold: config.failure_rate_threshold,
        }
    }

    /// Decide whether retrying the classified failure is worthwhile.
    pub fn decide(
        &self,
        classification: Option<&Classification>,
        metrics: &UsageMetrics,
    ) -> RetryVerdict {
        let mut reasons = Vec::new();
        let mut recommended = self.evaluate_chain(classification, metrics, &mut reasons);

        if metrics.failure_rate > self.failure_rate_threshold {
            recommended = false;
            reasons.push(format!(
                "Failure rate {}% exceeds {}%: investigate the recurring pattern instead of retrying",
                metrics.failure_rate, self.failure_rate_threshold
            ));
        }

        RetryVerdict {
            recommended,
            reasons,
        }
    }

    fn evaluate_chain(
        &self,
        classification: Option<&Classification>,
        metrics: &UsageMetrics,
        reasons: &mut Vec<String>,
    ) -> bool {
        let Some(classification) = classification else {
            reasons.push("No error classification available; manual investigation required".to_string());
            return false;
        };

        let remaining = metrics.minutes_remaining;
        if remaining < self.quota_floor_minutes as i64 {
            reasons.push(format!(
                "Only {remaining} build minutes remain (floor {}): quota critically low",
                self.quota_floor_minutes
            ));
            return false;
        }

        let cost = classification.category.estimated_cost_minutes;
        let needed = self.cost_multiplier.saturating_mul(cost);
        if remaining < needed as i64 {
            reasons.push(format!(
                "{remaining} build minutes remain but a safe retry needs {needed} ({}× the {cost}-minute estimate)",
                self.cost_multiplier
            ));
            return false;
        }

        let name = classification.category_name();
        match classification.severity() {
            Severity::Low | Severity::Medium => {
                reasons.push(format!(
                    "{name} is {} severity: likely transient or quickly fixable",
                    classification.severity()
                ));
                true
            }
            Severity::High if classification.is_transient() => {
                reasons.push(format!(
                    "{name} is high severity but usually transient: a retry often succeeds"
                ));
                true
            }
            Severity::High => {
                reasons.push(format!(
                    "{name} is high severity: requires a code change before retrying"
                ));
                false
            }
            Severity::Critical => {
                reasons.push(format!(
                    "{name} is critical: requires a code change before retrying"
                ));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ErrorClassifier;
    use crate::domain::{DeployState, DeploymentRecord};
    use chrono::{TimeZone, Utc};

    fn classify(state: DeployState, message: &str) -> Classification {
        let rec = DeploymentRecord::new(
            "d1",
            "s1",
            state,
            Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
        )
        .with_error(message);
        ErrorClassifier::new(&EngineConfig::default()).classify(&rec)
    }

    fn metrics(remaining: i64, failure_rate: u32) -> UsageMetrics {
        UsageMetrics {
            average_build_minutes: 2.0,
            minutes_used: (300 - remaining).max(0) as u64,
            minutes_remaining: remaining,
            failure_rate,
            monthly_quota: 300,
            window_size: 10,
            timed_deploys: 10,
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn test_no_classification() {
        let v = policy().decide(None, &metrics(200, 0));
        assert!(!v.recommended);
        assert_eq!(v.reasons.len(), 1);
        assert!(v.reasons[0].contains("manual investigation"));
    }

    #[test]
    fn test_quota_floor_overrides_every_severity() {
        let cases = [
            classify(DeployState::Error, "ESLint found 2 problems"), // medium
            classify(DeployState::Error, "npm ERR! peer dep conflict"), // high, transient
            classify(DeployState::Error, "TS2322: type mismatch"),    // high
            classify(DeployState::Error, "JavaScript heap out of memory"), // critical
            classify(DeployState::Stopped, ""),                       // timeout
        ];
        for c in &cases {
            let v = policy().decide(Some(c), &metrics(20, 0));
            assert!(!v.recommended, "{} should not retry", c.category_name());
            assert!(v.reasons[0].contains("quota critically low"));
        }
    }

    #[test]
    fn test_insufficient_budget_for_cost() {
        // Build Timeout estimates 15 minutes; 2× needs 30, floor is 30 too.
        let timeout = classify(DeployState::Stopped, "");
        let config = EngineConfig {
            quota_floor_minutes: 10,
            ..Default::default()
        };
        let v = RetryPolicy::new(&config).decide(Some(&timeout), &metrics(25, 0));
        assert!(!v.recommended);
        assert!(v.reasons[0].contains("needs 30"));
    }

    #[test]
    fn test_transient_high_retries() {
        let c = classify(DeployState::Error, "npm ERR! peer dep conflict");
        assert_eq!(c.category_name(), crate::rules::DEPENDENCY_CONFLICT);
        let v = policy().decide(Some(&c), &metrics(200, 10));
        assert!(v.recommended);
        assert_eq!(v.reasons.len(), 1);
    }

    #[test]
    fn test_non_transient_high_does_not_retry() {
        let c = classify(DeployState::Error, "TS2322: type mismatch");
        let v = policy().decide(Some(&c), &metrics(200, 10));
        assert!(!v.recommended);
        assert!(v.reasons[0].contains("code change"));
    }

    #[test]
    fn test_critical_never_retries() {
        let c = classify(DeployState::Error, "FATAL ERROR: JavaScript heap out of memory");
        let v = policy().decide(Some(&c), &metrics(300, 0));
        assert!(!v.recommended);
        assert!(v.reasons[0].contains("critical"));
    }

    #[test]
    fn test_medium_retries() {
        let c = classify(DeployState::Error, "something nobody has seen before");
        let v = policy().decide(Some(&c), &metrics(200, 0));
        assert!(v.recommended);
    }

    #[test]
    fn test_failure_rate_overrides_and_accumulates() {
        let c = classify(DeployState::Error, "npm ERR! peer dep conflict");
        let v = policy().decide(Some(&c), &metrics(200, 40));
        assert!(!v.recommended);
        assert_eq!(v.reasons.len(), 2);
        assert!(v.reasons[0].contains("usually transient"));
        assert!(v.reasons[1].contains("recurring pattern"));
    }

    #[test]
    fn test_failure_rate_added_after_disqualifier() {
        let v = policy().decide(None, &metrics(10, 90));
        assert!(!v.recommended);
        assert_eq!(v.reasons.len(), 2);
        assert!(v.reasons[0].contains("manual investigation"));
        assert!(v.reasons[1].contains("90%"));
    }

    #[test]
    fn test_failure_rate_at_threshold_is_fine() {
        let c = classify(DeployState::Error, "ECONNRESET");
        let v = policy().decide(Some(&c), &metrics(200, 30));
        assert!(v.recommended);
    }

    #[test]
    fn test_negative_remaining() {
        let c = classify(DeployState::Error, "ECONNRESET");
        let v = policy().decide(Some(&c), &metrics(-40, 0));
        assert!(!v.recommended);
        assert!(v.reasons[0].contains("-40"));
    }
}
