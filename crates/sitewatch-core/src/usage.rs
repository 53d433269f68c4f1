//! Build-usage metrics over a window of deployments.
//!
//! Pure reduction of a deployment window into [`UsageMetrics`]. An empty
//! window yields zeroed metrics: a brand-new site has no history, which is
//! a valid state rather than an error.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::domain::{DeployState, DeploymentRecord};

/// Usage and performance statistics for a deployment window.
///
/// # Invariants
///
/// `minutes_remaining == monthly_quota - minutes_used` (negative when over
/// quota) and `0 <= failure_rate <= 100`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageMetrics {
    /// Mean wall-clock build time in minutes over deploys with both
    /// timestamps. `0.0` when none qualify.
    pub average_build_minutes: f64,

    /// Billed build minutes of deploys created this calendar month.
    pub minutes_used: u64,

    /// Quota left this month; negative when over quota.
    pub minutes_remaining: i64,

    /// Percentage of deploys in the window whose state is `error`.
    pub failure_rate: u32,

    pub monthly_quota: u64,

    /// Number of deploys the metrics were computed from.
    pub window_size: usize,

    /// Deploys that contributed to the average duration.
    pub timed_deploys: usize,
}

impl UsageMetrics {
    pub fn is_over_quota(&self) -> bool {
        self.minutes_remaining < 0
    }
}

/// Computes [`UsageMetrics`] against a fixed monthly quota.
#[derive(Debug, Clone)]
pub struct UsageAggregator {
    monthly_quota: u64,
}

impl UsageAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            monthly_quota: config.monthly_quota_minutes,
        }
    }

    /// Aggregate `records`, treating the month containing `now` as current.
    pub fn aggregate(&self, records: &[DeploymentRecord], now: DateTime<Utc>) -> UsageMetrics {
        let durations: Vec<f64> = records
            .iter()
            .filter_map(DeploymentRecord::build_duration_minutes)
            .collect();
        let average_build_minutes = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<f64>() / durations.len() as f64
        };

        let minutes_used: u64 = records
            .iter()
            .filter(|r| same_month(r.created_at, now))
            .map(DeploymentRecord::billed_minutes)
            .sum();

        let failures = records
            .iter()
            .filter(|r| r.state == DeployState::Error)
            .count();

        UsageMetrics {
            average_build_minutes,
            minutes_used,
            minutes_remaining: self.monthly_quota as i64 - minutes_used as i64,
            failure_rate: percentage(failures, records.len()),
            monthly_quota: self.monthly_quota,
            window_size: records.len(),
            timed_deploys: durations.len(),
        }
    }
}

fn same_month(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    at.year() == now.year() && at.month() == now.month()
}

/// `round(100 * part / total)`, `0` when `total == 0`.
fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 * 100.0) / total as f64).round() as u32
}
