//! Engine configuration.
//!
//! Loaded once at startup (usually via [`EngineConfig::from_env`]) and handed
//! to [`crate::engine::DiagnosticsEngine::new`]. Immutable afterwards.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Result, SitewatchError};

/// Tunables for the content-impact heuristics.
///
/// These are fixed proxy ratios, not measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentHeuristics {
    /// Estimated KB of content per second of build time.
    pub kb_per_build_second: f64,

    /// Builds longer than this are assumed to process heavy images.
    pub image_heavy_build_secs: u64,

    /// Estimated unoptimized images per image-heavy build.
    pub images_per_heavy_build: u32,

    /// Builds finishing under this look incremental.
    pub incremental_build_max_secs: u64,

    /// Minimum timed builds before guessing about incremental builds.
    pub incremental_min_samples: usize,

    /// Commit-label keywords that mark a content deploy.
    pub content_keywords: Vec<String>,
}

impl Default for ContentHeuristics {
    fn default() -> Self {
        Self {
            kb_per_build_second: 2.5,
            image_heavy_build_secs: 120,
            images_per_heavy_build: 3,
            incremental_build_max_secs: 45,
            incremental_min_samples: 3,
            content_keywords: ["post", "blog", "article", "content", "publish", "draft", "page"]
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }
}

/// Configuration for the diagnostics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Build minutes included per calendar month.
    pub monthly_quota_minutes: u64,

    /// Below this many remaining minutes no retry is ever recommended.
    pub quota_floor_minutes: u64,

    /// A retry needs `multiplier × estimated cost` minutes left.
    pub retry_cost_multiplier: u64,

    /// Failure-rate percentage above which retries are withheld.
    pub failure_rate_threshold: u32,

    /// Error text longer than this is truncated in generated prompts.
    pub max_prompt_message_chars: usize,

    pub content: ContentHeuristics,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monthly_quota_minutes: 300,
            quota_floor_minutes: 30,
            retry_cost_multiplier: 2,
            failure_rate_threshold: 30,
            max_prompt_message_chars: 2000,
            content: ContentHeuristics::default(),
        }
    }
}

impl EngineConfig {
    /// Build a config from `SITEWATCH_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparsable ones are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (used by `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            monthly_quota_minutes: parse_or(
                &lookup,
                "SITEWATCH_MONTHLY_QUOTA",
                defaults.monthly_quota_minutes,
            ),
            quota_floor_minutes: parse_or(
                &lookup,
                "SITEWATCH_QUOTA_FLOOR",
                defaults.quota_floor_minutes,
            ),
            retry_cost_multiplier: parse_or(
                &lookup,
                "SITEWATCH_RETRY_COST_MULTIPLIER",
                defaults.retry_cost_multiplier,
            ),
            failure_rate_threshold: parse_or(
                &lookup,
                "SITEWATCH_FAILURE_RATE_THRESHOLD",
                defaults.failure_rate_threshold,
            ),
            ..defaults
        }
    }

    /// Reject configurations the engine cannot reason with.
    pub fn validate(&self) -> Result<()> {
        if self.monthly_quota_minutes == 0 {
            return Err(SitewatchError::InvalidConfig(
                "monthly quota must be positive".to_string(),
            ));
        }
        if self.retry_cost_multiplier == 0 {
            return Err(SitewatchError::InvalidConfig(
                "retry cost multiplier must be positive".to_string(),
            ));
        }
        if self.failure_rate_threshold > 100 {
            return Err(SitewatchError::InvalidConfig(format!(
                "failure rate threshold {} exceeds 100%",
                self.failure_rate_threshold
            )));
        }
        if self.content.kb_per_build_second < 0.0 {
            return Err(SitewatchError::InvalidConfig(
                "kb_per_build_second must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key = key, value = %raw, "ignoring unparsable config value");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.monthly_quota_minutes, 300);
        assert_eq!(config.quota_floor_minutes, 30);
        assert_eq!(config.retry_cost_multiplier, 2);
        assert_eq!(config.failure_rate_threshold, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SITEWATCH_MONTHLY_QUOTA", "1000"),
            ("SITEWATCH_QUOTA_FLOOR", " 50 "),
        ]
        .into_iter()
        .collect();
        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.monthly_quota_minutes, 1000);
        assert_eq!(config.quota_floor_minutes, 50);
        assert_eq!(config.retry_cost_multiplier, 2);
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = EngineConfig::from_lookup(|k| {
            (k == "SITEWATCH_FAILURE_RATE_THRESHOLD").then(|| "lots".to_string())
        });
        assert_eq!(config.failure_rate_threshold, 30);
    }

    #[test]
    fn test_validate_rejects_zero_quota() {
        let config = EngineConfig {
            monthly_quota_minutes: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("monthly quota"));
    }

    #[test]
    fn test_validate_rejects_threshold_over_100() {
        let config = EngineConfig {
            failure_rate_threshold: 101,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
