//! Content-impact estimation from deployment history.
//!
//! Everything here is an **estimate**. Build duration stands in for content
//! size and image weight, and commit labels stand in for authoring activity.
//! The ratios come from [`ContentHeuristics`] and are fixed tunables.

use serde::Serialize;

use crate::config::{ContentHeuristics, EngineConfig};
use crate::domain::{DeployState, DeploymentRecord};

/// Estimated content-authoring metrics for a deployment window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentMetrics {
    pub estimated_post_count: usize,
    pub estimated_avg_post_size_kb: f64,
    pub estimated_image_opportunities: u32,
    pub avg_build_minutes_per_post: f64,
    pub incremental_builds_likely: bool,
    /// True when no deploy had a commit label and every successful deploy
    /// was assumed to carry content.
    pub labels_missing: bool,
    pub recommendations: Vec<String>,
}

/// Applies [`ContentHeuristics`] to a deployment window.
#[derive(Debug, Clone)]
pub struct ContentImpactEstimator {
    heuristics: ContentHeuristics,
}

impl ContentImpactEstimator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            heuristics: config.content.clone(),
        }
    }

    pub fn estimate(&self, records: &[DeploymentRecord]) -> ContentMetrics {
        let h = &self.heuristics;
        let ready: Vec<&DeploymentRecord> = records
            .iter()
            .filter(|r| r.state == DeployState::Ready)
            .collect();

        let labels_missing = records.iter().all(|r| r.title.is_none());
        let content: Vec<&DeploymentRecord> = if labels_missing {
            ready.clone()
        } else {
            ready
                .iter()
                .copied()
                .filter(|r| self.is_content_label(r.title.as_deref()))
                .collect()
        };

        let post_count = content.len();
        let timed: Vec<u64> = content.iter().filter_map(|r| r.deploy_time).collect();
        let avg_size_kb = if timed.is_empty() {
            0.0
        } else {
            let mean_secs = timed.iter().sum::<u64>() as f64 / timed.len() as f64;
            mean_secs * h.kb_per_build_second
        };

        let heavy_builds = timed
            .iter()
            .filter(|secs| **secs > h.image_heavy_build_secs)
            .count() as u32;
        let image_opportunities = heavy_builds.saturating_mul(h.images_per_heavy_build);

        let minutes_per_post = if post_count == 0 {
            0.0
        } else {
            let total: u64 = content.iter().map(|r| r.billed_minutes()).sum();
            total as f64 / post_count as f64
        };

        let ready_timed: Vec<u64> = ready.iter().filter_map(|r| r.deploy_time).collect();
        let incremental = ready_timed.len() >= h.incremental_min_samples
            && ready_timed
                .iter()
                .filter(|secs| **secs < h.incremental_build_max_secs)
                .count()
                * 2
                >= ready_timed.len();

        let mut metrics = ContentMetrics {
            estimated_post_count: post_count,
            estimated_avg_post_size_kb: avg_size_kb,
            estimated_image_opportunities: image_opportunities,
            avg_build_minutes_per_post: minutes_per_post,
            incremental_builds_likely: incremental,
            labels_missing,
            recommendations: Vec::new(),
        };
        metrics.recommendations = recommendations(&metrics, h);
        metrics
    }

    fn is_content_label(&self, title: Option<&str>) -> bool {
        let Some(title) = title else {
            return false;
        };
        let lowered = title.to_lowercase();
        self.heuristics
            .content_keywords
            .iter()
            .any(|k| lowered.contains(k.as_str()))
    }
}

fn recommendations(m: &ContentMetrics, h: &ContentHeuristics) -> Vec<String> {
    let mut out = Vec::new();
    if m.estimated_image_opportunities > 0 {
        out.push(format!(
            "An estimated {} images could be optimized: builds over {}s usually process unoptimized images",
            m.estimated_image_opportunities, h.image_heavy_build_secs
        ));
    }
    if !m.incremental_builds_likely && m.estimated_post_count > 0 {
        out.push(
            "Incremental builds do not appear to be configured; enable build caching so new posts do not rebuild the whole site"
                .to_string(),
        );
    }
    if m.avg_build_minutes_per_post >= 3.0 {
        out.push(format!(
            "Each post costs an estimated {:.1} build minutes; batch content updates into fewer deploys",
            m.avg_build_minutes_per_post
        ));
    }
    if m.labels_missing && m.estimated_post_count > 0 {
        out.push(
            "Commit labels were unavailable, so every successful deploy was counted as content".to_string(),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rec(id: &str, state: DeployState, title: Option<&str>, secs: Option<u64>) -> DeploymentRecord {
        let mut r = DeploymentRecord::new(
            id,
            "site",
            state,
            Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
        );
        r.title = title.map(str::to_string);
        r.deploy_time = secs;
        r
    }

    fn estimator() -> ContentImpactEstimator {
        ContentImpactEstimator::new(&EngineConfig::default())
    }

    #[test]
    fn test_empty_window() {
        let m = estimator().estimate(&[]);
        assert_eq!(m.estimated_post_count, 0);
        assert_eq!(m.estimated_avg_post_size_kb, 0.0);
        assert_eq!(m.avg_build_minutes_per_post, 0.0);
        assert!(!m.incremental_builds_likely);
        assert!(m.recommendations.is_empty());
    }

    #[test]
    fn test_content_labels_select_posts() {
        let records = vec![
            rec("a", DeployState::Ready, Some("New blog post: launch"), Some(100)),
            rec("b", DeployState::Ready, Some("Fix header styles"), Some(40)),
            rec("c", DeployState::Ready, Some("Publish March article"), Some(140)),
            rec("d", DeployState::Error, Some("Draft post"), Some(10)),
        ];
        let m = estimator().estimate(&records);
        assert_eq!(m.estimated_post_count, 2);
        assert!(!m.labels_missing);
        // mean 120s × 2.5 KB/s
        assert_eq!(m.estimated_avg_post_size_kb, 300.0);
        // only the 140s build is over 120s → 1 × 3 images
        assert_eq!(m.estimated_image_opportunities, 3);
        // ceil(100/60)=2, ceil(140/60)=3 → 2.5 per post
        assert_eq!(m.avg_build_minutes_per_post, 2.5);
    }

    #[test]
    fn test_missing_labels_count_every_ready_deploy() {
        let records = vec![
            rec("a", DeployState::Ready, None, Some(30)),
            rec("b", DeployState::Ready, None, None),
            rec("c", DeployState::Error, None, Some(30)),
        ];
        let m = estimator().estimate(&records);
        assert!(m.labels_missing);
        assert_eq!(m.estimated_post_count, 2);
        assert!(m
            .recommendations
            .iter()
            .any(|r| r.contains("Commit labels were unavailable")));
    }

    #[test]
    fn test_incremental_builds_detection() {
        let fast: Vec<DeploymentRecord> = (0..4)
            .map(|i| rec(&format!("f{i}"), DeployState::Ready, Some("post"), Some(20)))
            .collect();
        assert!(estimator().estimate(&fast).incremental_builds_likely);

        let slow: Vec<DeploymentRecord> = (0..4)
            .map(|i| rec(&format!("s{i}"), DeployState::Ready, Some("post"), Some(300)))
            .collect();
        let m = estimator().estimate(&slow);
        assert!(!m.incremental_builds_likely);
        assert!(m
            .recommendations
            .iter()
            .any(|r| r.contains("Incremental builds do not appear")));

        let too_few = vec![rec("x", DeployState::Ready, Some("post"), Some(5))];
        assert!(!estimator().estimate(&too_few).incremental_builds_likely);
    }

    #[test]
    fn test_recommendations_say_estimated() {
        let records: Vec<DeploymentRecord> = (0..3)
            .map(|i| rec(&format!("h{i}"), DeployState::Ready, Some("blog"), Some(400)))
            .collect();
        let m = estimator().estimate(&records);
        assert_eq!(m.estimated_image_opportunities, 9);
        assert!(m.recommendations.iter().all(|r| !r.contains("measured")));
        assert!(m.recommendations[0].contains("estimated"));
    }
}
