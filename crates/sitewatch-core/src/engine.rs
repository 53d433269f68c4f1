//! Diagnostics engine: one entry point over the classifier, the usage
//! aggregator, the retry policy and the content-impact estimator.
//!
//! All operations are synchronous over already-fetched data. Each call
//! emits its `obs` event and bumps the matching [`METRICS`] counter.

use chrono::{DateTime, Utc};

use crate::classifier::{Classification, ErrorClassifier};
use crate::config::EngineConfig;
use crate::content_impact::{ContentImpactEstimator, ContentMetrics};
use crate::domain::DeploymentRecord;
use crate::metrics::METRICS;
use crate::obs;
use crate::retry::{RetryPolicy, RetryVerdict};
use crate::usage::{UsageAggregator, UsageMetrics};

#[derive(Debug, Clone)]
pub struct DiagnosticsEngine {
    config: EngineConfig,
    classifier: ErrorClassifier,
    aggregator: UsageAggregator,
    policy: RetryPolicy,
    estimator: ContentImpactEstimator,
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DiagnosticsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            classifier: ErrorClassifier::new(&config),
            aggregator: UsageAggregator::new(&config),
            policy: RetryPolicy::new(&config),
            estimator: ContentImpactEstimator::new(&config),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify a deployment from its own error message.
    pub fn classify_error(&self, record: &DeploymentRecord) -> Classification {
        let _span = obs::DeploySpan::enter(&record.id);
        self.record_classification(self.classifier.classify(record))
    }

    /// Classify a deployment from `message` (e.g. the best line of its log)
    /// instead of the record's own message.
    pub fn classify_error_with_message(
        &self,
        record: &DeploymentRecord,
        message: Option<&str>,
    ) -> Classification {
        let _span = obs::DeploySpan::enter(&record.id);
        self.record_classification(self.classifier.classify_with_message(record, message))
    }

    /// Aggregate usage with the current calendar month taken from the clock.
    pub fn aggregate_metrics(&self, records: &[DeploymentRecord]) -> UsageMetrics {
        self.aggregate_metrics_at(records, Utc::now())
    }

    pub fn aggregate_metrics_at(
        &self,
        records: &[DeploymentRecord],
        now: DateTime<Utc>,
    ) -> UsageMetrics {
        let metrics = self.aggregator.aggregate(records, now);
        obs::emit_usage_aggregated(&metrics);
        metrics
    }

    pub fn decide_retry(
        &self,
        classification: Option<&Classification>,
        metrics: &UsageMetrics,
    ) -> RetryVerdict {
        let verdict = self.policy.decide(classification, metrics);
        METRICS.inc_retry_decisions(verdict.recommended);
        obs::emit_retry_decided(classification.map(|c| c.deploy_id.as_str()), &verdict);
        verdict
    }

    pub fn estimate_content_impact(&self, records: &[DeploymentRecord]) -> ContentMetrics {
        let metrics = self.estimator.estimate(records);
        tracing::debug!(
            posts = metrics.estimated_post_count,
            recommendations = metrics.recommendations.len(),
            "content impact estimated"
        );
        metrics
    }

    fn record_classification(&self, c: Classification) -> Classification {
        METRICS.inc_classifications(c.requires_manual_investigation());
        obs::emit_deploy_classified(&c);
        c
    }
}
