//! Sitewatch core library
//!
//! Deployment diagnostics for static-site hosting: error classification,
//! build-usage metrics, retry decisions and content-impact estimates over
//! deployment records fetched elsewhere.

pub mod build_logs;
pub mod classifier;
pub mod config;
pub mod content_impact;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod metrics;
pub mod obs;
pub mod retry;
pub mod rules;
pub mod telemetry;
pub mod usage;

pub use build_logs::{summarize_logs, LogSummary};
pub use classifier::{categorize, Classification, ClassificationBasis, ErrorClassifier};
pub use config::{ContentHeuristics, EngineConfig};
pub use content_impact::{ContentImpactEstimator, ContentMetrics};
pub use domain::{
    DeployState, DeploymentRecord, LogLevel, LogLine, Result, Severity, Site, SitewatchError,
};
pub use engine::DiagnosticsEngine;
pub use fingerprint::{fingerprint, normalize, recurring_failures, RecurringFailure};
pub use retry::{RetryPolicy, RetryVerdict};
pub use rules::{Category, ErrorRule};
pub use telemetry::init_tracing;
pub use usage::{UsageAggregator, UsageMetrics};

/// Sitewatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
