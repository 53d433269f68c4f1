//! Structured observability hooks for diagnostics events.
//!
//! - `DeploySpan`: RAII guard tagging everything inside it with a deploy id
//! - `emit_*`: one `info!` event per engine or tool step
//!
//! Set `RUST_LOG=sitewatch=debug` for more detail, `--json` for JSON lines.

use tracing::{info, warn};

use crate::classifier::Classification;
use crate::retry::RetryVerdict;
use crate::usage::UsageMetrics;

/// RAII guard that enters a deploy-scoped tracing span.
///
/// ```ignore
/// let _span = DeploySpan::enter("64f1c0ffee");
/// // tracing calls now carry deploy_id = "64f1c0ffee"
/// ```
pub struct DeploySpan {
    _span: tracing::span::EnteredSpan,
}

impl DeploySpan {
    pub fn enter(deploy_id: &str) -> Self {
        let span = tracing::info_span!("sitewatch.deploy", deploy_id = %deploy_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_deploy_classified(c: &Classification) {
    info!(
        event = "deploy.classified",
        deploy_id = %c.deploy_id,
        category = c.category_name(),
        severity = c.severity().as_str(),
        rule_id = c.rule_id.unwrap_or("-"),
        basis = ?c.basis,
    );
}

pub fn emit_retry_decided(deploy_id: Option<&str>, verdict: &RetryVerdict) {
    info!(
        event = "retry.decided",
        deploy_id = deploy_id.unwrap_or("-"),
        recommended = verdict.recommended,
        reasons = verdict.reasons.len(),
    );
}

pub fn emit_usage_aggregated(m: &UsageMetrics) {
    info!(
        event = "usage.aggregated",
        window = m.window_size,
        minutes_used = m.minutes_used,
        minutes_remaining = m.minutes_remaining,
        failure_rate = m.failure_rate,
    );
}

pub fn emit_tool_called(tool: &str, duration_ms: u64) {
    info!(event = "tool.called", tool = %tool, duration_ms = duration_ms);
}

/// Tool failure (warning level).
pub fn emit_tool_failed(tool: &str, error: &dyn std::fmt::Display) {
    warn!(event = "tool.failed", tool = %tool, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_span_create() {
        let _span = DeploySpan::enter("test-deploy-id");
    }

    #[test]
    fn test_emit_without_subscriber() {
        emit_tool_called("list_sites", 3);
        emit_tool_failed("list_sites", &"boom");
        emit_retry_decided(
            None,
            &RetryVerdict {
                recommended: false,
                reasons: vec!["x".into()],
            },
        );
    }
}
