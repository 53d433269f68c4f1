//! Tool registry and dispatch.
//!
//! Each tool fetches what it needs through the [`HostingProvider`], runs the
//! diagnostics engine over it and renders a markdown report.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use sitewatch_client::{ClientError, HostingProvider};
use sitewatch_core::{recurring_failures, summarize_logs, DeployState, DiagnosticsEngine};
use tracing::{info_span, warn, Instrument};

use crate::protocol::ToolDefinition;
use crate::report;

pub const LIST_DEPLOYMENTS_DEFAULT_LIMIT: usize = 10;
pub const USAGE_DEFAULT_LIMIT: usize = 50;
pub const RETRY_DEFAULT_LIMIT: usize = 20;
pub const CONTENT_DEFAULT_LIMIT: usize = 30;

/// Errors raised by tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("hosting provider request failed: {0}")]
    Upstream(#[from] ClientError),
}

impl ToolError {
    /// Whether the caller sent something malformed, as opposed to the tool
    /// failing while running.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_)
                | Self::InvalidArguments(_)
                | Self::Upstream(ClientError::InvalidId(_))
        )
    }
}

#[derive(Debug, Deserialize)]
struct SiteArgs {
    site_id: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DeployArgs {
    deploy_id: String,
    #[serde(default)]
    limit: Option<usize>,
}

/// The tool set, bound to a provider and an engine.
#[derive(Clone)]
pub struct SitewatchTools {
    provider: Arc<dyn HostingProvider>,
    engine: DiagnosticsEngine,
}

impl SitewatchTools {
    pub fn new(provider: Arc<dyn HostingProvider>, engine: DiagnosticsEngine) -> Self {
        Self { provider, engine }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        tool_definitions()
    }

    /// Run tool `name` with JSON `arguments`, returning its report.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        self.dispatch(name, arguments)
            .instrument(info_span!("sitewatch.tool", tool = %name))
            .await
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        match name {
            "list_sites" => self.list_sites().await,
            "list_deployments" => {
                let args: SiteArgs = parse_args(arguments)?;
                let limit = limit_or(args.limit, LIST_DEPLOYMENTS_DEFAULT_LIMIT)?;
                self.list_deployments(&args.site_id, limit).await
            }
            "diagnose_deployment" => {
                let args: DeployArgs = parse_args(arguments)?;
                self.diagnose_deployment(&args.deploy_id).await
            }
            "analyze_build_usage" => {
                let args: SiteArgs = parse_args(arguments)?;
                let limit = limit_or(args.limit, USAGE_DEFAULT_LIMIT)?;
                self.analyze_build_usage(&args.site_id, limit).await
            }
            "recommend_retry" => {
                let args: DeployArgs = parse_args(arguments)?;
                let limit = limit_or(args.limit, RETRY_DEFAULT_LIMIT)?;
                self.recommend_retry(&args.deploy_id, limit).await
            }
            "content_optimization_report" => {
                let args: SiteArgs = parse_args(arguments)?;
                let limit = limit_or(args.limit, CONTENT_DEFAULT_LIMIT)?;
                self.content_optimization_report(&args.site_id, limit).await
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn list_sites(&self) -> Result<String, ToolError> {
        let sites = self.provider.list_sites().await?;
        Ok(report::render_sites(&sites))
    }

    async fn list_deployments(&self, site_id: &str, limit: usize) -> Result<String, ToolError> {
        let deploys = self.provider.list_deployments(site_id, limit).await?;
        Ok(report::render_deployments(site_id, &deploys))
    }

    async fn diagnose_deployment(&self, deploy_id: &str) -> Result<String, ToolError> {
        let (record, logs) = futures::join!(
            self.provider.get_deployment(deploy_id),
            self.provider.get_build_logs(deploy_id)
        );
        let record = record?;
        if record.state == DeployState::Ready {
            return Ok(report::render_ready_deploy(&record));
        }

        let (lines, log_error) = match logs {
            Ok(lines) => (lines, None),
            Err(e) => {
                warn!(deploy_id = %deploy_id, error = %e, "build log unavailable");
                (Vec::new(), Some(e.to_string()))
            }
        };
        let summary = summarize_logs(&lines);
        let message = record.meaningful_error().or(summary.best_error_text());
        let classification = self.engine.classify_error_with_message(&record, message);

        Ok(report::render_diagnosis(
            &record,
            &summary,
            log_error.as_deref(),
            &classification,
        ))
    }

    async fn analyze_build_usage(&self, site_id: &str, limit: usize) -> Result<String, ToolError> {
        let deploys = self.provider.list_deployments(site_id, limit).await?;
        let metrics = self.engine.aggregate_metrics(&deploys);
        let recurring = recurring_failures(&deploys);
        Ok(report::render_usage(site_id, &metrics, &recurring))
    }

    async fn recommend_retry(&self, deploy_id: &str, limit: usize) -> Result<String, ToolError> {
        let record = self.provider.get_deployment(deploy_id).await?;

        if record.state == DeployState::Ready {
            return Ok(report::render_retry_not_applicable(
                &record,
                "The deploy already succeeded; there is nothing to retry.",
            ));
        }
        if !record.state.is_terminal() {
            return Ok(report::render_retry_not_applicable(
                &record,
                &format!(
                    "The deploy has not finished (state: {}); wait for it before deciding on a retry.",
                    record.state
                ),
            ));
        }

        let (window, logs) = futures::join!(
            self.provider.list_deployments(&record.site_id, limit),
            self.provider.get_build_logs(deploy_id)
        );
        let window = window?;
        let lines = logs.unwrap_or_else(|e| {
            warn!(deploy_id = %deploy_id, error = %e, "build log unavailable");
            Vec::new()
        });
        let summary = summarize_logs(&lines);
        let message = record.meaningful_error().or(summary.best_error_text());

        let classification = self.engine.classify_error_with_message(&record, message);
        let metrics = self.engine.aggregate_metrics(&window);
        let verdict = self.engine.decide_retry(Some(&classification), &metrics);

        Ok(report::render_retry(&record, &classification, &metrics, &verdict))
    }

    async fn content_optimization_report(
        &self,
        site_id: &str,
        limit: usize,
    ) -> Result<String, ToolError> {
        let deploys = self.provider.list_deployments(site_id, limit).await?;
        let metrics = self.engine.estimate_content_impact(&deploys);
        Ok(report::render_content(site_id, &metrics))
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn limit_or(limit: Option<usize>, default: usize) -> Result<usize, ToolError> {
    match limit {
        Some(0) => Err(ToolError::InvalidArguments(
            "limit must be at least 1".to_string(),
        )),
        Some(n) => Ok(n),
        None => Ok(default),
    }
}

/// Definitions advertised by `tools/list`.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let site_schema = |default_limit: usize| {
        json!({
            "type": "object",
            "properties": {
                "site_id": {"type": "string", "description": "Site id"},
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "default": default_limit,
                    "description": "Number of recent deploys to analyze"
                }
            },
            "required": ["site_id"]
        })
    };
    let deploy_schema = |with_limit: bool| {
        let mut properties = json!({
            "deploy_id": {"type": "string", "description": "Deploy id"}
        });
        if with_limit {
            properties["limit"] = json!({
                "type": "integer",
                "minimum": 1,
                "default": RETRY_DEFAULT_LIMIT,
                "description": "Number of recent site deploys used for usage metrics"
            });
        }
        json!({"type": "object", "properties": properties, "required": ["deploy_id"]})
    };

    vec![
        ToolDefinition {
            name: "list_sites",
            description: "List the sites visible to the configured token",
            input_schema: json!({"type": "object", "properties": {}}),
        },
        ToolDefinition {
            name: "list_deployments",
            description: "List recent deployments of a site with state, branch and build duration",
            input_schema: site_schema(LIST_DEPLOYMENTS_DEFAULT_LIMIT),
        },
        ToolDefinition {
            name: "diagnose_deployment",
            description: "Classify a failed deployment from its error and build log, with fixes and an AI analysis prompt",
            input_schema: deploy_schema(false),
        },
        ToolDefinition {
            name: "analyze_build_usage",
            description: "Build-minute usage, failure rate and recurring failures for a site",
            input_schema: site_schema(USAGE_DEFAULT_LIMIT),
        },
        ToolDefinition {
            name: "recommend_retry",
            description: "Decide whether retrying a failed deployment is worth the build minutes",
            input_schema: deploy_schema(true),
        },
        ToolDefinition {
            name: "content_optimization_report",
            description: "Estimated content and image optimization opportunities from build history",
            input_schema: site_schema(CONTENT_DEFAULT_LIMIT),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_are_unique_and_complete() {
        let defs = tool_definitions();
        let mut names: Vec<&str> = defs.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 6);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 6);
        for d in &defs {
            assert_eq!(d.input_schema["type"], "object");
        }
    }

    #[test]
    fn test_parse_args_missing_field() {
        let err = parse_args::<SiteArgs>(json!({"limit": 3})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_bad_id_is_caller_error() {
        assert!(ToolError::from(ClientError::InvalidId("..".to_string())).is_caller_error());
        assert!(!ToolError::from(ClientError::NotFound("/deploys/x".to_string())).is_caller_error());
    }

    #[test]
    fn test_limit_defaults_and_rejects_zero() {
        assert_eq!(limit_or(None, 10).unwrap(), 10);
        assert_eq!(limit_or(Some(3), 10).unwrap(), 3);
        assert!(limit_or(Some(0), 10).is_err());
    }
}
