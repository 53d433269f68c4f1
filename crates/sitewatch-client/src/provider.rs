//! Hosting-provider abstraction.
//!
//! `HostingProvider` is the read-only surface sitewatch needs from a
//! static-site host: sites, their recent deploys, one deploy, and its build
//! log. `HostingApiClient` implements it over HTTP; `MemoryHostingProvider`
//! implements it in memory for tests.

use async_trait::async_trait;
use sitewatch_core::{DeploymentRecord, LogLine, Site};

use crate::error::ClientResult;

#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// All sites visible to the configured credential.
    async fn list_sites(&self) -> ClientResult<Vec<Site>>;

    /// Most recent deploys of `site_id`, newest first, at most `limit`.
    async fn list_deployments(&self, site_id: &str, limit: usize)
        -> ClientResult<Vec<DeploymentRecord>>;

    async fn get_deployment(&self, deploy_id: &str) -> ClientResult<DeploymentRecord>;

    /// Build log of `deploy_id` in emission order. Empty when the provider
    /// kept no log.
    async fn get_build_logs(&self, deploy_id: &str) -> ClientResult<Vec<LogLine>>;
}
