//! In-memory hosting provider (testing only)
//!
//! `MemoryHostingProvider` satisfies the `HostingProvider` contract without
//! any network access. Sites, deploys and logs are seeded up front; failures
//! can be injected per deploy id.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sitewatch_core::{DeploymentRecord, LogLine, Site};

use crate::error::{ClientError, ClientResult};
use crate::provider::HostingProvider;

#[derive(Debug, Default)]
struct State {
    sites: Vec<Site>,
    /// Insertion order; newest-first ordering happens on read.
    deploys: Vec<DeploymentRecord>,
    logs: HashMap<String, Vec<LogLine>>,
    failing_logs: HashMap<String, u16>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryHostingProvider {
    state: Mutex<State>,
}

impl MemoryHostingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_site(self, site: Site) -> Self {
        self.state().sites.push(site);
        self
    }

    pub fn with_deploy(self, deploy: DeploymentRecord) -> Self {
        self.state().deploys.push(deploy);
        self
    }

    pub fn with_deploys(self, deploys: impl IntoIterator<Item = DeploymentRecord>) -> Self {
        self.state().deploys.extend(deploys);
        self
    }

    pub fn with_logs(self, deploy_id: &str, lines: Vec<LogLine>) -> Self {
        self.state().logs.insert(deploy_id.to_string(), lines);
        self
    }

    /// Make `get_build_logs(deploy_id)` fail with `status`.
    pub fn with_failing_logs(self, deploy_id: &str, status: u16) -> Self {
        self.state().failing_logs.insert(deploy_id.to_string(), status);
        self
    }

    /// Calls received so far, as `"operation:argument"`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl HostingProvider for MemoryHostingProvider {
    async fn list_sites(&self) -> ClientResult<Vec<Site>> {
        self.record("list_sites".to_string());
        Ok(self.state().sites.clone())
    }

    async fn list_deployments(
        &self,
        site_id: &str,
        limit: usize,
    ) -> ClientResult<Vec<DeploymentRecord>> {
        self.record(format!("list_deployments:{site_id}"));
        let state = self.state();
        if !state.sites.iter().any(|s| s.id == site_id) {
            return Err(ClientError::NotFound(format!("/sites/{site_id}/deploys")));
        }
        let mut deploys: Vec<DeploymentRecord> = state
            .deploys
            .iter()
            .filter(|d| d.site_id == site_id)
            .cloned()
            .collect();
        deploys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        deploys.truncate(limit);
        Ok(deploys)
    }

    async fn get_deployment(&self, deploy_id: &str) -> ClientResult<DeploymentRecord> {
        self.record(format!("get_deployment:{deploy_id}"));
        self.state()
            .deploys
            .iter()
            .find(|d| d.id == deploy_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/deploys/{deploy_id}")))
    }

    async fn get_build_logs(&self, deploy_id: &str) -> ClientResult<Vec<LogLine>> {
        self.record(format!("get_build_logs:{deploy_id}"));
        let state = self.state();
        if let Some(status) = state.failing_logs.get(deploy_id) {
            return Err(ClientError::Status {
                status: *status,
                body: "injected failure".to_string(),
            });
        }
        if !state.deploys.iter().any(|d| d.id == deploy_id) {
            return Err(ClientError::NotFound(format!("/deploys/{deploy_id}/log")));
        }
        Ok(state.logs.get(deploy_id).cloned().unwrap_or_default())
    }
}
