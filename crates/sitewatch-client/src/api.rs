//! HTTP client for the hosting provider's REST API.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use sitewatch_core::{DeploymentRecord, LogLine, Site};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::provider::HostingProvider;

/// Hosting API client.
///
/// The token is passed through as a bearer credential; nothing is cached
/// between calls.
pub struct HostingApiClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl HostingApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(HostingApiClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Endpoint URL under the API base, one percent-encoded path segment
    /// per element of `segments`.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let base = &self.config.api_url;
        let mut url = Url::parse(base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let token = self.config.token.as_deref().ok_or(ClientError::MissingToken)?;
        debug!(url = %url, "GET");

        let response = self.http_client.get(url.clone()).bearer_auth(token).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(url.path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), "hosting API request failed");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// An id must be a single, non-relative path segment.
fn checked_id(id: &str) -> ClientResult<&str> {
    match id {
        "" | "." | ".." => Err(ClientError::InvalidId(id.to_string())),
        _ => Ok(id),
    }
}

#[async_trait]
impl HostingProvider for HostingApiClient {
    async fn list_sites(&self) -> ClientResult<Vec<Site>> {
        self.get_json(self.endpoint(&["sites"])?).await
    }

    async fn list_deployments(
        &self,
        site_id: &str,
        limit: usize,
    ) -> ClientResult<Vec<DeploymentRecord>> {
        let mut url = self.endpoint(&["sites", checked_id(site_id)?, "deploys"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &limit.to_string());
        let mut deploys: Vec<DeploymentRecord> = self.get_json(url).await?;
        deploys.truncate(limit);
        Ok(deploys)
    }

    async fn get_deployment(&self, deploy_id: &str) -> ClientResult<DeploymentRecord> {
        self.get_json(self.endpoint(&["deploys", checked_id(deploy_id)?])?)
            .await
    }

    async fn get_build_logs(&self, deploy_id: &str) -> ClientResult<Vec<LogLine>> {
        self.get_json(self.endpoint(&["deploys", checked_id(deploy_id)?, "log"])?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HostingApiClient {
        HostingApiClient::new(ClientConfig::default().with_api_url("http://localhost:1/api/v1/"))
            .unwrap()
    }

    #[test]
    fn test_endpoint_join() {
        let url = client().endpoint(&["sites"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:1/api/v1/sites");
    }

    #[test]
    fn test_ids_stay_inside_their_segment() {
        let id = "abc/../../sites?x=1#frag";
        let url = client()
            .endpoint(&["deploys", checked_id(id).unwrap(), "log"])
            .unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments.len(), 5);
        assert_eq!(&segments[..3], ["api", "v1", "deploys"]);
        assert_eq!(segments[4], "log");
        assert!(segments[3].contains("%2F"));
    }

    #[test]
    fn test_relative_ids_are_rejected() {
        for id in ["", ".", ".."] {
            assert!(matches!(checked_id(id), Err(ClientError::InvalidId(_))));
        }
        assert_eq!(checked_id("64f1a2").unwrap(), "64f1a2");
    }

    #[tokio::test]
    async fn test_relative_id_fails_before_request() {
        let client = HostingApiClient::new(
            ClientConfig::default()
                .with_api_url("http://127.0.0.1:9")
                .with_token("t"),
        )
        .unwrap();
        let err = client.get_deployment("..").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidId(_)));
    }

    #[test]
    fn test_deploys_query() {
        let mut url = client().endpoint(&["sites", "site-1", "deploys"]).unwrap();
        url.query_pairs_mut().append_pair("per_page", "10");
        assert_eq!(url.as_str(), "http://localhost:1/api/v1/sites/site-1/deploys?per_page=10");
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_request() {
        // unroutable port: reaching the network would surface as Http, not MissingToken
        let client =
            HostingApiClient::new(ClientConfig::default().with_api_url("http://127.0.0.1:9")).unwrap();
        let err = client.list_sites().await.unwrap_err();
        assert!(matches!(err, ClientError::MissingToken));
    }

    #[test]
    fn test_deploy_wire_shape() {
        let json = r#"{
            "id": "64f1",
            "site_id": "site-1",
            "state": "error",
            "created_at": "2026-03-01T10:00:00Z",
            "published_at": null,
            "error_message": "Build script returned non-zero exit code: 2",
            "deploy_time": null,
            "branch": "main",
            "commit_ref": "abc123",
            "title": "Add blog post",
            "context": "production",
            "screenshot_url": null
        }"#;
        let rec: DeploymentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.state, sitewatch_core::DeployState::Error);
        assert_eq!(rec.deploy_time, None);
        assert_eq!(rec.title.as_deref(), Some("Add blog post"));
    }
}
