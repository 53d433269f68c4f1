//! Deployment records and sites as reported by the hosting provider.
//!
//! sitewatch only reads these; they are never mutated after fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a deployment.
///
/// States the provider reports that sitewatch does not reason about
/// (e.g. `uploading`, `enqueued`) read as `Unknown`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeployState {
    Pending,
    Building,
    Ready,
    Error,
    Failed,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl DeployState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the build has finished (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Error | Self::Failed | Self::Stopped
        )
    }

    /// Whether the build finished without publishing.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Failed | Self::Stopped)
    }
}

impl std::fmt::Display for DeployState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One build attempt of a site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeploymentRecord {
    pub id: String,

    pub site_id: String,

    pub state: DeployState,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Free-text error reported by the provider. Stale on `ready` deploys.
    #[serde(default)]
    pub error_message: Option<String>,

    /// Build duration in seconds, as billed.
    #[serde(default)]
    pub deploy_time: Option<u64>,

    #[serde(default)]
    pub branch: Option<String>,

    #[serde(default)]
    pub commit_ref: Option<String>,

    /// Commit label (usually the commit subject line).
    #[serde(default)]
    pub title: Option<String>,

    /// Deploy context, e.g. `production` or `deploy-preview`.
    #[serde(default)]
    pub context: Option<String>,
}

impl DeploymentRecord {
    /// Create a record with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        site_id: impl Into<String>,
        state: DeployState,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            site_id: site_id.into(),
            state,
            created_at,
            published_at: None,
            error_message: None,
            deploy_time: None,
            branch: None,
            commit_ref: None,
            title: None,
            context: None,
        }
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_deploy_time(mut self, seconds: u64) -> Self {
        self.deploy_time = Some(seconds);
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_commit(mut self, commit_ref: impl Into<String>) -> Self {
        self.commit_ref = Some(commit_ref.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Wall-clock minutes between creation and publish.
    ///
    /// `None` when the deploy never published or the timestamps are inverted.
    pub fn build_duration_minutes(&self) -> Option<f64> {
        let published = self.published_at?;
        let secs = (published - self.created_at).num_seconds();
        if secs < 0 {
            return None;
        }
        Some(secs as f64 / 60.0)
    }

    /// Build minutes billed for this deploy: `ceil(deploy_time / 60)`.
    pub fn billed_minutes(&self) -> u64 {
        self.deploy_time.map(|secs| secs.div_ceil(60)).unwrap_or(0)
    }

    /// The error message, if it is meaningful for this state.
    ///
    /// Messages on `ready` deploys are stale and blank messages carry nothing.
    pub fn meaningful_error(&self) -> Option<&str> {
        if self.state == DeployState::Ready {
            return None;
        }
        self.error_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// A hosted site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Site {
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub custom_domain: Option<String>,
}
