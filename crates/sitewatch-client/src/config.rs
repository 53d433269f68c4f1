//! Client configuration.

use serde::{Deserialize, Serialize};

/// Default hosting API base URL.
pub const DEFAULT_API_URL: &str = "https://api.netlify.com/api/v1";

/// Hosting API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL, without a trailing slash
    pub api_url: String,
    /// Personal access token, passed through as a bearer credential
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: format!("sitewatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Read `SITEWATCH_API_URL` and `SITEWATCH_API_TOKEN` (falling back to
    /// `NETLIFY_AUTH_TOKEN`).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("SITEWATCH_API_URL").filter(|u| !u.trim().is_empty()) {
            config.api_url = url;
        }
        config.api_url = config.api_url.trim_end_matches('/').to_string();
        config.token = lookup("SITEWATCH_API_TOKEN")
            .or_else(|| lookup("NETLIFY_AUTH_TOKEN"))
            .filter(|t| !t.trim().is_empty());
        config
    }

    /// Override the base URL.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the access token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}
