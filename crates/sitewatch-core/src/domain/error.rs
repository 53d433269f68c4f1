//! Domain-level error taxonomy for sitewatch.
//!
//! The diagnostics engine itself never fails on present-but-odd data; these
//! errors cover configuration only.

/// sitewatch domain errors.
#[derive(Debug, thiserror::Error)]
pub enum SitewatchError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sitewatch domain operations.
pub type Result<T> = std::result::Result<T, SitewatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = SitewatchError::InvalidConfig("monthly quota must be positive".to_string());
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("monthly quota"));
    }
}
