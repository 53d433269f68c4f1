//! Domain models for sitewatch.
//!
//! Canonical definitions for the entities read from the hosting provider:
//! - `DeploymentRecord`: one build attempt of a site
//! - `LogLine`: one line of build output
//! - `Site`: a hosted site
//! - `Severity`: ordinal urgency attached to an error category

pub mod deployment;
pub mod error;
pub mod log;
pub mod severity;

// Re-export main types and errors
pub use deployment::{DeployState, DeploymentRecord, Site};
pub use error::{Result, SitewatchError};
pub use log::{LogLevel, LogLine};
pub use severity::Severity;
