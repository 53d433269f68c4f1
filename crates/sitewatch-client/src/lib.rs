//! Sitewatch hosting-provider client
//!
//! Fetches sites, deploys and build logs from a static-site host. The
//! diagnostics engine in `sitewatch-core` consumes what this crate returns.

pub mod api;
pub mod config;
pub mod error;
pub mod fakes;
pub mod provider;

pub use api::HostingApiClient;
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{ClientError, ClientResult};
pub use fakes::MemoryHostingProvider;
pub use provider::HostingProvider;
