//! Sitewatch tool server
//!
//! Exposes the sitewatch diagnostics engine to AI assistants as MCP tools
//! over line-delimited JSON-RPC on stdio.

pub mod protocol;
pub mod report;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{tool_definitions, SitewatchTools, ToolError};
