//! # levelcode-server
//!
//! MCP server for editing levelcode tokens.
//!
//! This crate provides:
//! - MCP JSON-RPC protocol handling
//! - Tool implementations (create_level, set_tile, preview_level, etc.)
//! - PNG previews of decoded levels
//! - Line-delimited stdio transport

pub mod config;
pub mod mcp;
pub mod preview;
pub mod tools;
pub mod transport;

pub use config::ServerConfig;

use levelcode_core::Result;

/// Levelcode MCP server
pub struct LevelServer {
    config: ServerConfig,
}

impl LevelServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run the server on stdio transport
    pub async fn run_stdio(self) -> Result<()> {
        transport::stdio::run(self).await
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl Default for LevelServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}
