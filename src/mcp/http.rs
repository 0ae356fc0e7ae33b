// src/mcp/http.rs
// MCP over HTTP (Streamable HTTP transport)

use super::MachinaServer;
use rmcp::transport::streamable_http_server::{
    StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Create the MCP HTTP service. Each HTTP session gets its own server value;
/// all of them share the one privilege session and package binding.
pub fn create_mcp_service(
    server: MachinaServer,
) -> StreamableHttpService<MachinaServer, LocalSessionManager> {
    let service_factory = move || Ok(server.clone());

    let session_manager = Arc::new(LocalSessionManager::default());

    let config = StreamableHttpServerConfig {
        sse_keep_alive: Some(std::time::Duration::from_secs(15)),
        stateful_mode: true,
        sse_retry: Some(std::time::Duration::from_secs(3)),
        cancellation_token: CancellationToken::new(),
    };

    StreamableHttpService::new(service_factory, session_manager, config)
}
