// src/mcp/mod.rs
// MCP Server implementation

pub mod http;

use crate::auth::SudoSession;
use crate::config::Config;
use crate::pkg::PackageResolver;
use crate::runner::{CommandRunner, SystemRunner};
use crate::tools::{self, ToolContext};
use rmcp::{
    ErrorData, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters},
    model::{
        CallToolRequestParam, CallToolResult, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo,
    },
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// MCP Server state.
///
/// The session, runner, and resolver are injected so every transport session
/// shares the one privilege session and package binding.
#[derive(Clone)]
pub struct MachinaServer {
    session: Arc<SudoSession>,
    runner: Arc<dyn CommandRunner>,
    packages: Arc<PackageResolver>,
    config: Config,
    tool_router: ToolRouter<Self>,
}

impl MachinaServer {
    pub fn new(config: Config) -> Self {
        Self::with_parts(
            Arc::new(SudoSession::new(config.sudo_timeout)),
            Arc::new(SystemRunner),
            Arc::new(PackageResolver::new()),
            config,
        )
    }

    pub fn with_parts(
        session: Arc<SudoSession>,
        runner: Arc<dyn CommandRunner>,
        packages: Arc<PackageResolver>,
        config: Config,
    ) -> Self {
        Self {
            session,
            runner,
            packages,
            config,
            tool_router: Self::tool_router(),
        }
    }
}

impl ToolContext for MachinaServer {
    fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    fn session(&self) -> &Arc<SudoSession> {
        &self.session
    }

    fn packages(&self) -> &Arc<PackageResolver> {
        &self.packages
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

// Request types for tools with parameters
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AuthenticateSudoRequest {
    #[schemars(
        description = "Sudo password. Cached in memory for the session window; never logged or echoed back."
    )]
    pub password: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExecuteCommandRequest {
    #[schemars(description = "Shell command to run")]
    pub command: String,
    #[schemars(description = "Run elevated via the cached sudo credential")]
    pub elevated: Option<bool>,
    #[schemars(description = "Working directory")]
    pub working_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ReadFileRequest {
    #[schemars(description = "File path")]
    pub path: String,
    #[schemars(description = "Line cap (default 1000)")]
    pub max_lines: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct WriteFileRequest {
    #[schemars(description = "File path")]
    pub path: String,
    #[schemars(description = "Content to write")]
    pub content: String,
    #[schemars(description = "Back up an existing file first (default true)")]
    pub backup: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDirectoryRequest {
    #[schemars(description = "Directory path (default .)")]
    pub path: Option<String>,
    #[schemars(description = "Include dotfiles")]
    pub include_hidden: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FileOperationsRequest {
    #[schemars(description = "Action: copy/move/delete")]
    pub action: String,
    #[schemars(description = "Source path")]
    pub source: String,
    #[schemars(description = "Destination path (copy/move)")]
    pub destination: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ProcessManagementRequest {
    #[schemars(description = "Action: list/info/kill")]
    pub action: String,
    #[schemars(description = "Pid, or process name for kill")]
    pub process_identifier: Option<String>,
    #[schemars(description = "Signal for kill: TERM/KILL/INT/HUP (default TERM)")]
    pub signal: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ServiceControlRequest {
    #[schemars(description = "Action: start/stop/restart/enable/disable/status")]
    pub action: String,
    #[schemars(description = "Service name")]
    pub service_name: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PackageManagementRequest {
    #[schemars(description = "Action: install/remove/update/search/list")]
    pub action: String,
    #[schemars(description = "Package name (install/remove/search)")]
    pub package_name: Option<String>,
}

#[tool_router]
impl MachinaServer {
    #[tool(
        description = "Authenticate sudo access with a password; cached in memory for the session window."
    )]
    async fn authenticate_sudo(
        &self,
        Parameters(req): Parameters<AuthenticateSudoRequest>,
    ) -> Result<String, String> {
        tools::respond(tools::exec::authenticate_sudo(self, req.password).await)
    }

    #[tool(description = "Drop the cached sudo credential immediately.")]
    async fn revoke_sudo(&self) -> Result<String, String> {
        tools::respond(tools::exec::revoke_sudo(self))
    }

    #[tool(description = "Report whether sudo is authenticated and for how much longer.")]
    async fn sudo_status(&self) -> Result<String, String> {
        tools::respond(tools::exec::sudo_status(self))
    }

    #[tool(description = "Execute a shell command with optional sudo elevation.")]
    async fn execute_command(
        &self,
        Parameters(req): Parameters<ExecuteCommandRequest>,
    ) -> Result<String, String> {
        tools::respond(
            tools::exec::execute_command(
                self,
                req.command,
                req.elevated.unwrap_or(false),
                req.working_dir,
            )
            .await,
        )
    }

    #[tool(description = "Read file contents with a line cap.")]
    async fn read_file(
        &self,
        Parameters(req): Parameters<ReadFileRequest>,
    ) -> Result<String, String> {
        tools::respond(tools::files::read_file(req.path, req.max_lines).await)
    }

    #[tool(description = "Write content to a file, backing up any existing copy.")]
    async fn write_file(
        &self,
        Parameters(req): Parameters<WriteFileRequest>,
    ) -> Result<String, String> {
        tools::respond(
            tools::files::write_file(req.path, req.content, req.backup.unwrap_or(true)).await,
        )
    }

    #[tool(description = "List directory contents with file metadata.")]
    async fn list_directory(
        &self,
        Parameters(req): Parameters<ListDirectoryRequest>,
    ) -> Result<String, String> {
        tools::respond(
            tools::files::list_directory(
                req.path.unwrap_or_else(|| ".".to_string()),
                req.include_hidden.unwrap_or(false),
            )
            .await,
        )
    }

    #[tool(description = "Copy, move, or delete files and directories.")]
    async fn file_operations(
        &self,
        Parameters(req): Parameters<FileOperationsRequest>,
    ) -> Result<String, String> {
        tools::respond(
            tools::files::file_operations(req.action, req.source, req.destination).await,
        )
    }

    #[tool(description = "Manage processes. Actions: list/info/kill")]
    async fn process_management(
        &self,
        Parameters(req): Parameters<ProcessManagementRequest>,
    ) -> Result<String, String> {
        tools::respond(
            tools::process::process_management(
                self,
                req.action,
                req.process_identifier,
                req.signal,
            )
            .await,
        )
    }

    #[tool(
        description = "Control systemd services (requires sudo authentication). Actions: start/stop/restart/enable/disable/status"
    )]
    async fn service_control(
        &self,
        Parameters(req): Parameters<ServiceControlRequest>,
    ) -> Result<String, String> {
        tools::respond(tools::service::service_control(self, req.action, req.service_name).await)
    }

    #[tool(
        description = "Manage packages via the host's package manager. Actions: install/remove/update/search/list (install/remove/update require sudo authentication)"
    )]
    async fn package_management(
        &self,
        Parameters(req): Parameters<PackageManagementRequest>,
    ) -> Result<String, String> {
        tools::respond(
            tools::packages::package_management(self, req.action, req.package_name).await,
        )
    }

    #[tool(description = "Get a CPU/memory/disk/network snapshot of the host.")]
    async fn system_info(&self) -> Result<String, String> {
        tools::respond(tools::system::system_info().await)
    }
}

impl ServerHandler for MachinaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: "machina".into(),
                title: Some("Machina - Remote Machine Control".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Machina exposes structured control of this machine: files, processes, \
                 services, packages, and raw command execution. Privileged operations \
                 require authenticate_sudo first; authentication expires after the \
                 configured window."
                    .into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let tool_name = request.name.to_string();
            let start = std::time::Instant::now();

            // Arguments are never logged: authenticate_sudo carries the credential
            let ctx = ToolCallContext::new(self, request, context);
            let result = self.tool_router.call(ctx).await;

            let success = result
                .as_ref()
                .map(|r| !r.is_error.unwrap_or(false))
                .unwrap_or(false);
            info!(
                target: "audit",
                tool = %tool_name,
                duration_ms = start.elapsed().as_millis() as u64,
                success,
                "tool call"
            );

            result
        }
    }
}
