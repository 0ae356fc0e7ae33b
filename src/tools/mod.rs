//! Tool handlers for the Machina MCP server.
//!
//! Handlers are async functions over `&impl ToolContext` returning
//! `crate::Result<serde_json::Value>`. [`respond`] folds every result into
//! the uniform response contract at the dispatch boundary: success payloads
//! serialize as-is, failures become `{"error": ...}` — the only shape that
//! carries an `error` key.

use crate::auth::{Credential, SudoSession};
use crate::config::Config;
use crate::pkg::PackageResolver;
use crate::runner::{CommandOutput, CommandRunner};
use crate::utils::truncate;
use crate::{MachinaError, Result};
use serde_json::{Value, json};
use std::sync::Arc;

pub mod exec;
pub mod files;
pub mod packages;
pub mod process;
pub mod service;
pub mod system;

/// Shared state every tool handler needs. Implemented by the MCP server;
/// tests provide a mock carrying scripted collaborators.
pub trait ToolContext: Send + Sync {
    fn runner(&self) -> &Arc<dyn CommandRunner>;
    fn session(&self) -> &Arc<SudoSession>;
    fn packages(&self) -> &Arc<PackageResolver>;
    fn config(&self) -> &Config;
}

/// Privilege gate for operations that do not themselves run elevated.
pub(crate) fn require_auth<C: ToolContext + ?Sized>(ctx: &C) -> Result<()> {
    if ctx.session().is_authenticated() {
        Ok(())
    } else {
        Err(MachinaError::AuthorizationRequired)
    }
}

/// Privilege gate that also snapshots the credential for an elevated run.
/// Check and snapshot happen under one lock; the session can still expire
/// before the child spawns (accepted window, see DESIGN.md).
pub(crate) fn require_credential<C: ToolContext + ?Sized>(ctx: &C) -> Result<Credential> {
    ctx.session()
        .credential()
        .ok_or(MachinaError::AuthorizationRequired)
}

/// Success shape for command-backed operations.
pub(crate) fn command_result(output: &CommandOutput, max_output: usize) -> Value {
    json!({
        "success": output.success(),
        "returncode": output.code,
        "stdout": truncate(&output.stdout, max_output),
        "stderr": truncate(&output.stderr, max_output),
    })
}

/// Fold a handler result into the uniform response contract.
pub fn respond(result: Result<Value>) -> std::result::Result<String, String> {
    match result {
        Ok(value) => serde_json::to_string_pretty(&value)
            .map_err(|e| json!({ "error": format!("response serialization failed: {e}") }).to_string()),
        Err(err) => Err(json!({ "error": err.to_user_string() }).to_string()),
    }
}
