//! Process management: list, info, kill.

use super::ToolContext;
use crate::info;
use crate::{MachinaError, Result};
use serde_json::{Value, json};

pub async fn process_management<C: ToolContext>(
    ctx: &C,
    action: String,
    process_identifier: Option<String>,
    signal: Option<String>,
) -> Result<Value> {
    match action.as_str() {
        "list" => {
            let limit = ctx.config().process_limit;
            let processes = tokio::task::spawn_blocking(move || info::list_processes(limit)).await?;
            Ok(json!({ "processes": serde_json::to_value(processes)? }))
        }
        "info" => {
            let identifier = require_identifier(process_identifier, "info")?;
            let pid: u32 = identifier.parse().map_err(|_| {
                MachinaError::InvalidInput(format!(
                    "process_identifier must be a pid for info, got `{identifier}`"
                ))
            })?;
            let details = tokio::task::spawn_blocking(move || info::process_info(pid))
                .await?
                .ok_or_else(|| MachinaError::NotFound(format!("no process with pid {pid}")))?;
            Ok(serde_json::to_value(details)?)
        }
        "kill" => {
            let identifier = require_identifier(process_identifier, "kill")?;
            let signal = signal.unwrap_or_else(|| "TERM".to_string());
            let signalled =
                tokio::task::spawn_blocking(move || info::kill_processes(&identifier, &signal))
                    .await??;
            Ok(json!({
                "success": true,
                "message": format!("signalled {signalled} process(es)"),
            }))
        }
        other => Err(MachinaError::InvalidInput(format!(
            "unknown process action `{other}`; use list/info/kill"
        ))),
    }
}

fn require_identifier(identifier: Option<String>, action: &str) -> Result<String> {
    identifier.ok_or_else(|| {
        MachinaError::InvalidInput(format!("process_identifier is required for {action}"))
    })
}
