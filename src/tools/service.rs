//! systemd service control. Always privilege-gated.

use super::{ToolContext, command_result, require_auth, require_credential};
use crate::utils::validate_token;
use crate::{MachinaError, Result};
use serde_json::Value;

const ACTIONS: [&str; 6] = ["start", "stop", "restart", "enable", "disable", "status"];

pub async fn service_control<C: ToolContext>(
    ctx: &C,
    action: String,
    service_name: String,
) -> Result<Value> {
    require_auth(ctx)?;

    if !ACTIONS.contains(&action.as_str()) {
        return Err(MachinaError::InvalidInput(format!(
            "invalid service action `{action}`; use {}",
            ACTIONS.join("/")
        )));
    }
    validate_token(&service_name, "service name")?;

    // `status` is read-only; root adds nothing to it
    let (command, credential) = if action == "status" {
        (format!("systemctl status {service_name} --no-pager"), None)
    } else {
        (
            format!("systemctl {action} {service_name}"),
            Some(require_credential(ctx)?),
        )
    };

    let output = ctx.runner().run(&command, credential.as_ref(), None).await?;
    Ok(command_result(&output, ctx.config().max_output))
}
