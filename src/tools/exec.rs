//! Sudo session tools and raw command execution.

use super::{ToolContext, command_result, require_credential};
use crate::{MachinaError, Result};
use serde_json::{Value, json};
use std::path::Path;

/// Validate a sudo password against the host and cache it for the session
/// window. The password is never echoed back in any shape.
pub async fn authenticate_sudo<C: ToolContext>(ctx: &C, password: String) -> Result<Value> {
    if password.is_empty() {
        return Err(MachinaError::InvalidInput(
            "password must not be empty".to_string(),
        ));
    }

    let window = ctx
        .session()
        .authenticate(ctx.runner().as_ref(), &password)
        .await?;

    Ok(json!({
        "success": true,
        "message": format!(
            "sudo authentication successful; access cached for {} minutes",
            window.as_secs() / 60
        ),
    }))
}

/// Drop the cached credential immediately.
pub fn revoke_sudo<C: ToolContext>(ctx: &C) -> Result<Value> {
    ctx.session().invalidate();
    Ok(json!({
        "success": true,
        "message": "sudo credential dropped",
    }))
}

/// Presence/absence of authentication is the only observable state.
pub fn sudo_status<C: ToolContext>(ctx: &C) -> Result<Value> {
    let remaining = ctx.session().remaining();
    Ok(json!({
        "authenticated": remaining.is_some(),
        "expires_in_seconds": remaining.map(|d| d.as_secs()),
    }))
}

/// Run an arbitrary shell command, optionally elevated. This is the escape
/// hatch: the command string is passed to the shell as-is.
pub async fn execute_command<C: ToolContext>(
    ctx: &C,
    command: String,
    elevated: bool,
    working_dir: Option<String>,
) -> Result<Value> {
    if command.trim().is_empty() {
        return Err(MachinaError::InvalidInput(
            "command must not be empty".to_string(),
        ));
    }

    let credential = if elevated {
        Some(require_credential(ctx)?)
    } else {
        None
    };

    let output = ctx
        .runner()
        .run(
            &command,
            credential.as_ref(),
            working_dir.as_deref().map(Path::new),
        )
        .await?;

    Ok(command_result(&output, usize::MAX))
}
