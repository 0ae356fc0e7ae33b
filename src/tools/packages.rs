//! Package management routed through the resolver.

use super::{ToolContext, command_result, require_credential};
use crate::pkg::PackageAction;
use crate::{MachinaError, Result};
use serde_json::{Value, json};

pub async fn package_management<C: ToolContext>(
    ctx: &C,
    action: String,
    package_name: Option<String>,
) -> Result<Value> {
    let action = PackageAction::parse(&action)?;

    // Resolve before the privilege gate: an unsupported host is unsupported
    // regardless of authentication state.
    let manager = ctx
        .packages()
        .detect()
        .ok_or(MachinaError::UnsupportedEnvironment)?;
    let command = manager.command(action, package_name.as_deref())?;

    let credential = if action.privileged() {
        Some(require_credential(ctx)?)
    } else {
        None
    };

    let output = ctx.runner().run(&command, credential.as_ref(), None).await?;

    let mut value = command_result(&output, ctx.config().max_output);
    value["manager"] = json!(manager.name());
    Ok(value)
}
