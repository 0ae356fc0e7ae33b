//! Host inventory snapshot.

use crate::Result;
use crate::info;
use serde_json::Value;

/// Unprivileged CPU/memory/disk/network snapshot.
pub async fn system_info() -> Result<Value> {
    let snapshot = tokio::task::spawn_blocking(info::collect_snapshot).await?;
    Ok(serde_json::to_value(snapshot)?)
}
