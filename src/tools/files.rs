//! Filesystem tools: read, write, list, copy/move/delete.
//!
//! Paths never pass through a shell — everything here uses fs APIs directly,
//! so no token validation applies (see DESIGN.md).

use crate::{MachinaError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Default line cap for `read_file`.
pub const DEFAULT_MAX_LINES: usize = 1000;

#[derive(Debug, Serialize)]
struct DirEntryInfo {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
    size: Option<u64>,
    modified: Option<String>,
    permissions: String,
}

/// Read a file's contents, capped at `max_lines` lines. Invalid UTF-8 is
/// replaced rather than rejected.
pub async fn read_file(path: String, max_lines: Option<usize>) -> Result<Value> {
    let max_lines = max_lines.unwrap_or(DEFAULT_MAX_LINES).max(1);
    let path = PathBuf::from(path);
    if !path.is_file() {
        return Err(MachinaError::NotFound(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let metadata = tokio::fs::metadata(&path).await?;
    let raw = tokio::fs::read(&path).await?;
    let text = String::from_utf8_lossy(&raw);

    let mut lines = Vec::new();
    let mut truncated = false;
    for (index, line) in text.lines().enumerate() {
        if index >= max_lines {
            truncated = true;
            break;
        }
        lines.push(line);
    }
    let mut content = lines.join("\n");
    if truncated {
        content.push_str(&format!("\n... (truncated at {max_lines} lines)"));
    }

    Ok(json!({
        "content": content,
        "size": metadata.len(),
        "modified": modified_rfc3339(&metadata),
    }))
}

/// Write content to a file. An existing file is first copied to a
/// timestamped `.backup.` sibling unless `backup` is false; parent
/// directories are created as needed.
pub async fn write_file(path: String, content: String, backup: bool) -> Result<Value> {
    let path = PathBuf::from(path);

    let mut backup_created = false;
    if backup && path.exists() {
        let backup_path = format!("{}.backup.{}", path.display(), Utc::now().timestamp());
        tokio::fs::copy(&path, &backup_path).await?;
        backup_created = true;
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(&path, content.as_bytes()).await?;

    Ok(json!({
        "success": true,
        "bytes_written": content.len(),
        "backup_created": backup_created,
    }))
}

/// List a directory: directories first, then files, each with metadata.
pub async fn list_directory(path: String, include_hidden: bool) -> Result<Value> {
    let path = PathBuf::from(path);
    if !path.is_dir() {
        return Err(MachinaError::NotFound(format!(
            "directory not found: {}",
            path.display()
        )));
    }

    let mut entries = tokio::fs::read_dir(&path).await?;
    let mut items: Vec<(bool, DirEntryInfo)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !include_hidden && name.starts_with('.') {
            continue;
        }
        // entries that vanish mid-listing are skipped, not fatal
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let is_dir = metadata.is_dir();
        items.push((
            is_dir,
            DirEntryInfo {
                name,
                kind: if is_dir { "directory" } else { "file" },
                size: if is_dir { None } else { Some(metadata.len()) },
                modified: modified_rfc3339(&metadata),
                permissions: permissions_octal(&metadata),
            },
        ));
    }

    items.sort_by(|(a_dir, a), (b_dir, b)| b_dir.cmp(a_dir).then_with(|| a.name.cmp(&b.name)));
    let items: Vec<DirEntryInfo> = items.into_iter().map(|(_, info)| info).collect();

    let absolute = tokio::fs::canonicalize(&path)
        .await
        .unwrap_or_else(|_| path.clone());

    Ok(json!({
        "path": absolute.display().to_string(),
        "items": serde_json::to_value(items)?,
    }))
}

/// Copy, move, or delete a file or directory tree.
pub async fn file_operations(
    action: String,
    source: String,
    destination: Option<String>,
) -> Result<Value> {
    let source_path = PathBuf::from(&source);

    match action.as_str() {
        "delete" => {
            if source_path.is_dir() {
                tokio::fs::remove_dir_all(&source_path).await?;
            } else if source_path.exists() {
                tokio::fs::remove_file(&source_path).await?;
            } else {
                return Err(MachinaError::NotFound(format!("no such path: {source}")));
            }
            Ok(json!({
                "success": true,
                "message": format!("deleted {source}"),
            }))
        }
        "copy" => {
            let destination = require_destination(destination, "copy")?;
            let dest_path = PathBuf::from(&destination);
            ensure_exists(&source_path, &source)?;
            if source_path.is_dir() {
                let (from, to) = (source_path.clone(), dest_path.clone());
                tokio::task::spawn_blocking(move || copy_recursive(&from, &to)).await??;
            } else {
                tokio::fs::copy(&source_path, &dest_path).await?;
            }
            Ok(json!({
                "success": true,
                "message": format!("copied {source} to {destination}"),
            }))
        }
        "move" => {
            let destination = require_destination(destination, "move")?;
            let dest_path = PathBuf::from(&destination);
            ensure_exists(&source_path, &source)?;
            if tokio::fs::rename(&source_path, &dest_path).await.is_err() {
                // rename fails across filesystems; fall back to copy + delete
                if source_path.is_dir() {
                    let (from, to) = (source_path.clone(), dest_path.clone());
                    tokio::task::spawn_blocking(move || copy_recursive(&from, &to)).await??;
                    tokio::fs::remove_dir_all(&source_path).await?;
                } else {
                    tokio::fs::copy(&source_path, &dest_path).await?;
                    tokio::fs::remove_file(&source_path).await?;
                }
            }
            Ok(json!({
                "success": true,
                "message": format!("moved {source} to {destination}"),
            }))
        }
        other => Err(MachinaError::InvalidInput(format!(
            "unsupported file operation `{other}`; use copy/move/delete"
        ))),
    }
}

fn require_destination(destination: Option<String>, action: &str) -> Result<String> {
    destination.ok_or_else(|| {
        MachinaError::InvalidInput(format!("destination is required for {action}"))
    })
}

fn ensure_exists(path: &Path, display: &str) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(MachinaError::NotFound(format!("no such path: {display}")))
    }
}

fn copy_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(destination)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

fn modified_rfc3339(metadata: &std::fs::Metadata) -> Option<String> {
    metadata
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}

#[cfg(unix)]
fn permissions_octal(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions_octal(_metadata: &std::fs::Metadata) -> String {
    String::new()
}
