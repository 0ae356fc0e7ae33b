// src/runner.rs
// Shell command execution with optional sudo elevation

use crate::auth::Credential;
use crate::{MachinaError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

/// Captured result of a finished command.
///
/// A non-zero exit code is a normal outcome, not a runner error; the runner
/// fails only when the command could not be started or its output could not
/// be collected.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Executes shell command strings, optionally wrapped with sudo.
///
/// This trait is the seam between tool handlers and the OS: production code
/// uses [`SystemRunner`], tests inject a scripted mock.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` through the shell. When `credential` is set the command
    /// runs under `sudo -S` with the password piped to stdin — it is never
    /// placed on the argument list.
    async fn run(
        &self,
        command: &str,
        credential: Option<&Credential>,
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        command: &str,
        credential: Option<&Credential>,
        working_dir: Option<&Path>,
    ) -> Result<CommandOutput> {
        let mut cmd = match credential {
            Some(_) => {
                let mut c = Command::new("sudo");
                // -S reads the password from stdin; -p '' suppresses the prompt
                c.args(["-S", "-p", "", "--", "sh", "-c", command]);
                c.stdin(Stdio::piped());
                c
            }
            None => {
                let mut c = Command::new("sh");
                c.args(["-c", command]);
                c.stdin(Stdio::null());
                c
            }
        };

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(target: "audit", elevated = credential.is_some(), %command, "executing command");

        let mut child = cmd
            .spawn()
            .map_err(|e| MachinaError::Execution(format!("failed to start command: {e}")))?;

        if let Some(credential) = credential {
            if let Some(mut stdin) = child.stdin.take() {
                // sudo may exit before reading; its exit status is the verdict
                let _ = stdin.write_all(credential.expose().as_bytes()).await;
                let _ = stdin.write_all(b"\n").await;
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            MachinaError::Execution(format!("failed to collect command output: {e}"))
        })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        })
    }
}
