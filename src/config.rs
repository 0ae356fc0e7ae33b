// src/config.rs
// Environment-based configuration - single source of truth for all env vars

use std::time::Duration;
use tracing::warn;

/// Default sudo credential lifetime: 30 minutes.
pub const DEFAULT_SUDO_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default byte cap on stdout/stderr echoed back for package and service
/// operations.
pub const DEFAULT_MAX_OUTPUT: usize = 2000;

/// Default entry cap for process listings.
pub const DEFAULT_PROCESS_LIMIT: usize = 50;

/// Runtime configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a validated sudo credential stays cached
    /// (`MACHINA_SUDO_TIMEOUT_SECS`)
    pub sudo_timeout: Duration,
    /// Byte cap on captured output echoed for package/service operations
    /// (`MACHINA_MAX_OUTPUT_BYTES`)
    pub max_output: usize,
    /// Entry cap for process listings (`MACHINA_PROCESS_LIMIT`)
    pub process_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sudo_timeout: DEFAULT_SUDO_TIMEOUT,
            max_output: DEFAULT_MAX_OUTPUT,
            process_limit: DEFAULT_PROCESS_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            sudo_timeout: env_parse("MACHINA_SUDO_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_SUDO_TIMEOUT),
            max_output: env_parse("MACHINA_MAX_OUTPUT_BYTES").unwrap_or(DEFAULT_MAX_OUTPUT),
            process_limit: env_parse("MACHINA_PROCESS_LIMIT").unwrap_or(DEFAULT_PROCESS_LIMIT),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparseable {name}={raw}");
            None
        }
    }
}
