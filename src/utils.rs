//! src/utils.rs
//! Shared utility functions used across the codebase

use crate::{MachinaError, Result};

/// Truncate a string to max length with ellipsis.
///
/// If the string is longer than `max_len`, it is cut at the nearest char
/// boundary at or below `max_len` and "..." is appended.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Validate a caller-supplied token destined for a shell command line
/// (package names, service names).
///
/// Allow-list: leading ASCII alphanumeric, then alphanumerics plus
/// `+ . _ @ : -`. Anything that could alter command structure is rejected
/// before any OS interaction.
pub fn validate_token(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MachinaError::InvalidInput(format!(
            "{what} must not be empty"
        )));
    }
    if value.len() > 128 {
        return Err(MachinaError::InvalidInput(format!(
            "{what} exceeds 128 characters"
        )));
    }
    let first_ok = value
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    let rest_ok = value
        .chars()
        .skip(1)
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '_' | '@' | ':' | '-'));
    if !first_ok || !rest_ok {
        return Err(MachinaError::InvalidInput(format!(
            "{what} `{value}` contains unsupported characters"
        )));
    }
    Ok(())
}
