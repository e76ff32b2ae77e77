//! Validation helpers for raw flag values.

use crate::dispatch::CommandError;

/// Splits a comma-separated port list, preserving order. Blank input means
/// no ports; the first token that is not a non-negative integer fails the
/// whole list.
pub fn parse_ports(protocol: &'static str, raw: &str) -> Result<Vec<u64>, CommandError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<u64>().map_err(|_| CommandError::InvalidPort {
                protocol,
                token: token.to_string(),
            })
        })
        .collect()
}

/// Returns `value` unchanged, or a validation error naming `field` when it
/// is blank. Identifiers are opaque, so surrounding whitespace is kept.
pub fn require_non_empty(field: &str, value: &str) -> Result<String, CommandError> {
    if value.trim().is_empty() {
        return Err(CommandError::missing(field));
    }
    Ok(value.to_string())
}
