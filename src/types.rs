// src/types.rs

//! Small shared types.

use std::fmt;
use std::time::Duration;

/// Activation state of an org credential as reported by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    Pending,
    Activated,
}

impl ActivationStatus {
    /// Interpret a raw status endpoint body.
    ///
    /// Only the literal `activated` (optionally quoted) counts; anything else
    /// means "not yet".
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim().trim_matches('"');
        if trimmed == "activated" {
            ActivationStatus::Activated
        } else {
            ActivationStatus::Pending
        }
    }
}

/// How the worker identifies itself to the swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Authenticated through an org id from the auth handshake.
    WithOrgId,
    /// Anonymous peer using explicit multi-addresses.
    WithNetworkAddrs,
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchMode::WithOrgId => f.write_str("org-id"),
            LaunchMode::WithNetworkAddrs => f.write_str("network-addrs"),
        }
    }
}

/// Parse a duration given as `<number><unit>` with unit `ms`, `s`, `m` or `h`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

/// Parse a boolean-ish environment value (`1`, `true`, `yes`, `on`).
pub fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
