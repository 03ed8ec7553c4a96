// src/auth/artifact.rs

//! Credential artifact parsing.
//!
//! The login flow writes a small JSON document. We don't parse it as JSON:
//! the org id is the first quoted value on the last line that isn't just
//! braces, i.e. the first value of the last top-level object.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, SupervisorError};
use crate::types::ActivationStatus;

static VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#":\s*"([^"]*)""#).expect("valid regex"));
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("valid regex"));

/// An org credential produced by the auth handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgCredential {
    pub org_id: String,
    pub activation_status: ActivationStatus,
}

impl OrgCredential {
    pub fn pending(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            activation_status: ActivationStatus::Pending,
        }
    }

    pub fn activated(self) -> Self {
        Self {
            activation_status: ActivationStatus::Activated,
            ..self
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activation_status == ActivationStatus::Activated
    }
}

/// Extract the org id from the artifact contents.
pub fn parse_org_id(contents: &str) -> Result<String> {
    let line = contents
        .lines()
        .rev()
        .find(|line| !is_brace_line(line))
        .ok_or_else(|| {
            SupervisorError::InvalidCredentialArtifact(
                "artifact contains no data lines".to_string(),
            )
        })?;

    // Lines with keys only count quoted values; bare lines take any quoted string.
    let re = if line.contains(':') { &*VALUE_RE } else { &*QUOTED_RE };
    let candidate = re
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty());

    candidate.map(str::to_string).ok_or_else(|| {
        SupervisorError::InvalidCredentialArtifact(format!(
            "no quoted field found in line '{}'",
            line.trim()
        ))
    })
}

/// A line made only of braces, commas and whitespace (or nothing at all).
fn is_brace_line(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || matches!(c, '{' | '}' | ','))
}
