// src/status.rs - Severity classification for free-text status fields

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

impl Severity {
    /// Badge class the table view renders for this severity.
    pub const fn css_class(self) -> &'static str {
        match self {
            Severity::Ok => "status-ok",
            Severity::Warning => "status-warning",
            Severity::Error => "status-error",
        }
    }
}

const WARNING_TERMS: &[&str] = &["low", "due"];
const ERROR_TERMS: &[&str] = &["expired", "damaged", "missing", "out"];

/// Classifies a status text case-insensitively. Checks run in a fixed order
/// and the first match wins. Only the empty string gets no badge; whitespace
/// counts as text and classifies as ok.
pub fn classify(status: &str) -> Option<Severity> {
    if status.is_empty() {
        return None;
    }

    let lowered = status.to_lowercase();
    if WARNING_TERMS.iter().any(|term| lowered.contains(term)) {
        return Some(Severity::Warning);
    }
    if ERROR_TERMS.iter().any(|term| lowered.contains(term)) {
        return Some(Severity::Error);
    }
    // "ok" and anything unrecognised
    Some(Severity::Ok)
}
