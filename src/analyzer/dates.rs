use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;

static ISO_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").unwrap());

/// A date value after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Matched the ISO date-and-time prefix; sortable.
    Instant(NaiveDateTime),
    /// No recognizable timestamp; kept verbatim for display only.
    Raw(String),
}

impl Resolved {
    pub fn display(&self) -> String {
        match self {
            Resolved::Instant(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Resolved::Raw(s) => s.clone(),
        }
    }

    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            Resolved::Instant(dt) => Some(*dt),
            Resolved::Raw(_) => None,
        }
    }
}

/// Normalize a raw JSON value into a comparable timestamp.
///
/// Only strings are accepted; anything else yields None. The first
/// `YYYY-MM-DDTHH:MM:SS` substring wins, ignoring timezone suffix,
/// fractional seconds, or `Z`. Strings with no such prefix pass through
/// as `Resolved::Raw`.
pub fn resolve(value: &Value) -> Option<Resolved> {
    let raw = value.as_str()?;
    Some(resolve_str(raw))
}

pub fn resolve_str(raw: &str) -> Resolved {
    if let Some(m) = ISO_PREFIX_RE.find(raw) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(m.as_str(), "%Y-%m-%dT%H:%M:%S") {
            return Resolved::Instant(dt);
        }
    }
    Resolved::Raw(raw.to_string())
}

/// Display form of a raw date string: the matched timestamp, or the string
/// itself when nothing matched.
pub fn display(raw: &str) -> String {
    resolve_str(raw).display()
}

/// Sortable instant, if the value resolves to one.
pub fn instant(value: &Value) -> Option<NaiveDateTime> {
    resolve(value)?.instant()
}

// ── Tests ──
