use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

// Matches <script type="application/ld+json">...</script>, tolerating extra
// attributes, either quote style, and any casing.
static JSON_LD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .unwrap()
});

/// Pull every JSON-LD fragment out of a page and parse it.
///
/// One fragment yields one block, even when the fragment is a top-level
/// array. Fragments that fail to parse are skipped; a diagnostic carrying
/// the 1-based fragment index is recorded so the rest of the page still
/// gets analyzed.
pub fn extract_blocks(html: &str) -> (Vec<Value>, Vec<String>) {
    let mut blocks = Vec::new();
    let mut errors = Vec::new();

    for (i, cap) in JSON_LD_RE.captures_iter(html).enumerate() {
        let raw = cap[1].trim();
        if raw.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => blocks.push(value),
            Err(e) => errors.push(format!("block {}: {}", i + 1, e)),
        }
    }

    (blocks, errors)
}

// ── Tests ──
