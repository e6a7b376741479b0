use serde_json::Value;

use super::walk::{type_tokens, walk_objects};

/// Root vs nested type labels plus the first-seen publication dates.
#[derive(Debug, Default, Clone)]
pub struct TypeSummary {
    pub roots: Vec<String>,
    pub nested: Vec<String>,
    pub published: Option<String>,
    pub modified: Option<String>,
}

/// Classify every typed node across all blocks of a page.
///
/// Structural position decides the bucket: the same token can land in both
/// `roots` and `nested`. Both lists are deduplicated preserving first
/// occurrence. `published`/`modified` record the first node anywhere that
/// exposes `datePublished`/`dateModified` and are never overwritten.
pub fn classify(blocks: &[Value]) -> TypeSummary {
    let mut roots = Vec::new();
    let mut nested = Vec::new();
    let mut published: Option<String> = None;
    let mut modified: Option<String> = None;

    for block in blocks {
        walk_objects(block, true, &mut |node, is_root| {
            if let Some(tokens) = type_tokens(node) {
                if is_root {
                    roots.extend(tokens);
                } else {
                    nested.extend(tokens);
                }
            }
            if published.is_none() {
                published = date_field(node, "datePublished");
            }
            if modified.is_none() {
                modified = date_field(node, "dateModified");
            }
        });
    }

    TypeSummary {
        roots: dedup_preserving_order(roots),
        nested: dedup_preserving_order(nested),
        published,
        modified,
    }
}

fn date_field(node: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// First occurrence wins, order = discovery order.
pub fn dedup_preserving_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokens.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

// ── Tests ──
