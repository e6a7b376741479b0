use serde_json::Value;

use super::walk::has_type;

/// Does any node typed `parent_type` contain, anywhere in its subtree, a
/// node typed `child_selector` or a property literally named
/// `child_selector`? The parent node itself is part of its own subtree.
pub fn contains_nested(blocks: &[Value], parent_type: &str, child_selector: &str) -> bool {
    blocks
        .iter()
        .any(|block| search_parent(block, parent_type, child_selector))
}

fn search_parent(value: &Value, parent_type: &str, child_selector: &str) -> bool {
    match value {
        Value::Object(map) => {
            if has_type(map, parent_type) && subtree_matches(value, child_selector) {
                return true;
            }
            map.values().any(|v| search_parent(v, parent_type, child_selector))
        }
        Value::Array(items) => items.iter().any(|v| search_parent(v, parent_type, child_selector)),
        _ => false,
    }
}

fn subtree_matches(value: &Value, child_selector: &str) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key(child_selector)
                || has_type(map, child_selector)
                || map.values().any(|v| subtree_matches(v, child_selector))
        }
        Value::Array(items) => items.iter().any(|v| subtree_matches(v, child_selector)),
        _ => false,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn child_type_beneath_parent() {
        let blocks = vec![json!({
            "@type": "NewsArticle",
            "image": { "@type": "ImageObject", "url": "https://example.com/a.jpg" }
        })];
        assert!(contains_nested(&blocks, "NewsArticle", "ImageObject"));
    }

    #[test]
    fn child_type_outside_parent_subtree() {
        let blocks = vec![json!({
            "@graph": [
                { "@type": "NewsArticle", "headline": "h" },
                { "@type": "ImageObject", "url": "https://example.com/a.jpg" }
            ]
        })];
        assert!(!contains_nested(&blocks, "NewsArticle", "ImageObject"));
    }

    #[test]
    fn property_name_counts_as_child() {
        let blocks = vec![json!({
            "@type": "NewsArticle",
            "video": { "name": "clip" }
        })];
        assert!(contains_nested(&blocks, "NewsArticle", "video"));
    }

    #[test]
    fn match_deep_below_an_intermediate_node() {
        let blocks = vec![json!({
            "@type": "NewsArticle",
            "mainEntity": {
                "itemListElement": [
                    { "item": { "@type": "ImageObject" } }
                ]
            }
        })];
        assert!(contains_nested(&blocks, "NewsArticle", "ImageObject"));
    }

    #[test]
    fn missing_parent_is_false() {
        let blocks = vec![json!({ "@type": "WebPage", "image": { "@type": "ImageObject" } })];
        assert!(!contains_nested(&blocks, "NewsArticle", "ImageObject"));
    }

    #[test]
    fn parent_without_qualifying_child_is_false() {
        let blocks = vec![json!({ "@type": "NewsArticle", "headline": "h" })];
        assert!(!contains_nested(&blocks, "NewsArticle", "ImageObject"));
    }
}
