use serde_json::Value;

use super::walk::{type_tokens, walk_objects};

/// Shown when a page has authorship markup but no resolvable name.
pub const UNIDENTIFIED: &str = "unidentified";

/// Node types whose `author` property counts as page authorship. An
/// `author` field on any other node (an embedded Review, Organization,
/// etc.) is ignored.
const ARTICLE_TYPES: &[&str] = &["Article", "NewsArticle", "BlogPosting", "LiveBlogPosting"];

#[derive(Debug, Default, Clone)]
pub struct Authorship {
    pub has_author: bool,
    pub name: Option<String>,
}

/// Detect authorship across all blocks of a page.
///
/// The first article-like node carrying an `author` property wins; its
/// author value may be an object (`name`, fallback `alternateName`), an
/// array (first element), or a bare string.
pub fn detect(blocks: &[Value]) -> Authorship {
    let mut found: Option<Option<String>> = None;

    for block in blocks {
        walk_objects(block, true, &mut |node, _is_root| {
            if found.is_some() {
                return;
            }
            let article_like = type_tokens(node)
                .map(|tokens| tokens.iter().any(|t| ARTICLE_TYPES.contains(&t.as_str())))
                .unwrap_or(false);
            if !article_like {
                return;
            }
            if let Some(author) = node.get("author") {
                found = Some(resolve_name(author));
            }
        });
    }

    match found {
        Some(name) => Authorship { has_author: true, name },
        None => Authorship::default(),
    }
}

fn resolve_name(author: &Value) -> Option<String> {
    match author {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(resolve_name),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("alternateName"))
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_author_with_name() {
        let blocks = vec![json!({
            "@type": "NewsArticle",
            "author": { "@type": "Person", "name": "Jane Doe" }
        })];
        let a = detect(&blocks);
        assert!(a.has_author);
        assert_eq!(a.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn alternate_name_fallback() {
        let blocks = vec![json!({
            "@type": "BlogPosting",
            "author": { "@type": "Person", "alternateName": "jdoe" }
        })];
        assert_eq!(detect(&blocks).name.as_deref(), Some("jdoe"));
    }

    #[test]
    fn array_author_uses_first_element() {
        let blocks = vec![json!({
            "@type": "Article",
            "author": [{ "name": "First Writer" }, { "name": "Second Writer" }]
        })];
        assert_eq!(detect(&blocks).name.as_deref(), Some("First Writer"));
    }

    #[test]
    fn bare_string_author() {
        let blocks = vec![json!({ "@type": "LiveBlogPosting", "author": "Newsroom" })];
        assert_eq!(detect(&blocks).name.as_deref(), Some("Newsroom"));
    }

    #[test]
    fn present_but_unresolvable_name() {
        let blocks = vec![json!({
            "@type": "NewsArticle",
            "author": { "@type": "Person", "url": "https://example.com/staff" }
        })];
        let a = detect(&blocks);
        assert!(a.has_author);
        assert!(a.name.is_none());
    }

    // Pins the strict policy: the historical alternative counted any
    // `author` key anywhere in the document.
    #[test]
    fn author_on_non_article_node_does_not_count() {
        let blocks = vec![json!({
            "@type": "Product",
            "review": {
                "@type": "Review",
                "author": { "name": "Reviewer" }
            }
        })];
        let a = detect(&blocks);
        assert!(!a.has_author);
        assert!(a.name.is_none());
    }

    #[test]
    fn nested_article_author_still_counts() {
        let blocks = vec![json!({
            "@graph": [
                { "@type": "WebSite" },
                { "@type": "NewsArticle", "author": { "name": "Graph Writer" } }
            ]
        })];
        let a = detect(&blocks);
        assert!(a.has_author);
        assert_eq!(a.name.as_deref(), Some("Graph Writer"));
    }
}
