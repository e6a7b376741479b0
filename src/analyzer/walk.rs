use serde_json::{Map, Value};

/// Property whose members are top-level entities despite syntactic nesting.
pub const GRAPH_KEY: &str = "@graph";

/// Depth-first traversal over a JSON-LD value, visiting every object node
/// exactly once with the inherited root-context flag.
///
/// Context rule: descending through `@graph` resets the context to root;
/// descending through any other object key makes it nested. Array elements
/// inherit the current context unchanged, so the members of a top-level
/// array block or a `@graph` container classify as roots.
pub fn walk_objects<F>(value: &Value, is_root: bool, visit: &mut F)
where
    F: FnMut(&Map<String, Value>, bool),
{
    match value {
        Value::Object(map) => {
            visit(map, is_root);
            for (key, child) in map {
                walk_objects(child, key == GRAPH_KEY, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_objects(item, is_root, visit);
            }
        }
        _ => {}
    }
}

/// Normalize a node's `@type` declaration into an ordered token list.
/// A bare string becomes a one-element list; non-string array members are
/// rendered as their JSON text. Nodes without `@type` yield None.
pub fn type_tokens(node: &Map<String, Value>) -> Option<Vec<String>> {
    match node.get("@type")? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|t| match t {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    }
}

/// True when the node declares `ty` among its type tokens.
pub fn has_type(node: &Map<String, Value>, ty: &str) -> bool {
    type_tokens(node).is_some_and(|tokens| tokens.iter().any(|t| t == ty))
}

// ── Tests ──
