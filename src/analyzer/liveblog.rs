use chrono::NaiveDateTime;
use serde_json::Value;

use super::dates;
use super::walk::{has_type, walk_objects};

const LIVE_BLOG_TYPE: &str = "LiveBlogPosting";
const UPDATE_KEY: &str = "liveBlogUpdate";

/// Update cadence of a live-updating page.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LiveBlogSummary {
    /// Raw discovered update entries, dated or not.
    pub update_count: usize,
    /// Mean gap between chronological updates in minutes, one decimal.
    /// 0 when fewer than two sortable events exist.
    pub avg_interval_minutes: f64,
    pub created_at: Option<String>,
    pub last_modified_at: Option<String>,
}

/// Collect live-blog update events across all blocks and compute the mean
/// inter-update interval.
///
/// Entity dates come from the LiveBlogPosting node itself (last one wins
/// when several exist). Pages without a LiveBlogPosting fall back to the
/// last publication/modification dates seen anywhere, so the summary is
/// never empty when any date exists.
pub fn analyze(blocks: &[Value]) -> LiveBlogSummary {
    let mut update_count = 0usize;
    let mut events: Vec<NaiveDateTime> = Vec::new();
    let mut created: Option<String> = None;
    let mut modified: Option<String> = None;
    let mut fallback_created: Option<String> = None;
    let mut fallback_modified: Option<String> = None;
    let mut live_blog_seen = false;

    for block in blocks {
        walk_objects(block, true, &mut |node, _is_root| {
            if let Some(d) = node.get("datePublished").and_then(Value::as_str) {
                fallback_created = Some(d.to_string());
            }
            if let Some(d) = node.get("dateModified").and_then(Value::as_str) {
                fallback_modified = Some(d.to_string());
            }

            if !has_type(node, LIVE_BLOG_TYPE) {
                return;
            }
            live_blog_seen = true;
            created = node.get("datePublished").and_then(Value::as_str).map(String::from);
            modified = node.get("dateModified").and_then(Value::as_str).map(String::from);

            for update in normalize_updates(node.get(UPDATE_KEY)) {
                update_count += 1;
                let date = update
                    .get("datePublished")
                    .filter(|d| !d.is_null())
                    .or_else(|| update.get("dateModified"));
                if let Some(instant) = date.and_then(dates::instant) {
                    events.push(instant);
                }
            }
        });
    }

    if !live_blog_seen {
        created = fallback_created;
        modified = fallback_modified;
    }

    LiveBlogSummary {
        update_count,
        avg_interval_minutes: mean_interval_minutes(&mut events),
        created_at: created.as_deref().map(dates::display),
        last_modified_at: modified.as_deref().map(dates::display),
    }
}

/// A single update object counts as a one-element list.
fn normalize_updates(value: Option<&Value>) -> Vec<&Value> {
    match value {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    }
}

fn mean_interval_minutes(events: &mut [NaiveDateTime]) -> f64 {
    if events.len() < 2 {
        return 0.0;
    }
    events.sort();
    let gaps: Vec<f64> = events
        .windows(2)
        .map(|w| w[1].signed_duration_since(w[0]).num_seconds() as f64 / 60.0)
        .collect();
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    (mean * 10.0).round() / 10.0
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live_blog(updates: Value) -> Value {
        json!({
            "@type": "LiveBlogPosting",
            "datePublished": "2024-05-01T07:30:00Z",
            "dateModified": "2024-05-01T09:00:00+02:00",
            "liveBlogUpdate": updates
        })
    }

    #[test]
    fn mean_of_consecutive_gaps() {
        // Minutes 0, 10, 25 → gaps 10 and 15 → mean 12.5.
        let blocks = vec![live_blog(json!([
            { "datePublished": "2024-05-01T08:00:00Z" },
            { "datePublished": "2024-05-01T08:10:00Z" },
            { "datePublished": "2024-05-01T08:25:00Z" }
        ]))];
        let s = analyze(&blocks);
        assert_eq!(s.update_count, 3);
        assert_eq!(s.avg_interval_minutes, 12.5);
    }

    #[test]
    fn unsorted_input_is_sorted_chronologically() {
        let blocks = vec![live_blog(json!([
            { "datePublished": "2024-05-01T08:50:00Z" },
            { "datePublished": "2024-05-01T08:00:00Z" },
            { "datePublished": "2024-05-01T08:20:00Z" }
        ]))];
        assert_eq!(analyze(&blocks).avg_interval_minutes, 25.0);
    }

    #[test]
    fn fewer_than_two_sortable_events() {
        let blocks = vec![live_blog(json!([
            { "datePublished": "2024-05-01T08:00:00Z" }
        ]))];
        let s = analyze(&blocks);
        assert_eq!(s.update_count, 1);
        assert_eq!(s.avg_interval_minutes, 0.0);
    }

    #[test]
    fn unparseable_dates_count_as_updates_but_not_events() {
        let blocks = vec![live_blog(json!([
            { "datePublished": "2024-05-01T08:00:00Z" },
            { "datePublished": "yesterday" },
            { "title": "no date at all" }
        ]))];
        let s = analyze(&blocks);
        assert_eq!(s.update_count, 3);
        assert_eq!(s.avg_interval_minutes, 0.0);
    }

    #[test]
    fn single_update_object_normalized_to_list() {
        let blocks = vec![live_blog(json!({ "datePublished": "2024-05-01T08:00:00Z" }))];
        assert_eq!(analyze(&blocks).update_count, 1);
    }

    #[test]
    fn modification_date_backs_up_missing_publication() {
        let blocks = vec![live_blog(json!([
            { "dateModified": "2024-05-01T08:00:00Z" },
            { "datePublished": "2024-05-01T08:30:00Z" }
        ]))];
        assert_eq!(analyze(&blocks).avg_interval_minutes, 30.0);
    }

    #[test]
    fn entity_dates_resolved_for_display() {
        let blocks = vec![live_blog(json!([]))];
        let s = analyze(&blocks);
        assert_eq!(s.created_at.as_deref(), Some("2024-05-01T07:30:00"));
        assert_eq!(s.last_modified_at.as_deref(), Some("2024-05-01T09:00:00"));
    }

    #[test]
    fn fallback_dates_without_live_blog() {
        let blocks = vec![
            json!({ "@type": "WebPage", "datePublished": "2024-01-01T00:00:00Z" }),
            json!({ "@type": "NewsArticle", "datePublished": "2024-02-01T00:00:00Z",
                    "dateModified": "2024-02-02T00:00:00Z" }),
        ];
        let s = analyze(&blocks);
        assert_eq!(s.update_count, 0);
        // Last-seen-wins for the fallback.
        assert_eq!(s.created_at.as_deref(), Some("2024-02-01T00:00:00"));
        assert_eq!(s.last_modified_at.as_deref(), Some("2024-02-02T00:00:00"));
    }

    #[test]
    fn no_dates_anywhere_leaves_summary_empty() {
        let blocks = vec![json!({ "@type": "WebPage" })];
        let s = analyze(&blocks);
        assert!(s.created_at.is_none());
        assert!(s.last_modified_at.is_none());
        assert_eq!(s.update_count, 0);
    }
}
