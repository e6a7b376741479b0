use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::db::OverviewRow;

/// One flattened CSV row per analyzed page.
#[derive(Serialize)]
struct ExportRecord<'a> {
    url: &'a str,
    status: Option<i64>,
    root_types: &'a str,
    nested_types: &'a str,
    has_author: bool,
    author_name: Option<&'a str>,
    published_at: Option<&'a str>,
    modified_at: Option<&'a str>,
    live_update_count: i64,
    live_avg_interval_min: f64,
    live_created_at: Option<&'a str>,
    live_modified_at: Option<&'a str>,
    parse_errors: Option<&'a str>,
}

/// Write all page reports as CSV to `output`, or stdout when none given.
/// Returns the number of records written.
pub fn export_csv(rows: &[OverviewRow], output: Option<&PathBuf>) -> Result<usize> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(ExportRecord {
            url: &row.url,
            status: row.status,
            root_types: &row.root_types,
            nested_types: &row.nested_types,
            has_author: row.has_author,
            author_name: row.author_name.as_deref(),
            published_at: row.published_at.as_deref(),
            modified_at: row.modified_at.as_deref(),
            live_update_count: row.lb_update_count,
            live_avg_interval_min: row.lb_avg_minutes,
            live_created_at: row.lb_created_at.as_deref(),
            live_modified_at: row.lb_modified_at.as_deref(),
            parse_errors: row.parse_errors.as_deref(),
        })?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> OverviewRow {
        OverviewRow {
            url: "https://a.example".to_string(),
            status: Some(200),
            root_types: "NewsArticle".to_string(),
            nested_types: "ImageObject, Person".to_string(),
            has_author: true,
            author_name: Some("Jane Doe".to_string()),
            published_at: Some("2024-01-05T08:00:00".to_string()),
            modified_at: None,
            lb_update_count: 0,
            lb_avg_minutes: 0.0,
            lb_created_at: None,
            lb_modified_at: None,
            parse_errors: None,
        }
    }

    #[test]
    fn header_and_row_serialized() {
        let mut buf = Vec::new();
        {
            let mut wtr = csv::Writer::from_writer(&mut buf);
            let row = sample_row();
            wtr.serialize(ExportRecord {
                url: &row.url,
                status: row.status,
                root_types: &row.root_types,
                nested_types: &row.nested_types,
                has_author: row.has_author,
                author_name: row.author_name.as_deref(),
                published_at: row.published_at.as_deref(),
                modified_at: row.modified_at.as_deref(),
                live_update_count: row.lb_update_count,
                live_avg_interval_min: row.lb_avg_minutes,
                live_created_at: row.lb_created_at.as_deref(),
                live_modified_at: row.lb_modified_at.as_deref(),
                parse_errors: row.parse_errors.as_deref(),
            })
            .unwrap();
            wtr.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("url,status,root_types"));
        let row_line = lines.next().unwrap();
        assert!(row_line.contains("NewsArticle"));
        assert!(row_line.contains("\"ImageObject, Person\""));
        assert!(row_line.contains("Jane Doe"));
    }
}
