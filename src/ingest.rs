use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Read URLs out of one column of a CSV file. The column is located by
/// header name, case-insensitively.
pub fn read_csv_urls(path: &Path, column: &str, limit: Option<usize>) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;
    let urls = parse_url_column(file, column, limit)?;
    info!("URLs in {}: {}", path.display(), urls.len());
    Ok(urls)
}

pub fn parse_url_column<R: Read>(
    reader: R,
    column: &str,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(column))
        .with_context(|| format!("No '{}' column in CSV header", column))?;

    let mut urls = Vec::new();
    for record in rdr.records() {
        if limit.is_some_and(|n| urls.len() >= n) {
            break;
        }
        let record = record?;
        if let Some(url) = record.get(idx) {
            let url = url.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }
    Ok(urls)
}

/// Fetch a sitemap and return its <loc> URLs.
pub async fn fetch_sitemap_urls(sitemap_url: &str) -> Result<Vec<String>> {
    info!("Fetching sitemap: {}", sitemap_url);
    let xml = reqwest::get(sitemap_url)
        .await?
        .text()
        .await
        .context("Failed to fetch sitemap")?;

    let urls = parse_urlset(&xml)?;
    info!("URLs in sitemap: {}", urls.len());
    Ok(urls)
}

/// Parse a urlset XML and return all <loc> URLs.
fn parse_urlset(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => in_loc = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(e)) if in_loc => {
                let url = e.unescape()?.trim().to_string();
                if url.starts_with("http") {
                    urls.push(url);
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                b"loc" => in_loc = false,
                b"url" => in_url = false,
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_url_column_by_header() {
        let csv = "name,url\nFirst,https://a.example\nSecond,https://b.example\n";
        let urls = parse_url_column(csv.as_bytes(), "url", None).unwrap();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn custom_column_name_case_insensitive() {
        let csv = "Page URL,notes\nhttps://a.example,x\n";
        let urls = parse_url_column(csv.as_bytes(), "page url", None).unwrap();
        assert_eq!(urls, vec!["https://a.example"]);
    }

    #[test]
    fn limit_caps_row_count() {
        let csv = "url\nhttps://a.example\nhttps://b.example\nhttps://c.example\n";
        let urls = parse_url_column(csv.as_bytes(), "url", Some(2)).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn blank_cells_skipped() {
        let csv = "url\nhttps://a.example\n\"\"\nhttps://b.example\n";
        let urls = parse_url_column(csv.as_bytes(), "url", None).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "link\nhttps://a.example\n";
        assert!(parse_url_column(csv.as_bytes(), "url", None).is_err());
    }

    #[test]
    fn urlset_locs_extracted() {
        let xml = r#"<?xml version="1.0"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
                <url><loc>https://example.com/a</loc></url>
                <url><loc>https://example.com/b</loc><lastmod>2024-01-01</lastmod></url>
            </urlset>"#;
        let urls = parse_urlset(xml).unwrap();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }
}
