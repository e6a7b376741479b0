pub mod author;
pub mod blocks;
pub mod dates;
pub mod liveblog;
pub mod nesting;
pub mod types;
pub mod walk;

use serde_json::Value;

pub use liveblog::LiveBlogSummary;

/// Everything derived from one page's structured-data markup.
#[derive(Debug, Default, Clone)]
pub struct PageAnalysis {
    pub root_types: Vec<String>,
    pub nested_types: Vec<String>,
    pub has_author: bool,
    pub author_name: Option<String>,
    pub published_at: Option<String>,
    pub modified_at: Option<String>,
    pub live_blog: LiveBlogSummary,
    pub block_count: usize,
    pub parse_errors: Vec<String>,
}

/// Full pipeline for one page: html → JSON-LD blocks → classification.
pub fn analyze_html(html: &str) -> PageAnalysis {
    let (blocks, parse_errors) = blocks::extract_blocks(html);
    analyze_blocks(&blocks, parse_errors)
}

/// Classify already-parsed blocks. Each page is analyzed independently;
/// nothing here touches shared state.
pub fn analyze_blocks(blocks: &[Value], parse_errors: Vec<String>) -> PageAnalysis {
    let summary = types::classify(blocks);
    let authorship = author::detect(blocks);
    let live_blog = liveblog::analyze(blocks);

    let author_name = if authorship.has_author {
        Some(authorship.name.unwrap_or_else(|| author::UNIDENTIFIED.to_string()))
    } else {
        None
    };

    PageAnalysis {
        root_types: summary.roots,
        nested_types: summary.nested,
        has_author: authorship.has_author,
        author_name,
        published_at: summary.published.as_deref().map(dates::display),
        modified_at: summary.modified.as_deref().map(dates::display),
        live_blog,
        block_count: blocks.len(),
        parse_errors,
    }
}

// ── Tests ──
