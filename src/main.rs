mod analyzer;
mod db;
mod export;
mod fetcher;
mod ingest;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::bail;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "schemascope", about = "JSON-LD structured-data auditor for batches of pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Populate the URL queue from a CSV column or a sitemap
    Init {
        /// CSV file with one URL per row
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Header name of the URL column
        #[arg(long, default_value = "url")]
        column: String,
        /// Sitemap URL (urlset XML) as an alternative source
        #[arg(long)]
        sitemap: Option<String>,
        /// Max URLs to ingest (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch unvisited pages
    Fetch {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Classify structured data on fetched pages
    Analyze {
        /// Max pages to analyze (default: all unanalyzed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Fetch + analyze in one pipeline
    Run {
        /// Max pages to fetch+analyze
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Queue counters and schema-type coverage percentages
    Stats,
    /// Per-page results table
    Overview {
        /// Only pages whose root types include this token
        #[arg(short = 't', long = "type")]
        type_filter: Option<String>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Publication dates and live-blog update cadence
    Freshness,
    /// Pages where a parent type contains a child type or named property
    Contains {
        /// Parent schema type (e.g. NewsArticle)
        parent: String,
        /// Child type or property name (e.g. ImageObject)
        child: String,
    },
    /// Flat CSV of all page reports
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { csv, column, sitemap, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let mut urls = match (&csv, &sitemap) {
                (Some(path), None) => ingest::read_csv_urls(path, &column, limit)?,
                (None, Some(url)) => ingest::fetch_sitemap_urls(url).await?,
                _ => bail!("Pass exactly one of --csv or --sitemap"),
            };
            if let Some(n) = limit {
                urls.truncate(n);
            }
            let inserted = db::insert_pages(&conn, &urls)?;
            println!("Inserted {} new URLs ({} total found)", inserted, urls.len());
            Ok(())
        }
        Commands::Fetch { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetcher::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Analyze { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unanalyzed(&conn, limit)?;
            if pages.is_empty() {
                println!("No unanalyzed pages. Run 'fetch' first.");
                return Ok(());
            }
            println!("Analyzing {} pages...", pages.len());
            let counts = analyze_pages(&conn, &pages)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first.");
                return Ok(());
            }

            // Phase 1: Fetch (streaming to DB)
            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} pages (streaming to DB)...", pages.len());
            let stats = fetcher::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_fetch.elapsed().as_secs_f64()
            );

            // Phase 2: Analyze
            let t_analyze = Instant::now();
            let pending = db::fetch_unanalyzed(&conn, None)?;
            if pending.is_empty() {
                println!("Nothing to analyze (all fetched pages had errors).");
                return Ok(());
            }
            println!("Analyzing {} pages...", pending.len());
            let counts = analyze_pages(&conn, &pending)?;
            println!("Analyzed in {:.1}s", t_analyze.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:     {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.fetched);
            println!("Errors:    {}", s.errors);
            println!("Analyzed:  {}", s.analyzed);

            let rows = db::fetch_overview(&conn)?;
            if !rows.is_empty() {
                let pct = |count: usize| (count as f64 / rows.len() as f64 * 1000.0).round() / 10.0;
                let with_root = |t: &str| rows.iter().filter(|r| r.has_root_type(t)).count();
                println!("\n--- Coverage ({} pages analyzed) ---", rows.len());
                println!("NewsArticle:     {:>5.1}%", pct(with_root("NewsArticle")));
                println!("Article:         {:>5.1}%", pct(with_root("Article")));
                println!("VideoObject:     {:>5.1}%", pct(with_root("VideoObject")));
                println!("LiveBlogPosting: {:>5.1}%", pct(with_root("LiveBlogPosting")));
                println!(
                    "Author present:  {:>5.1}%",
                    pct(rows.iter().filter(|r| r.has_author).count())
                );
            }
            Ok(())
        }
        Commands::Overview { type_filter, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let mut rows = db::fetch_overview(&conn)?;
            if let Some(t) = &type_filter {
                rows.retain(|r| r.has_root_type(t));
            }
            rows.truncate(limit);
            if rows.is_empty() {
                println!("No analyzed pages found.");
                return Ok(());
            }

            // Compact, readable table
            println!(
                "{:>3} | {:<40} | {:>3} | {:<28} | {:<24} | {:<16}",
                "#", "URL", "St", "Root types", "Nested types", "Author"
            );
            println!("{}", "-".repeat(128));

            for (i, r) in rows.iter().enumerate() {
                let url = truncate(&r.url, 40);
                let roots = truncate(&r.root_types, 28);
                let nested = truncate(&r.nested_types, 24);
                let author = truncate(r.author_name.as_deref().unwrap_or("-"), 16);
                let status = r.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into());

                println!(
                    "{:>3} | {:<40} | {:>3} | {:<28} | {:<24} | {:<16}",
                    i + 1, url, status, roots, nested, author
                );
            }

            // Parse failures (separate section to avoid clutter)
            let with_errors: Vec<_> = rows.iter().filter(|r| r.parse_errors.is_some()).collect();
            if !with_errors.is_empty() {
                println!("\n--- Parse errors ---");
                for r in &with_errors {
                    println!(
                        "  {}: {}",
                        truncate(&r.url, 40),
                        r.parse_errors.as_deref().unwrap_or("")
                    );
                }
            }

            println!("\n{} pages", rows.len());
            Ok(())
        }
        Commands::Freshness => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn)?;
            if rows.is_empty() {
                println!("No analyzed pages found.");
                return Ok(());
            }

            let news: Vec<_> = rows.iter().filter(|r| r.has_root_type("NewsArticle")).collect();
            println!("--- NewsArticle dates ({}) ---", news.len());
            for r in &news {
                println!(
                    "  {:<44} pub {:<20} mod {:<20}",
                    truncate(&r.url, 44),
                    r.published_at.as_deref().unwrap_or("-"),
                    r.modified_at.as_deref().unwrap_or("-"),
                );
            }

            let live: Vec<_> = rows
                .iter()
                .filter(|r| r.has_root_type("LiveBlogPosting"))
                .collect();
            println!("\n--- Live blog update cadence ({}) ---", live.len());
            for r in &live {
                println!(
                    "  {:<44} {:>3} updates, every {:>6.1} min, created {}",
                    truncate(&r.url, 44),
                    r.lb_update_count,
                    r.lb_avg_minutes,
                    r.lb_created_at.as_deref().unwrap_or("-"),
                );
            }
            Ok(())
        }
        Commands::Contains { parent, child } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_pages_with_html(&conn)?;
            if pages.is_empty() {
                println!("No fetched pages. Run 'fetch' first.");
                return Ok(());
            }
            let mut hits = 0usize;
            for p in &pages {
                let (blocks, _) = analyzer::blocks::extract_blocks(&p.html);
                if analyzer::nesting::contains_nested(&blocks, &parent, &child) {
                    hits += 1;
                    println!("  {}", p.url);
                }
            }
            println!("\n{}/{} pages have a {} containing {}", hits, pages.len(), parent, child);
            Ok(())
        }
        Commands::Export { output } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_overview(&conn)?;
            let written = export::export_csv(&rows, output.as_ref())?;
            if let Some(path) = output {
                println!("Exported {} rows to {}", written, path.display());
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct AnalyzeCounts {
    pages: usize,
    with_markup: usize,
    live_blogs: usize,
    parse_errors: usize,
}

impl AnalyzeCounts {
    fn print(&self) {
        println!(
            "Saved {} page reports: {} with structured data, {} live blogs, {} parse errors.",
            self.pages, self.with_markup, self.live_blogs, self.parse_errors,
        );
    }
}

fn analyze_pages(
    conn: &rusqlite::Connection,
    pages: &[db::FetchedPage],
) -> anyhow::Result<AnalyzeCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = AnalyzeCounts {
        pages: 0,
        with_markup: 0,
        live_blogs: 0,
        parse_errors: 0,
    };

    for chunk in pages.chunks(500) {
        let results: Vec<_> = chunk
            .par_iter()
            .map(|p| (p.page_data_id, p.url.as_str(), analyzer::analyze_html(&p.html)))
            .collect();

        let mut rows = Vec::with_capacity(results.len());
        for (page_data_id, url, analysis) in results {
            counts.pages += 1;
            if analysis.block_count > 0 {
                counts.with_markup += 1;
            }
            if analysis.root_types.iter().any(|t| t == "LiveBlogPosting") {
                counts.live_blogs += 1;
            }
            counts.parse_errors += analysis.parse_errors.len();
            rows.push(report_row(page_data_id, url, analysis));
        }

        db::save_reports(conn, &rows)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn report_row(page_data_id: i64, url: &str, a: analyzer::PageAnalysis) -> db::ReportRow {
    db::ReportRow {
        page_data_id,
        url: url.to_string(),
        root_types: a.root_types.join(", "),
        nested_types: a.nested_types.join(", "),
        has_author: a.has_author,
        author_name: a.author_name,
        published_at: a.published_at,
        modified_at: a.modified_at,
        block_count: a.block_count as i64,
        parse_errors: if a.parse_errors.is_empty() {
            None
        } else {
            Some(a.parse_errors.join("; "))
        },
        lb_update_count: a.live_blog.update_count as i64,
        lb_avg_minutes: a.live_blog.avg_interval_minutes,
        lb_created_at: a.live_blog.created_at,
        lb_modified_at: a.live_blog.last_modified_at,
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_row_flattens_analysis() {
        let html = r#"<script type="application/ld+json">
            {"@type": "NewsArticle",
             "author": {"name": "Jane Doe"},
             "datePublished": "2024-01-05T08:00:00Z",
             "image": {"@type": "ImageObject"}}
        </script>"#;
        let row = report_row(7, "https://a.example", analyzer::analyze_html(html));
        assert_eq!(row.page_data_id, 7);
        assert_eq!(row.root_types, "NewsArticle");
        assert_eq!(row.nested_types, "ImageObject");
        assert!(row.has_author);
        assert_eq!(row.published_at.as_deref(), Some("2024-01-05T08:00:00"));
        assert_eq!(row.block_count, 1);
        assert!(row.parse_errors.is_none());
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a-much-longer-string", 6), "a-much...");
    }
}
