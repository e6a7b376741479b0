use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rusqlite::Connection;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::db::FetchRow;

const CONCURRENCY: usize = 10;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const FETCH_TIMEOUT_SECS: u64 = 20;
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Fetch stats returned after completion.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Fetch pages concurrently, saving each result to DB as it arrives.
/// A failed request becomes a row with a populated error, never a panic.
pub async fn fetch_pages_streaming(
    conn: &Connection,
    pages: Vec<(i64, String)>,
) -> Result<FetchStats> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let total = pages.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop saves to DB
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for (page_id, url) in pages {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let row = fetch_with_retry(&client, page_id, &url).await;
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    // Prepare statements once, reuse for each row
    let mut insert_stmt = conn.prepare(
        "INSERT INTO page_data (page_id, url, html, status, error, latency_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    let mut update_stmt =
        conn.prepare("UPDATE pages SET visited = 1, visited_at = datetime('now') WHERE id = ?1")?;

    while let Some(row) = rx.recv().await {
        if row.error.is_some() {
            errors += 1;
        } else {
            ok += 1;
        }

        insert_stmt.execute(rusqlite::params![
            row.page_id, row.url, row.html, row.status, row.error, row.latency_ms,
        ])?;
        update_stmt.execute(rusqlite::params![row.page_id])?;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

async fn fetch_with_retry(client: &Client, page_id: i64, url: &str) -> FetchRow {
    for attempt in 0..=MAX_RETRIES {
        let row = fetch_one(client, page_id, url).await;

        let should_retry = matches!(row.status, Some(429 | 500 | 502 | 503));
        if !should_retry || attempt == MAX_RETRIES {
            return row;
        }

        let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
        warn!(
            "Status {:?} on {} (attempt {}/{}), backing off {:.1}s",
            row.status,
            url,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
    }

    fetch_one(client, page_id, url).await
}

async fn fetch_one(client: &Client, page_id: i64, url: &str) -> FetchRow {
    let start = Instant::now();
    let response = client.get(url).send().await;
    let elapsed = start.elapsed().as_millis() as i64;

    match response {
        Ok(resp) => {
            let status = resp.status().as_u16() as i32;
            match resp.text().await {
                Ok(body) => FetchRow {
                    page_id,
                    url: url.to_string(),
                    html: Some(body),
                    status: Some(status),
                    error: None,
                    latency_ms: Some(elapsed),
                },
                Err(e) => FetchRow {
                    page_id,
                    url: url.to_string(),
                    html: None,
                    status: Some(status),
                    error: Some(e.to_string()),
                    latency_ms: Some(elapsed),
                },
            }
        }
        Err(e) => FetchRow {
            page_id,
            url: url.to_string(),
            html: None,
            status: e.status().map(|s| s.as_u16() as i32),
            error: Some(e.to_string()),
            latency_ms: Some(elapsed),
        },
    }
}
