use anyhow::Result;
use rusqlite::Connection;

const DB_PATH: &str = "data/schemascope.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id         INTEGER PRIMARY KEY,
            url        TEXT UNIQUE NOT NULL,
            visited    BOOLEAN NOT NULL DEFAULT 0,
            visited_at TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            url        TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_page ON page_data(page_id);

        CREATE TABLE IF NOT EXISTS page_report (
            id              INTEGER PRIMARY KEY,
            page_data_id    INTEGER NOT NULL REFERENCES page_data(id),
            url             TEXT NOT NULL,
            root_types      TEXT NOT NULL DEFAULT '',
            nested_types    TEXT NOT NULL DEFAULT '',
            has_author      BOOLEAN NOT NULL DEFAULT 0,
            author_name     TEXT,
            published_at    TEXT,
            modified_at     TEXT,
            block_count     INTEGER NOT NULL DEFAULT 0,
            parse_errors    TEXT,
            lb_update_count INTEGER NOT NULL DEFAULT 0,
            lb_avg_minutes  REAL NOT NULL DEFAULT 0,
            lb_created_at   TEXT,
            lb_modified_at  TEXT,
            analyzed_at     TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_report_page_data ON page_report(page_data_id);
        CREATE INDEX IF NOT EXISTS idx_report_url ON page_report(url);
        ",
    )?;
    Ok(())
}

// ── URL queue ──

pub fn insert_pages(conn: &Connection, urls: &[String]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("INSERT OR IGNORE INTO pages (url) VALUES (?1)")?;
        for url in urls {
            count += stmt.execute(rusqlite::params![url])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn fetch_unvisited(conn: &Connection, limit: Option<usize>) -> Result<Vec<(i64, String)>> {
    let sql = match limit {
        Some(n) => format!("SELECT id, url FROM pages WHERE visited = 0 ORDER BY id LIMIT {}", n),
        None => "SELECT id, url FROM pages WHERE visited = 0 ORDER BY id".to_string(),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Fetching ──

pub struct FetchRow {
    pub page_id: i64,
    pub url: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Analysis ──

pub struct FetchedPage {
    pub page_data_id: i64,
    pub url: String,
    pub html: String,
}

/// Fetched pages with markup that have no report row yet.
pub fn fetch_unanalyzed(conn: &Connection, limit: Option<usize>) -> Result<Vec<FetchedPage>> {
    let sql = format!(
        "SELECT pd.id, pd.url, pd.html
         FROM page_data pd
         LEFT JOIN page_report pr ON pr.page_data_id = pd.id
         WHERE pd.html IS NOT NULL AND pr.id IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FetchedPage {
                page_data_id: row.get(0)?,
                url: row.get(1)?,
                html: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All fetched pages with markup, reported or not.
pub fn fetch_pages_with_html(conn: &Connection) -> Result<Vec<FetchedPage>> {
    let mut stmt =
        conn.prepare("SELECT id, url, html FROM page_data WHERE html IS NOT NULL ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FetchedPage {
                page_data_id: row.get(0)?,
                url: row.get(1)?,
                html: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ReportRow {
    pub page_data_id: i64,
    pub url: String,
    pub root_types: String,
    pub nested_types: String,
    pub has_author: bool,
    pub author_name: Option<String>,
    pub published_at: Option<String>,
    pub modified_at: Option<String>,
    pub block_count: i64,
    pub parse_errors: Option<String>,
    pub lb_update_count: i64,
    pub lb_avg_minutes: f64,
    pub lb_created_at: Option<String>,
    pub lb_modified_at: Option<String>,
}

pub fn save_reports(conn: &Connection, rows: &[ReportRow]) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO page_report
             (page_data_id, url, root_types, nested_types, has_author, author_name,
              published_at, modified_at, block_count, parse_errors,
              lb_update_count, lb_avg_minutes, lb_created_at, lb_modified_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14)",
        )?;
        for r in rows {
            stmt.execute(rusqlite::params![
                r.page_data_id, r.url, r.root_types, r.nested_types, r.has_author,
                r.author_name, r.published_at, r.modified_at, r.block_count,
                r.parse_errors, r.lb_update_count, r.lb_avg_minutes,
                r.lb_created_at, r.lb_modified_at,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Reporting ──

pub struct OverviewRow {
    pub url: String,
    pub status: Option<i64>,
    pub root_types: String,
    pub nested_types: String,
    pub has_author: bool,
    pub author_name: Option<String>,
    pub published_at: Option<String>,
    pub modified_at: Option<String>,
    pub lb_update_count: i64,
    pub lb_avg_minutes: f64,
    pub lb_created_at: Option<String>,
    pub lb_modified_at: Option<String>,
    pub parse_errors: Option<String>,
}

impl OverviewRow {
    /// Exact token match against the comma-joined type list.
    pub fn has_root_type(&self, token: &str) -> bool {
        self.root_types.split(", ").any(|t| t == token)
    }

    pub fn has_any_type(&self, token: &str) -> bool {
        self.has_root_type(token) || self.nested_types.split(", ").any(|t| t == token)
    }
}

pub fn fetch_overview(conn: &Connection) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT pr.url, pd.status, pr.root_types, pr.nested_types, pr.has_author,
                pr.author_name, pr.published_at, pr.modified_at,
                pr.lb_update_count, pr.lb_avg_minutes, pr.lb_created_at,
                pr.lb_modified_at, pr.parse_errors
         FROM page_report pr
         JOIN page_data pd ON pd.id = pr.page_data_id
         ORDER BY pr.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(OverviewRow {
                url: row.get(0)?,
                status: row.get(1)?,
                root_types: row.get(2)?,
                nested_types: row.get(3)?,
                has_author: row.get(4)?,
                author_name: row.get(5)?,
                published_at: row.get(6)?,
                modified_at: row.get(7)?,
                lb_update_count: row.get(8)?,
                lb_avg_minutes: row.get(9)?,
                lb_created_at: row.get(10)?,
                lb_modified_at: row.get(11)?,
                parse_errors: row.get(12)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub fetched: usize,
    pub errors: usize,
    pub analyzed: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let visited: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE visited = 1", [], |r| r.get(0))?;
    let fetched: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let analyzed: usize =
        conn.query_row("SELECT COUNT(*) FROM page_report", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        visited,
        unvisited: total - visited,
        fetched,
        errors,
        analyzed,
    })
}

// ── Tests ──
