//! Database schema definitions
//!
//! Three tables: one row per site, one row per page under a site, and the
//! scored links discovered on those pages. Pages and links carry the run
//! counter of the last run that touched them; the staleness sweep deletes
//! rows whose counter lags the site's current one. Foreign keys cascade so
//! deleting a site or page removes everything under it.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    run_id INTEGER NOT NULL DEFAULT 0,
    run_started_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    hash TEXT NOT NULL,
    run_id INTEGER NOT NULL,
    crawled_at TEXT NOT NULL,
    UNIQUE(site_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_site ON pages(site_id);
CREATE INDEX IF NOT EXISTS idx_pages_site_run ON pages(site_id, run_id);

CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id) ON DELETE CASCADE,
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    text TEXT NOT NULL DEFAULT '',
    score REAL NOT NULL,
    keywords TEXT NOT NULL,
    run_id INTEGER NOT NULL,
    UNIQUE(page_id, url)
);

CREATE INDEX IF NOT EXISTS idx_links_site_score ON links(site_id, score);
CREATE INDEX IF NOT EXISTS idx_links_page ON links(page_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["sites", "pages", "links"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_page_unique_per_site_not_global() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute_batch(
            "INSERT INTO sites (url, run_id, run_started_at) VALUES ('https://a.test/', 1, 'now');
             INSERT INTO sites (url, run_id, run_started_at) VALUES ('https://b.test/', 1, 'now');",
        )
        .unwrap();

        // Same URL under two different sites is fine
        conn.execute(
            "INSERT INTO pages (site_id, url, hash, run_id, crawled_at) VALUES (1, '/p', 'h', 1, 'now')",
            [],
        )
        .unwrap();
        let ok = conn.execute(
            "INSERT INTO pages (site_id, url, hash, run_id, crawled_at) VALUES (2, '/p', 'h', 1, 'now')",
            [],
        );
        assert!(ok.is_ok());

        // Duplicate under the same site violates the constraint
        let dup = conn.execute(
            "INSERT INTO pages (site_id, url, hash, run_id, crawled_at) VALUES (1, '/p', 'h', 1, 'now')",
            [],
        );
        assert!(dup.is_err());
    }
}
