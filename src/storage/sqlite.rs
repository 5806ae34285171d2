//! SQLite storage implementation

use crate::state::PageEntry;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageResult, Store};
use crate::storage::{
    LinkRecord, NewLink, PageRecord, SiteLinkRecord, SiteRecord, StorageError, SweepSummary,
};
use crate::CrawlError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let conn = Connection::open(path).map_err(StorageError::Sqlite)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::Sqlite)?;

        initialize_schema(&conn).map_err(StorageError::Sqlite)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory().map_err(StorageError::Sqlite)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StorageError::Sqlite)?;
        initialize_schema(&conn).map_err(StorageError::Sqlite)?;
        Ok(Self { conn })
    }

    fn site_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SiteRecord> {
        Ok(SiteRecord {
            id: row.get(0)?,
            url: row.get(1)?,
            run_id: row.get(2)?,
            run_started_at: row.get(3)?,
        })
    }

    fn page_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageRecord> {
        Ok(PageRecord {
            id: row.get(0)?,
            site_id: row.get(1)?,
            url: row.get(2)?,
            hash: row.get(3)?,
            run_id: row.get(4)?,
            crawled_at: row.get(5)?,
        })
    }

    fn link_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LinkRecord> {
        Ok(LinkRecord {
            id: row.get(0)?,
            site_id: row.get(1)?,
            page_id: row.get(2)?,
            url: row.get(3)?,
            text: row.get(4)?,
            score: row.get(5)?,
            keywords: row.get(6)?,
            run_id: row.get(7)?,
        })
    }
}

impl Store for SqliteStore {
    // ===== Run lifecycle =====

    fn begin_run(&mut self, site_url: &str) -> StorageResult<(i64, i64)> {
        let now = Utc::now().to_rfc3339();
        let result = self.conn.query_row(
            "INSERT INTO sites (url, run_id, run_started_at) VALUES (?1, 1, ?2)
             ON CONFLICT(url) DO UPDATE SET
                 run_id = sites.run_id + 1,
                 run_started_at = excluded.run_started_at
             RETURNING id, run_id",
            params![site_url, now],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(result)
    }

    fn load_pages(&self, site_id: i64) -> StorageResult<HashMap<String, PageEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, id, hash, run_id FROM pages WHERE site_id = ?1")?;

        let mut pages = HashMap::new();
        let rows = stmt.query_map(params![site_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                PageEntry {
                    id: row.get(1)?,
                    hash: row.get(2)?,
                    run_id: row.get(3)?,
                },
            ))
        })?;

        for row in rows {
            let (url, entry) = row?;
            pages.insert(url, entry);
        }

        Ok(pages)
    }

    fn upsert_page(
        &mut self,
        site_id: i64,
        url: &str,
        hash: &str,
        run_id: i64,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let id = self.conn.query_row(
            "INSERT INTO pages (site_id, url, hash, run_id, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(site_id, url) DO UPDATE SET
                 hash = excluded.hash,
                 run_id = excluded.run_id,
                 crawled_at = excluded.crawled_at
             RETURNING id",
            params![site_id, url, hash, run_id, now],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_link(&mut self, link: &NewLink) -> StorageResult<i64> {
        let id = self.conn.query_row(
            "INSERT INTO links (site_id, page_id, url, text, score, keywords, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(page_id, url) DO UPDATE SET
                 text = excluded.text,
                 score = excluded.score,
                 keywords = excluded.keywords,
                 run_id = excluded.run_id
             RETURNING id",
            params![
                link.site_id,
                link.page_id,
                link.url,
                link.text,
                link.score,
                link.keywords,
                link.run_id
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn refresh_links(&mut self, page_id: i64, run_id: i64) -> StorageResult<usize> {
        let touched = self.conn.execute(
            "UPDATE links SET run_id = ?1 WHERE page_id = ?2",
            params![run_id, page_id],
        )?;
        Ok(touched)
    }

    fn sweep_stale(&mut self, site_id: i64, run_id: i64) -> StorageResult<SweepSummary> {
        let tx = self.conn.transaction()?;

        // Stale pages go first; cascade takes their links with them
        let pages_deleted = tx.execute(
            "DELETE FROM pages WHERE site_id = ?1 AND run_id < ?2",
            params![site_id, run_id],
        )?;

        // What remains are stale links sitting on pages that survived
        let links_deleted = tx.execute(
            "DELETE FROM links WHERE site_id = ?1 AND run_id < ?2",
            params![site_id, run_id],
        )?;

        tx.commit()?;

        Ok(SweepSummary {
            pages_deleted,
            links_deleted,
        })
    }

    // ===== Read surface =====

    fn get_site(&self, site_id: i64) -> StorageResult<SiteRecord> {
        self.conn
            .query_row(
                "SELECT id, url, run_id, run_started_at FROM sites WHERE id = ?1",
                params![site_id],
                Self::site_from_row,
            )
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn get_site_by_url(&self, url: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .conn
            .query_row(
                "SELECT id, url, run_id, run_started_at FROM sites WHERE url = ?1",
                params![url],
                Self::site_from_row,
            )
            .optional()?;
        Ok(site)
    }

    fn list_pages(&self, site_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, url, hash, run_id, crawled_at
             FROM pages WHERE site_id = ?1 ORDER BY url",
        )?;

        let pages = stmt
            .query_map(params![site_id], Self::page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn get_page(&self, page_id: i64) -> StorageResult<PageRecord> {
        self.conn
            .query_row(
                "SELECT id, site_id, url, hash, run_id, crawled_at FROM pages WHERE id = ?1",
                params![page_id],
                Self::page_from_row,
            )
            .optional()?
            .ok_or(StorageError::PageNotFound(page_id))
    }

    fn list_links_for_site(&self, site_id: i64) -> StorageResult<Vec<SiteLinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.site_id, l.page_id, l.url, l.text, l.score, l.keywords, l.run_id,
                    p.url
             FROM links l JOIN pages p ON l.page_id = p.id
             WHERE l.site_id = ?1
             ORDER BY l.score DESC, l.id",
        )?;

        let links = stmt
            .query_map(params![site_id], |row| {
                Ok(SiteLinkRecord {
                    link: Self::link_from_row(row)?,
                    page_url: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn list_links_for_page(&self, page_id: i64) -> StorageResult<Vec<LinkRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, site_id, page_id, url, text, score, keywords, run_id
             FROM links WHERE page_id = ?1 ORDER BY score DESC, id",
        )?;

        let links = stmt
            .query_map(params![page_id], Self::link_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn get_link(&self, link_id: i64) -> StorageResult<LinkRecord> {
        self.conn
            .query_row(
                "SELECT id, site_id, page_id, url, text, score, keywords, run_id
                 FROM links WHERE id = ?1",
                params![link_id],
                Self::link_from_row,
            )
            .optional()?
            .ok_or(StorageError::LinkNotFound(link_id))
    }

    fn count_pages(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_links(&self, site_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE site_id = ?1",
            params![site_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Deletion =====

    fn delete_site(&mut self, site_id: i64) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;
        Ok(deleted > 0)
    }

    fn delete_page(&mut self, page_id: i64) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM pages WHERE id = ?1", params![page_id])?;
        Ok(deleted > 0)
    }

    fn delete_link(&mut self, link_id: i64) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM links WHERE id = ?1", params![link_id])?;
        Ok(deleted > 0)
    }
}
