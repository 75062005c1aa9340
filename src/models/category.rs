use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// A news category (the taxonomy behind the tabbed layout).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl NewsCategory {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(NewsCategory {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
        })
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare("SELECT * FROM news_categories ORDER BY name") {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Categories with at least one published post.
    pub fn list_non_empty(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT DISTINCT c.* FROM news_categories c
             JOIN news_post_categories pc ON pc.category_id = c.id
             JOIN news_posts p ON p.id = pc.post_id
             WHERE p.status = 'published'
             ORDER BY c.name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn for_post(pool: &DbPool, post_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT c.* FROM news_categories c
             JOIN news_post_categories pc ON pc.category_id = c.id
             WHERE pc.post_id = ?1
             ORDER BY c.name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![post_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, name: &str, slug: &str) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let slug = if slug.trim().is_empty() {
            slug::slugify(name)
        } else {
            slug.trim().to_string()
        };
        conn.execute(
            "INSERT INTO news_categories (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    pub fn set_for_post(pool: &DbPool, post_id: i64, category_ids: &[i64]) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "DELETE FROM news_post_categories WHERE post_id = ?1",
            params![post_id],
        )
        .map_err(|e| e.to_string())?;
        for cid in category_ids {
            conn.execute(
                "INSERT OR IGNORE INTO news_post_categories (post_id, category_id) VALUES (?1, ?2)",
                params![post_id, cid],
            )
            .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}
