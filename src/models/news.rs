use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::models::category::NewsCategory;
use crate::render::dates::{format_php, parse_datetime};
use crate::render::tokens::is_extra_field;
use crate::render::{html_escape, strip_tags, truncate_words, Record};
use crate::store::Store;

pub const PINNED_META: &str = "andw_news_pinned";
pub const DEFAULT_PER_PAGE: i64 = 10;
const EXCERPT_WORDS: usize = 20;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewsPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub status: String,
    pub published_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewsForm {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub status: String,
    pub published_at: Option<String>,
}

/// Listing parameters shared by the shortcode, the block and the tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsQuery {
    pub per_page: i64,
    pub cats: Vec<i64>,
    pub pinned_first: bool,
    pub exclude_expired: bool,
}

impl Default for NewsQuery {
    fn default() -> Self {
        NewsQuery {
            per_page: DEFAULT_PER_PAGE,
            cats: Vec::new(),
            pinned_first: false,
            exclude_expired: false,
        }
    }
}

impl NewsQuery {
    fn limit(&self) -> i64 {
        if self.per_page > 0 {
            self.per_page
        } else {
            DEFAULT_PER_PAGE
        }
    }
}

fn parse_form_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
}

impl NewsPost {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(NewsPost {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            content: row.get("content")?,
            excerpt: row.get("excerpt")?,
            thumbnail: row.get("thumbnail")?,
            status: row.get("status")?,
            published_at: row.get("published_at")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM news_posts WHERE id = ?1",
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn create(pool: &DbPool, form: &NewsForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        let published_at = form.published_at.as_deref().and_then(parse_form_datetime);
        let slug = if form.slug.trim().is_empty() {
            slug::slugify(&form.title)
        } else {
            form.slug.trim().to_string()
        };

        conn.execute(
            "INSERT INTO news_posts (title, slug, content, excerpt, thumbnail, status, published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.title,
                slug,
                form.content,
                form.excerpt,
                form.thumbnail,
                form.status,
                published_at,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    pub fn set_meta(pool: &DbPool, post_id: i64, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO news_meta (post_id, meta_key, meta_value) VALUES (?1, ?2, ?3)
             ON CONFLICT(post_id, meta_key) DO UPDATE SET meta_value = ?3",
            params![post_id, key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn meta(pool: &DbPool, post_id: i64) -> HashMap<String, String> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };
        let mut stmt = match conn
            .prepare("SELECT meta_key, meta_value FROM news_meta WHERE post_id = ?1")
        {
            Ok(s) => s,
            Err(_) => return HashMap::new(),
        };
        stmt.query_map(params![post_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    /// Published posts matching `query`. `today` is only consulted when the
    /// query excludes expired events.
    pub fn query(pool: &DbPool, query: &NewsQuery, today: NaiveDate) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut sql = String::from(
            "SELECT p.* FROM news_posts p
             LEFT JOIN news_meta pin ON pin.post_id = p.id AND pin.meta_key = 'andw_news_pinned'
             WHERE p.status = 'published'",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if !query.cats.is_empty() {
            let placeholders: Vec<String> = (0..query.cats.len())
                .map(|i| format!("?{}", i + 1))
                .collect();
            sql.push_str(&format!(
                " AND p.id IN (SELECT post_id FROM news_post_categories WHERE category_id IN ({}))",
                placeholders.join(", ")
            ));
            for cid in &query.cats {
                params_vec.push(Box::new(*cid));
            }
        }

        if query.pinned_first {
            sql.push_str(
                " ORDER BY CASE WHEN pin.meta_value IN ('1', 'true') THEN 1 ELSE 0 END DESC,
                 p.published_at DESC, p.id DESC",
            );
        } else {
            sql.push_str(" ORDER BY p.published_at DESC, p.id DESC");
        }

        // Expiry is decided in Rust, so the limit is applied afterwards
        if !query.exclude_expired {
            sql.push_str(&format!(" LIMIT ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(query.limit()));
        }

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("News query failed to prepare: {}", e);
                return vec![];
            }
        };

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let posts: Vec<Self> = stmt
            .query_map(params_refs.as_slice(), Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default();

        if !query.exclude_expired {
            return posts;
        }
        drop(stmt);
        drop(conn);

        posts
            .into_iter()
            .filter(|p| !is_expired(&Self::meta(pool, p.id), today))
            .take(query.limit() as usize)
            .collect()
    }

    /// Own URL under the site's news path.
    pub fn permalink(&self, site_url: &str) -> String {
        format!("{}/news/{}", site_url.trim_end_matches('/'), self.slug)
    }

    /// Build the record the renderer sees for this post.
    pub fn to_record(&self, store: &dyn Store) -> Record {
        let meta = store.news_meta(self.id);
        let site_url = store.setting_get_or("site_url", "");
        let date_format = store.setting_get_or("news_date_format", "Y.m.d");
        let m = |key: &str| meta.get(key).map(String::as_str).unwrap_or("");

        let pinned = matches!(m(PINNED_META), "1" | "true");
        let mut record = Record::new()
            .with("id", self.id.to_string())
            .with("slug", self.slug.as_str())
            .with("title", html_escape(&self.title))
            .with("excerpt", self.excerpt_text())
            .with("thumbnail", self.thumbnail_html())
            .with("link_url", html_escape(&self.link_url(store, &meta, &site_url)))
            .with("link_target", html_escape(non_empty_or(m("andw_link_target"), "_self")))
            .with("event_date", event_date_html(&meta))
            .with("pinned", pinned)
            .with("andw-news-pinned", if pinned { "1" } else { "0" })
            .with("categories", categories_html(&store.news_categories_for(self.id)));

        match self.published_at {
            Some(at) => {
                record.set("date", format_php(&at, &date_format));
                record.set("date_raw", at.format("%Y-%m-%d %H:%M:%S").to_string());
            }
            None => {
                record.set("date", "");
                record.set("date_raw", "");
            }
        }

        for (key, value) in &meta {
            if is_extra_field(key) && !record.contains(key) {
                record.set(key, html_escape(value));
            }
        }
        record
    }

    fn excerpt_text(&self) -> String {
        match self.excerpt.as_deref().map(str::trim) {
            Some(e) if !e.is_empty() => html_escape(e),
            _ => html_escape(&truncate_words(&strip_tags(&self.content), EXCERPT_WORDS, "...")),
        }
    }

    fn thumbnail_html(&self) -> String {
        match self.thumbnail.as_deref().map(str::trim) {
            Some(src) if !src.is_empty() => format!(
                "<img src=\"{}\" alt=\"{}\" class=\"andw-news-thumbnail\" loading=\"lazy\">",
                html_escape(src),
                html_escape(&self.title)
            ),
            _ => String::new(),
        }
    }

    fn link_url(&self, store: &dyn Store, meta: &HashMap<String, String>, site_url: &str) -> String {
        let m = |key: &str| meta.get(key).map(String::as_str).unwrap_or("").trim();
        match m("andw_link_type") {
            "internal" => {
                let target = m("andw_internal_link")
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| store.news_find_by_id(id));
                if let Some(target) = target {
                    return target.permalink(site_url);
                }
            }
            "external" => {
                let url = m("andw_external_link");
                if !url.is_empty() && !is_script_url(url) {
                    return url.to_string();
                }
            }
            _ => {}
        }
        self.permalink(site_url)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn is_script_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("javascript:") || lower.starts_with("vbscript:") || lower.starts_with("data:")
}

fn display_date(raw: &str) -> String {
    parse_datetime(raw)
        .map(|dt| format_php(&dt, "Y.m.d"))
        .unwrap_or_else(|| raw.to_string())
}

/// Pre-rendered event markup for the `{event_date}` token.
pub fn event_date_html(meta: &HashMap<String, String>) -> String {
    let m = |key: &str| meta.get(key).map(String::as_str).unwrap_or("").trim();
    match m("andw_event_type") {
        "single" => {
            let date = m("andw_event_single_date");
            if date.is_empty() {
                return String::new();
            }
            format!(
                "<span class=\"andw-event-date\">{}</span>",
                html_escape(&display_date(date))
            )
        }
        "period" => {
            let (start, end) = (m("andw_event_start_date"), m("andw_event_end_date"));
            if start.is_empty() || end.is_empty() {
                return String::new();
            }
            format!(
                "<span class=\"andw-event-period\">{}</span>",
                html_escape(&format!("{} - {}", display_date(start), display_date(end)))
            )
        }
        "free-text" => {
            let text = m("andw_event_free_text");
            if text.is_empty() {
                return String::new();
            }
            format!("<span class=\"andw-event-text\">{}</span>", html_escape(text))
        }
        _ => String::new(),
    }
}

/// An event is expired once its last day is strictly before `today`.
/// Posts without a dated event never expire.
pub fn is_expired(meta: &HashMap<String, String>, today: NaiveDate) -> bool {
    let key = match meta.get("andw_event_type").map(String::as_str) {
        Some("single") => "andw_event_single_date",
        Some("period") => "andw_event_end_date",
        _ => return false,
    };
    meta.get(key)
        .and_then(|raw| parse_datetime(raw))
        .map(|dt| dt.date() < today)
        .unwrap_or(false)
}

pub fn categories_html(categories: &[NewsCategory]) -> String {
    categories
        .iter()
        .map(|c| {
            format!(
                "<span class=\"andw-news-category andw-news-category-{}\">{}</span>",
                html_escape(&c.slug),
                html_escape(&c.name)
            )
        })
        .collect::<Vec<_>>()
        .join("")
}

/// Query posts and build the records the renderer consumes.
pub fn records(store: &dyn Store, query: &NewsQuery) -> Vec<Record> {
    store
        .news_query(query)
        .iter()
        .map(|p| p.to_record(store))
        .collect()
}

/// Today's date in the site's configured timezone (UTC when unknown).
pub fn site_today(tz_name: &str) -> NaiveDate {
    let now = chrono::Utc::now();
    match tz_name.parse::<chrono_tz::Tz>() {
        Ok(tz) => now.with_timezone(&tz).date_naive(),
        Err(_) => now.date_naive(),
    }
}
