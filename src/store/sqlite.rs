use std::collections::HashMap;

use crate::db::DbPool;
use crate::models::category::NewsCategory;
use crate::models::news::{self, NewsForm, NewsPost, NewsQuery};
use crate::models::settings::Setting;

use super::Store;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool).map_err(|e| e.to_string())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        crate::db::seed_defaults(&self.pool).map_err(|e| e.to_string())
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        Setting::get(&self.pool, key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), String> {
        Setting::set(&self.pool, key, value)
    }

    fn purge_plugin_data(&self) -> Result<(), String> {
        Setting::purge_plugin_data(&self.pool)
    }

    // ── News ────────────────────────────────────────────────────────

    fn news_create(&self, form: &NewsForm) -> Result<i64, String> {
        NewsPost::create(&self.pool, form)
    }

    fn news_find_by_id(&self, id: i64) -> Option<NewsPost> {
        NewsPost::find_by_id(&self.pool, id)
    }

    fn news_set_meta(&self, post_id: i64, key: &str, value: &str) -> Result<(), String> {
        NewsPost::set_meta(&self.pool, post_id, key, value)
    }

    fn news_meta(&self, post_id: i64) -> HashMap<String, String> {
        NewsPost::meta(&self.pool, post_id)
    }

    fn news_set_categories(&self, post_id: i64, category_ids: &[i64]) -> Result<(), String> {
        NewsCategory::set_for_post(&self.pool, post_id, category_ids)
    }

    fn news_categories_for(&self, post_id: i64) -> Vec<NewsCategory> {
        NewsCategory::for_post(&self.pool, post_id)
    }

    fn news_query(&self, query: &NewsQuery) -> Vec<NewsPost> {
        let today = news::site_today(&self.setting_get_or("timezone", "UTC"));
        NewsPost::query(&self.pool, query, today)
    }

    // ── Categories ──────────────────────────────────────────────────

    fn category_create(&self, name: &str, slug: &str) -> Result<i64, String> {
        NewsCategory::create(&self.pool, name, slug)
    }

    fn category_list(&self) -> Vec<NewsCategory> {
        NewsCategory::list(&self.pool)
    }

    fn category_list_non_empty(&self) -> Vec<NewsCategory> {
        NewsCategory::list_non_empty(&self.pool)
    }
}
