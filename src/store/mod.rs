use std::collections::HashMap;

use crate::models::category::NewsCategory;
use crate::models::news::{NewsForm, NewsPost, NewsQuery};

pub mod sqlite;

/// Unified data-access trait. Every database operation goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn seed_defaults(&self) -> Result<(), String>;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_get_bool(&self, key: &str) -> bool {
        self.setting_get(key)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false)
    }
    fn setting_get_i64(&self, key: &str) -> i64 {
        self.setting_get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<(), String>;
    fn purge_plugin_data(&self) -> Result<(), String>;

    // ── News ────────────────────────────────────────────────────────
    fn news_create(&self, form: &NewsForm) -> Result<i64, String>;
    fn news_find_by_id(&self, id: i64) -> Option<NewsPost>;
    fn news_set_meta(&self, post_id: i64, key: &str, value: &str) -> Result<(), String>;
    fn news_meta(&self, post_id: i64) -> HashMap<String, String>;
    fn news_set_categories(&self, post_id: i64, category_ids: &[i64]) -> Result<(), String>;
    fn news_categories_for(&self, post_id: i64) -> Vec<NewsCategory>;
    fn news_query(&self, query: &NewsQuery) -> Vec<NewsPost>;

    /// Posts grouped per non-empty category, in category name order.
    /// Categories left without a matching post are omitted.
    fn news_by_categories(&self, query: &NewsQuery) -> Vec<(NewsCategory, Vec<NewsPost>)> {
        self.category_list_non_empty()
            .into_iter()
            .filter_map(|cat| {
                let scoped = NewsQuery {
                    cats: vec![cat.id],
                    ..query.clone()
                };
                let posts = self.news_query(&scoped);
                if posts.is_empty() {
                    None
                } else {
                    Some((cat, posts))
                }
            })
            .collect()
    }

    // ── Categories ──────────────────────────────────────────────────
    fn category_create(&self, name: &str, slug: &str) -> Result<i64, String>;
    fn category_list(&self) -> Vec<NewsCategory>;
    fn category_list_non_empty(&self) -> Vec<NewsCategory>;
}
