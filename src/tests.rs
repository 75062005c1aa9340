#![cfg(test)]

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::collections::HashMap;
use std::sync::Arc;

use rocket::http::{ContentType, Header, Status};
use rocket::local::blocking::Client;
use serde_json::Value;

use crate::cache::RenderCache;
use crate::db::{run_migrations, seed_defaults, DbPool};
use crate::models::category::NewsCategory;
use crate::models::news::{NewsForm, NewsPost, NewsQuery};
use crate::models::template::{NewsTemplate, TemplateManager, TEMPLATES_OPTION};
use crate::render::StyleQueue;
use crate::security::auth::{self, ADMIN_KEY_SETTING};
use crate::shortcode::{self, ShortcodeAtts, EMPTY_HTML, MISSING_TEMPLATE_HTML};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

const TEST_KEY: &str = "test-admin-key";

/// Atomic counter for unique shared-cache DB names so parallel tests don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Create a fresh in-memory SQLite pool with all migrations + seed defaults applied.
/// Uses a named shared-cache in-memory DB so every pooled connection sees the same data.
/// Pre-seeds the admin key hash so seed_defaults does not generate and log one.
fn test_pool() -> DbPool {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:newsdb_{}?mode=memory&cache=shared", id);
    let manager = SqliteConnectionManager::file(uri);
    let pool = Pool::builder()
        .max_size(2)
        .build(manager)
        .expect("Failed to create test pool");
    {
        let conn = pool.get().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    }
    run_migrations(&pool).expect("Failed to run migrations");
    {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            rusqlite::params![ADMIN_KEY_SETTING, auth::hash_key(TEST_KEY)],
        )
        .unwrap();
    }
    seed_defaults(&pool).expect("Failed to seed defaults");
    pool
}

fn test_store() -> SqliteStore {
    let store = SqliteStore::new(test_pool());
    TemplateManager::new(&store)
        .install_default_templates()
        .unwrap();
    store
}

fn publish(store: &SqliteStore, title: &str, slug: &str, at: &str) -> i64 {
    store
        .news_create(&NewsForm {
            title: title.to_string(),
            slug: slug.to_string(),
            content: format!("<p>{} content</p>", title),
            status: "published".to_string(),
            published_at: Some(at.to_string()),
            ..Default::default()
        })
        .unwrap()
}

fn render(store: &SqliteStore, cache: &RenderCache, atts: &ShortcodeAtts) -> (String, StyleQueue) {
    let mut styles = StyleQueue::new();
    let html = shortcode::render_shortcode(store, cache, atts, &mut styles);
    (html, styles)
}

fn layout(name: &str) -> ShortcodeAtts {
    ShortcodeAtts {
        layout: name.to_string(),
        ..Default::default()
    }
}

// ═══════════════════════════════════════════════════════════
// Template manager
// ═══════════════════════════════════════════════════════════

#[test]
fn template_install_only_once() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    assert_eq!(manager.get_templates().len(), 3);
    assert!(!manager.install_default_templates().unwrap());
    assert_eq!(manager.get_default_template(), "list");
}

#[test]
fn template_save_sanitizes() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    let tpl = NewsTemplate {
        name: "<b>Promo</b>".to_string(),
        description: "line one\n<i>line two</i>".to_string(),
        wrapper_html: "<section>{items}<script>x()</script></section>".to_string(),
        item_html: r#"<p onclick="x()">{if pinned}★{/if}{title}</p>"#.to_string(),
        css: Some(".promo{color:red}</style>".to_string()),
        ..Default::default()
    };
    manager.save_template("promo", tpl).unwrap();

    let saved = manager.get_template("promo").unwrap();
    assert_eq!(saved.name, "Promo");
    assert_eq!(saved.description, "line one\nline two");
    assert_eq!(saved.slug, "promo");
    assert_eq!(saved.wrapper_html, "<section>{items}</section>");
    assert_eq!(saved.item_html, "<p>{if pinned}★{/if}{title}</p>");
    assert_eq!(saved.css.as_deref(), Some(".promo{color:red}>"));
}

#[test]
fn template_save_requires_name() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    assert!(manager.save_template("  ", NewsTemplate::default()).is_err());
}

#[test]
fn template_legacy_shape_is_normalized_on_read() {
    let store = test_store();
    store
        .setting_set(
            "andw_news_templates",
            r#"{"old":{"name":"Old","html":"<li>{title}</li>"}}"#,
        )
        .unwrap();
    let tpl = TemplateManager::new(&store).get_template("old").unwrap();
    assert_eq!(tpl.item_html, "<li>{title}</li>");
    assert_eq!(tpl.wrapper_html, "<div class=\"andw-news-list\">{items}</div>");
}

#[test]
fn template_delete_moves_default() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    manager.set_default_template("tabs").unwrap();
    manager.delete_template("tabs").unwrap();
    assert!(!manager.exists("tabs"));
    // first remaining name in sorted order
    assert_eq!(manager.get_default_template(), "cards");
    assert!(manager.delete_template("tabs").is_err());
}

#[test]
fn template_delete_last_falls_back_to_list() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    manager.set_default_template("cards").unwrap();
    manager.delete_template("list").unwrap();
    manager.delete_template("tabs").unwrap();
    manager.delete_template("cards").unwrap();
    assert!(manager.get_templates().is_empty());
    assert_eq!(manager.get_default_template(), "list");
}

/// Store whose template option cannot be written.
struct LockedTemplates(SqliteStore);

impl Store for LockedTemplates {
    fn run_migrations(&self) -> Result<(), String> {
        self.0.run_migrations()
    }
    fn seed_defaults(&self) -> Result<(), String> {
        self.0.seed_defaults()
    }
    fn setting_get(&self, key: &str) -> Option<String> {
        self.0.setting_get(key)
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<(), String> {
        if key == TEMPLATES_OPTION {
            return Err("database is locked".to_string());
        }
        self.0.setting_set(key, value)
    }
    fn purge_plugin_data(&self) -> Result<(), String> {
        self.0.purge_plugin_data()
    }
    fn news_create(&self, form: &NewsForm) -> Result<i64, String> {
        self.0.news_create(form)
    }
    fn news_find_by_id(&self, id: i64) -> Option<NewsPost> {
        self.0.news_find_by_id(id)
    }
    fn news_set_meta(&self, post_id: i64, key: &str, value: &str) -> Result<(), String> {
        self.0.news_set_meta(post_id, key, value)
    }
    fn news_meta(&self, post_id: i64) -> HashMap<String, String> {
        self.0.news_meta(post_id)
    }
    fn news_set_categories(&self, post_id: i64, category_ids: &[i64]) -> Result<(), String> {
        self.0.news_set_categories(post_id, category_ids)
    }
    fn news_categories_for(&self, post_id: i64) -> Vec<NewsCategory> {
        self.0.news_categories_for(post_id)
    }
    fn news_query(&self, query: &NewsQuery) -> Vec<NewsPost> {
        self.0.news_query(query)
    }
    fn category_create(&self, name: &str, slug: &str) -> Result<i64, String> {
        self.0.category_create(name, slug)
    }
    fn category_list(&self) -> Vec<NewsCategory> {
        self.0.category_list()
    }
    fn category_list_non_empty(&self) -> Vec<NewsCategory> {
        self.0.category_list_non_empty()
    }
}

#[test]
fn template_delete_keeps_default_when_write_fails() {
    let store = test_store();
    TemplateManager::new(&store).set_default_template("tabs").unwrap();

    let locked = LockedTemplates(store);
    let manager = TemplateManager::new(&locked);
    assert!(manager.delete_template("tabs").is_err());
    assert!(manager.exists("tabs"));
    assert_eq!(manager.get_default_template(), "tabs");
}

#[test]
fn template_duplicate_appends_suffix() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    manager.duplicate_template("list", "list2").unwrap();
    let copy = manager.get_template("list2").unwrap();
    let original = manager.get_template("list").unwrap();
    assert_eq!(copy.name, format!("{} のコピー", original.name));
    assert_eq!(copy.item_html, original.item_html);
    assert!(manager.duplicate_template("missing", "x").is_err());
}

#[test]
fn template_set_default_requires_existing() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    assert!(manager.set_default_template("nope").is_err());
    assert_eq!(manager.get_default_template(), "list");
}

#[test]
fn template_preview_uses_sample_record() {
    let store = test_store();
    let manager = TemplateManager::new(&store);
    let html = manager.preview_template("list").unwrap();
    assert!(html.starts_with("<div class=\"andw-news-list\">"));
    assert!(html.contains("サンプルニュースタイトル"));
    assert!(html.contains("andw-news-item--pinned"));
    assert!(manager.preview_template("missing").is_none());
}

// ═══════════════════════════════════════════════════════════
// Record building
// ═══════════════════════════════════════════════════════════

#[test]
fn record_core_fields() {
    let store = test_store();
    let id = store
        .news_create(&NewsForm {
            title: "Tom & Jerry".to_string(),
            slug: "tom-jerry".to_string(),
            content: "<p>one two three</p>".to_string(),
            thumbnail: Some("/img/a.jpg".to_string()),
            status: "published".to_string(),
            published_at: Some("2024-01-15 09:30:00".to_string()),
            ..Default::default()
        })
        .unwrap();
    let post = store.news_find_by_id(id).unwrap();
    let rec = post.to_record(&store);

    assert_eq!(rec.text("title"), "Tom &amp; Jerry");
    assert_eq!(rec.text("date"), "2024.01.15");
    assert_eq!(rec.text("date_raw"), "2024-01-15 09:30:00");
    assert_eq!(rec.text("excerpt"), "one two three");
    assert_eq!(
        rec.text("thumbnail"),
        "<img src=\"/img/a.jpg\" alt=\"Tom &amp; Jerry\" class=\"andw-news-thumbnail\" loading=\"lazy\">"
    );
    assert_eq!(rec.text("link_url"), "http://localhost:8000/news/tom-jerry");
    assert_eq!(rec.text("link_target"), "_self");
    assert_eq!(rec.text("andw-news-pinned"), "0");
    assert_eq!(rec.text("pinned"), "");
    assert_eq!(rec.text("event_date"), "");
}

#[test]
fn record_excerpt_truncates_content() {
    let store = test_store();
    let words: Vec<String> = (1..=25).map(|i| format!("w{}", i)).collect();
    let id = store
        .news_create(&NewsForm {
            title: "Long".to_string(),
            slug: "long".to_string(),
            content: format!("<div>{}</div>", words.join(" ")),
            status: "published".to_string(),
            ..Default::default()
        })
        .unwrap();
    let rec = store.news_find_by_id(id).unwrap().to_record(&store);
    assert_eq!(rec.text("excerpt"), format!("{}...", words[..20].join(" ")));
    assert_eq!(rec.text("date"), "");
}

#[test]
fn record_link_types() {
    let store = test_store();
    let target = publish(&store, "Target", "target", "2024-01-01 00:00:00");
    let internal = publish(&store, "Internal", "internal", "2024-01-02 00:00:00");
    let external = publish(&store, "External", "external", "2024-01-03 00:00:00");
    let evil = publish(&store, "Evil", "evil", "2024-01-04 00:00:00");

    store.news_set_meta(internal, "andw_link_type", "internal").unwrap();
    store
        .news_set_meta(internal, "andw_internal_link", &target.to_string())
        .unwrap();
    store.news_set_meta(external, "andw_link_type", "external").unwrap();
    store
        .news_set_meta(external, "andw_external_link", "https://example.com/?a=1&b=2")
        .unwrap();
    store.news_set_meta(external, "andw_link_target", "_blank").unwrap();
    store.news_set_meta(evil, "andw_link_type", "external").unwrap();
    store
        .news_set_meta(evil, "andw_external_link", "javascript:alert(1)")
        .unwrap();

    let rec = |id: i64| store.news_find_by_id(id).unwrap().to_record(&store);
    assert_eq!(rec(internal).text("link_url"), "http://localhost:8000/news/target");
    assert_eq!(rec(external).text("link_url"), "https://example.com/?a=1&amp;b=2");
    assert_eq!(rec(external).text("link_target"), "_blank");
    assert_eq!(rec(evil).text("link_url"), "http://localhost:8000/news/evil");
}

#[test]
fn record_pinned_event_categories_and_extras() {
    let store = test_store();
    let id = publish(&store, "Event", "event", "2024-01-01 00:00:00");
    store.news_set_meta(id, "andw_news_pinned", "1").unwrap();
    store.news_set_meta(id, "andw_event_type", "single").unwrap();
    store.news_set_meta(id, "andw_event_single_date", "2024-01-20").unwrap();
    store.news_set_meta(id, "andw-place", "<Osaka>").unwrap();
    store.news_set_meta(id, "other_field", "hidden").unwrap();
    let info = store.category_create("お知らせ", "info").unwrap();
    store.news_set_categories(id, &[info]).unwrap();

    let rec = store.news_find_by_id(id).unwrap().to_record(&store);
    assert!(rec.get("pinned").unwrap().is_truthy());
    assert_eq!(rec.text("pinned"), "1");
    assert_eq!(rec.text("andw-news-pinned"), "1");
    assert_eq!(rec.text("event_date"), "<span class=\"andw-event-date\">2024.01.20</span>");
    assert_eq!(
        rec.text("categories"),
        "<span class=\"andw-news-category andw-news-category-info\">お知らせ</span>"
    );
    assert_eq!(rec.text("andw-place"), "&lt;Osaka&gt;");
    assert!(!rec.contains("other_field"));
}

#[test]
fn record_uses_date_format_setting() {
    let store = test_store();
    store.setting_set("news_date_format", "Y年n月j日").unwrap();
    let id = publish(&store, "A", "a", "2024-03-05 00:00:00");
    let rec = store.news_find_by_id(id).unwrap().to_record(&store);
    assert_eq!(rec.text("date"), "2024年3月5日");
}

// ═══════════════════════════════════════════════════════════
// Shortcode rendering
// ═══════════════════════════════════════════════════════════

#[test]
fn shortcode_empty_listing() {
    let store = test_store();
    let cache = RenderCache::new();
    let (html, styles) = render(&store, &cache, &layout("list"));
    assert_eq!(html, EMPTY_HTML);
    assert!(styles.is_empty());
}

#[test]
fn shortcode_missing_template() {
    let store = test_store();
    let cache = RenderCache::new();
    publish(&store, "A", "a", "2024-01-01 00:00:00");
    let (html, _) = render(&store, &cache, &layout("nope"));
    assert_eq!(html, MISSING_TEMPLATE_HTML);
}

#[test]
fn shortcode_wraps_rendered_posts() {
    let store = test_store();
    let cache = RenderCache::new();
    publish(&store, "First", "first", "2024-01-01 00:00:00");
    publish(&store, "Second", "second", "2024-02-01 00:00:00");

    let (html, _) = render(&store, &cache, &layout("list"));
    assert!(html.starts_with(
        "<div class=\"andw-news-wrapper andw-news-layout-list\"><div class=\"andw-news-list\">"
    ));
    assert!(html.ends_with("</div></div>"));
    let second = html.find("Second").unwrap();
    let first = html.find("First").unwrap();
    assert!(second < first);
}

#[test]
fn shortcode_empty_layout_uses_default_template() {
    let store = test_store();
    let cache = RenderCache::new();
    publish(&store, "A", "a", "2024-01-01 00:00:00");
    TemplateManager::new(&store).set_default_template("cards").unwrap();
    let (html, _) = render(&store, &cache, &ShortcodeAtts::default());
    assert!(html.contains("andw-news-layout-cards"));
    assert!(html.contains("andw-news-card"));
}

#[test]
fn shortcode_respects_per_page_and_categories() {
    let store = test_store();
    let cache = RenderCache::new();
    let a = publish(&store, "Alpha", "alpha", "2024-01-01 00:00:00");
    publish(&store, "Beta", "beta", "2024-01-02 00:00:00");
    publish(&store, "Gamma", "gamma", "2024-01-03 00:00:00");
    let cat = store.category_create("Info", "info").unwrap();
    store.news_set_categories(a, &[cat]).unwrap();

    let (html, _) = render(
        &store,
        &cache,
        &ShortcodeAtts {
            layout: "list".into(),
            per_page: 2,
            ..Default::default()
        },
    );
    assert!(html.contains("Gamma") && html.contains("Beta") && !html.contains("Alpha"));

    let (html, _) = render(
        &store,
        &cache,
        &ShortcodeAtts {
            layout: "list".into(),
            cats: vec![cat],
            ..Default::default()
        },
    );
    assert!(html.contains("Alpha") && !html.contains("Beta"));
}

#[test]
fn shortcode_queues_template_css_once() {
    let store = test_store();
    let cache = RenderCache::new();
    publish(&store, "A", "a", "2024-01-01 00:00:00");
    let manager = TemplateManager::new(&store);
    let mut tpl = manager.get_template("list").unwrap();
    tpl.css = Some(".andw-news-list{gap:1rem}".to_string());
    manager.save_template("list", tpl).unwrap();

    let mut styles = StyleQueue::new();
    shortcode::render_shortcode(&store, &cache, &layout("list"), &mut styles);
    shortcode::render_shortcode(&store, &cache, &layout("list"), &mut styles);
    assert_eq!(styles.len(), 1);
    assert_eq!(
        styles.render(),
        "<style id=\"andw-news-css-list\">.andw-news-list{gap:1rem}</style>"
    );

    store.setting_set("andw_news_disable_css", "true").unwrap();
    cache.clear();
    let (_, styles) = render(&store, &cache, &layout("list"));
    assert!(styles.is_empty());
}

#[test]
fn shortcode_cache_hit_until_cleared() {
    let store = test_store();
    let cache = RenderCache::new();
    publish(&store, "Old", "old", "2024-01-01 00:00:00");
    let (first, _) = render(&store, &cache, &layout("list"));
    assert_eq!(cache.len(), 1);

    publish(&store, "Fresh", "fresh", "2024-02-01 00:00:00");
    let (cached, _) = render(&store, &cache, &layout("list"));
    assert_eq!(cached, first);

    cache.clear();
    let (fresh, _) = render(&store, &cache, &layout("list"));
    assert!(fresh.contains("Fresh"));
}

#[test]
fn shortcode_cache_disabled_with_zero_ttl() {
    let store = test_store();
    let cache = RenderCache::new();
    store.setting_set("news_cache_ttl_minutes", "0").unwrap();
    publish(&store, "A", "a", "2024-01-01 00:00:00");
    render(&store, &cache, &layout("list"));
    assert!(cache.is_empty());
}

#[test]
fn shortcode_tabs_by_category() {
    let store = test_store();
    let cache = RenderCache::new();
    let a = publish(&store, "Alpha", "alpha", "2024-01-01 00:00:00");
    let b = publish(&store, "Beta", "beta", "2024-01-02 00:00:00");
    let news = store.category_create("News", "news").unwrap();
    let events = store.category_create("Events", "events").unwrap();
    store.category_create("Empty", "empty").unwrap();
    store.news_set_categories(a, &[news]).unwrap();
    store.news_set_categories(b, &[events]).unwrap();

    let (html, _) = render(&store, &cache, &layout("tabs_by_category"));
    assert!(html.starts_with("<div class=\"andw-tabs\" data-andw-tabs><ul class=\"andw-tabs__nav\" role=\"tablist\">"));
    // categories in name order: Events, then News
    let first_tab = format!(
        "<li class=\"andw-tabs__nav-item andw-tabs__nav-item--active\" role=\"tab\" aria-controls=\"andw-tab-{0}\" aria-selected=\"true\" tabindex=\"0\" data-tab-target=\"andw-tab-{0}\">Events</li>",
        events
    );
    let second_tab = format!(
        "<li class=\"andw-tabs__nav-item\" role=\"tab\" aria-controls=\"andw-tab-{0}\" aria-selected=\"false\" tabindex=\"-1\" data-tab-target=\"andw-tab-{0}\">News</li>",
        news
    );
    assert!(html.contains(&first_tab));
    assert!(html.contains(&second_tab));
    assert!(html.contains(&format!(
        "<div class=\"andw-tabs__pane andw-tabs__pane--active\" id=\"andw-tab-{}\" role=\"tabpanel\" aria-hidden=\"false\"><div class=\"andw-news-tab-content\">",
        events
    )));
    assert!(html.contains(&format!(
        "<div class=\"andw-tabs__pane\" id=\"andw-tab-{}\" role=\"tabpanel\" aria-hidden=\"true\">",
        news
    )));
    assert!(!html.contains("Empty"));
}

#[test]
fn shortcode_tabs_without_tabs_template() {
    let store = test_store();
    let cache = RenderCache::new();
    let a = publish(&store, "Alpha", "alpha", "2024-01-01 00:00:00");
    let cat = store.category_create("News", "news").unwrap();
    store.news_set_categories(a, &[cat]).unwrap();
    TemplateManager::new(&store).delete_template("tabs").unwrap();

    let (html, _) = render(&store, &cache, &layout("tabs_by_category"));
    assert_eq!(html, shortcode::MISSING_TABS_HTML);
}

#[test]
fn shortcode_exclude_expired() {
    let store = test_store();
    let cache = RenderCache::new();
    let past = publish(&store, "Finished", "finished", "2024-01-01 00:00:00");
    publish(&store, "Current", "current", "2024-01-02 00:00:00");
    store.news_set_meta(past, "andw_event_type", "single").unwrap();
    store.news_set_meta(past, "andw_event_single_date", "2001-01-01").unwrap();

    let (html, _) = render(
        &store,
        &cache,
        &ShortcodeAtts {
            layout: "list".into(),
            exclude_expired: true,
            ..Default::default()
        },
    );
    assert!(html.contains("Current"));
    assert!(!html.contains("Finished"));
}

#[test]
fn purge_removes_templates() {
    let store = test_store();
    store.purge_plugin_data().unwrap();
    let manager = TemplateManager::new(&store);
    assert!(manager.get_templates().is_empty());
    assert!(store.news_query(&NewsQuery::default()).is_empty());
}

// ═══════════════════════════════════════════════════════════
// HTTP routes
// ═══════════════════════════════════════════════════════════

fn client_with(store: SqliteStore) -> Client {
    let store: Arc<dyn Store> = Arc::new(store);
    Client::tracked(crate::build_rocket(store)).expect("valid rocket instance")
}

fn admin_post(client: &Client, path: &str, body: &str) -> Value {
    let response = client
        .post(format!("/admin/api{}", path))
        .header(Header::new("X-Admin-Key", TEST_KEY))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    response.into_json::<Value>().expect("json body")
}

#[test]
fn route_admin_requires_key() {
    let client = client_with(test_store());
    let response = client.get("/admin/api/templates").dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["success"], false);

    let response = client
        .get("/admin/api/templates")
        .header(Header::new("X-Admin-Key", "wrong"))
        .dispatch();
    assert_eq!(response.status(), Status::Unauthorized);
}

#[test]
fn route_list_templates() {
    let client = client_with(test_store());
    let response = client
        .get("/admin/api/templates")
        .header(Header::new("X-Admin-Key", TEST_KEY))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().unwrap();
    assert_eq!(body["success"], true);
    let values: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["cards", "list", "tabs", "tabs_by_category"]);
}

#[test]
fn route_preview_and_get() {
    let client = client_with(test_store());
    let body = admin_post(&client, "/templates/preview", r#"{"template_name":"cards"}"#);
    assert_eq!(body["success"], true);
    assert!(body["data"]["html"].as_str().unwrap().contains("サンプルニュースタイトル"));

    let body = admin_post(&client, "/templates/preview", r#"{"template_name":""}"#);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["message"], "Template name is required");

    let body = admin_post(&client, "/templates/get", r#"{"template_name":"list"}"#);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["slug"], "list");

    let body = admin_post(&client, "/templates/get", r#"{"template_name":"ghost"}"#);
    assert_eq!(body["data"]["message"], "Template not found");
}

#[test]
fn route_save_rename_and_default() {
    let client = client_with(test_store());
    let body = admin_post(
        &client,
        "/templates/save",
        r#"{"template_name":"simple","template_data":{"name":"Simple","wrapper_html":"<ul>{items}</ul>","item_html":"<li>{title}</li>"}}"#,
    );
    assert_eq!(body["success"], true);

    let body = admin_post(
        &client,
        "/templates/save",
        r#"{"template_name":"plain","template_data":{"name":"Plain","wrapper_html":"<ul>{items}</ul>","item_html":"<li>{title}</li>"},"is_edit":true,"original_name":"simple"}"#,
    );
    assert_eq!(body["success"], true);
    let body = admin_post(&client, "/templates/get", r#"{"template_name":"simple"}"#);
    assert_eq!(body["success"], false);

    let body = admin_post(&client, "/templates/save", r#"{"template_name":"x"}"#);
    assert_eq!(body["data"]["message"], "Required fields are missing");

    let body = admin_post(&client, "/templates/default", r#"{"template_name":"plain"}"#);
    assert_eq!(body["success"], true);
    let body = admin_post(&client, "/templates/default", r#"{"template_name":"ghost"}"#);
    assert_eq!(body["success"], false);

    let body = admin_post(
        &client,
        "/templates/duplicate",
        r#"{"source_name":"plain","new_name":"plain-copy"}"#,
    );
    assert_eq!(body["success"], true);
    let body = admin_post(&client, "/templates/delete", r#"{"template_name":"plain-copy"}"#);
    assert_eq!(body["success"], true);
    let body = admin_post(&client, "/templates/delete", r#"{"template_name":"plain-copy"}"#);
    assert_eq!(body["data"]["message"], "Failed to delete template");
}

#[test]
fn route_css_setting() {
    let client = client_with(test_store());
    let body = admin_post(&client, "/settings/css", r#"{"disable_css":true}"#);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["disable_css"], true);
}

#[test]
fn route_public_news_listing() {
    let store = test_store();
    publish(&store, "Public Post", "public-post", "2024-01-01 00:00:00");
    let client = client_with(store);

    let response = client.get("/news?layout=list&per_page=5").dispatch();
    assert_eq!(response.status(), Status::Ok);
    let html = response.into_string().unwrap();
    assert!(html.contains("andw-news-layout-list"));
    assert!(html.contains("Public Post"));

    let response = client.get("/news?cats=999").dispatch();
    assert_eq!(response.into_string().unwrap(), EMPTY_HTML);
}

#[test]
fn route_block_render() {
    let store = test_store();
    publish(&store, "Block Post", "block-post", "2024-01-01 00:00:00");
    let client = client_with(store);

    let response = client
        .post("/news/block")
        .header(ContentType::JSON)
        .body(r#"{"layout":"cards","perPage":3}"#)
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let html = response.into_string().unwrap();
    assert!(html.contains("andw-news-layout-cards"));
    assert!(html.contains("Block Post"));
}

#[test]
fn route_not_found() {
    let client = client_with(test_store());
    let response = client.get("/nowhere").dispatch();
    assert_eq!(response.status(), Status::NotFound);
}
