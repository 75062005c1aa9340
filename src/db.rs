use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rand::Rng;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub const DEFAULT_DB_PATH: &str = "website/db/newsdesk.db";

pub fn init_pool() -> Result<DbPool, Box<dyn std::error::Error>> {
    let path = std::env::var("NEWSDESK_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    init_pool_at(&path)
}

pub fn init_pool_at(path: &str) -> Result<DbPool, Box<dyn std::error::Error>> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    // WAL keeps shortcode reads from blocking admin writes
    let conn = pool.get()?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Settings (key-value)
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        );

        -- News posts
        CREATE TABLE IF NOT EXISTS news_posts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            content TEXT NOT NULL DEFAULT '',
            excerpt TEXT,
            thumbnail TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            published_at DATETIME,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_news_published ON news_posts(status, published_at);

        -- Per-post custom fields (andw_* link and event fields)
        CREATE TABLE IF NOT EXISTS news_meta (
            id INTEGER PRIMARY KEY,
            post_id INTEGER NOT NULL,
            meta_key TEXT NOT NULL,
            meta_value TEXT NOT NULL DEFAULT '',
            UNIQUE(post_id, meta_key),
            FOREIGN KEY (post_id) REFERENCES news_posts(id)
        );

        -- News categories
        CREATE TABLE IF NOT EXISTS news_categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL
        );

        -- Many-to-many: news <-> categories
        CREATE TABLE IF NOT EXISTS news_post_categories (
            post_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            UNIQUE(post_id, category_id),
            FOREIGN KEY (post_id) REFERENCES news_posts(id),
            FOREIGN KEY (category_id) REFERENCES news_categories(id)
        );
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    let defaults = vec![
        // General
        ("site_url", "http://localhost:8000"),
        ("timezone", "Asia/Tokyo"),
        // News listing
        ("news_date_format", "Y.m.d"),
        ("news_per_page_default", "10"),
        ("news_cache_ttl_minutes", "15"),
        // Templates
        ("andw_news_disable_css", "false"),
        ("andw_news_default_template", "list"),
    ];

    for (key, value) in defaults {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
    }

    // Seed an admin API key if none is set
    let key_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM settings WHERE key = 'admin_api_key_hash'",
        [],
        |row| row.get(0),
    )?;

    if key_exists == 0 {
        let key = generate_api_key();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES ('admin_api_key_hash', ?1)",
            params![crate::security::auth::hash_key(&key)],
        )?;
        log::warn!("Generated admin API key (shown once): {}", key);
    }

    Ok(())
}

pub fn generate_api_key() -> String {
    let bytes: [u8; 24] = rand::thread_rng().gen();
    hex::encode(bytes)
}
