use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::models::template::{DEFAULT_TEMPLATE_OPTION, DISABLE_CSS_OPTION, TEMPLATES_OPTION};

#[derive(Debug, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .ok()
    }

    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn delete(pool: &DbPool, key: &str) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Remove every option the news templates own (uninstall).
    pub fn purge_plugin_data(pool: &DbPool) -> Result<(), String> {
        for key in [TEMPLATES_OPTION, DEFAULT_TEMPLATE_OPTION, DISABLE_CSS_OPTION] {
            Self::delete(pool, key)?;
        }
        log::info!("Purged news template settings");
        Ok(())
    }
}
