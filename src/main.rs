#[macro_use]
extern crate rocket;

use std::sync::Arc;

use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{Build, Rocket};
use serde_json::{json, Value};

mod boot;
mod cache;
mod db;
mod models;
mod render;
mod routes;
mod sanitize;
mod security;
mod shortcode;
mod store;

#[cfg(test)]
mod tests;

use cache::RenderCache;
use models::template::TemplateManager;
use store::sqlite::SqliteStore;
use store::Store;

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "success": false, "data": { "message": "Insufficient permissions" } }))
}

#[catch(404)]
fn not_found() -> RawHtml<String> {
    RawHtml("<div class=\"andw-news-error\">404 Not found</div>".to_string())
}

#[catch(500)]
fn server_error() -> RawHtml<String> {
    RawHtml("<div class=\"andw-news-error\">500 Internal server error</div>".to_string())
}

/// Assemble the server around an already migrated and seeded store.
pub fn build_rocket(store: Arc<dyn Store>) -> Rocket<Build> {
    rocket::build()
        .manage(store)
        .manage(RenderCache::new())
        .mount("/", routes::public::routes())
        .mount("/admin/api", routes::admin_api::routes())
        .register("/", catchers![unauthorized, not_found, server_error])
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check: create directories, verify the db location is writable
    boot::run();

    let pool = db::init_pool().expect("Failed to initialize database pool");
    let store = SqliteStore::new(pool);
    store.run_migrations().expect("Failed to run database migrations");
    store.seed_defaults().expect("Failed to seed default settings");

    match TemplateManager::new(&store).install_default_templates() {
        Ok(true) => log::info!("News templates initialised"),
        Ok(false) => {}
        Err(e) => log::error!("Installing default news templates failed: {}", e),
    }

    build_rocket(Arc::new(store))
}
