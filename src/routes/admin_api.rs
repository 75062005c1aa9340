use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::cache::RenderCache;
use crate::models::template::{NewsTemplate, TemplateManager, DISABLE_CSS_OPTION, TABS_BY_CATEGORY};
use crate::sanitize;
use crate::security::auth::AdminKey;
use crate::store::Store;

const TABS_LABEL: &str = "カテゴリタブ";

fn success(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn failure(message: &str) -> Json<Value> {
    Json(json!({ "success": false, "data": { "message": message } }))
}

#[derive(Debug, Deserialize)]
pub struct TemplateNameRequest {
    #[serde(default)]
    pub template_name: String,
}

impl TemplateNameRequest {
    fn name(&self) -> String {
        sanitize::text_field(&self.template_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    #[serde(default)]
    pub template_name: String,
    pub template_data: Option<NewsTemplate>,
    #[serde(default)]
    pub is_edit: bool,
    #[serde(default)]
    pub original_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateRequest {
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
pub struct CssSettingsRequest {
    #[serde(default)]
    pub disable_css: bool,
}

// ── Templates ─────────────────────────────────────────

#[get("/templates")]
pub fn list_templates(_admin: AdminKey, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let manager = TemplateManager::new(&**store.inner());
    let mut options: Vec<Value> = manager
        .get_templates()
        .into_iter()
        .map(|(key, tpl)| json!({ "value": key, "label": tpl.name }))
        .collect();
    options.push(json!({ "value": TABS_BY_CATEGORY, "label": TABS_LABEL }));
    success(Value::Array(options))
}

#[post("/templates/preview", format = "json", data = "<body>")]
pub fn preview_template(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    body: Json<TemplateNameRequest>,
) -> Json<Value> {
    let name = body.name();
    if name.is_empty() {
        return failure("Template name is required");
    }
    match TemplateManager::new(&**store.inner()).preview_template(&name) {
        Some(html) => success(json!({ "html": html })),
        None => failure("Template not found"),
    }
}

#[post("/templates/save", format = "json", data = "<body>")]
pub fn save_template(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    body: Json<SaveTemplateRequest>,
) -> Json<Value> {
    let body = body.into_inner();
    let name = sanitize::text_field(&body.template_name);
    let data = match body.template_data {
        Some(d) if d != NewsTemplate::default() => d,
        _ => return failure("Required fields are missing"),
    };
    if name.is_empty() {
        return failure("Required fields are missing");
    }

    let manager = TemplateManager::new(&**store.inner());
    let original = sanitize::text_field(&body.original_name);
    if body.is_edit && !original.is_empty() && original != name {
        if let Err(e) = manager.delete_template(&original) {
            log::warn!("Rename of '{}' could not remove the old entry: {}", original, e);
        }
    }

    let result = manager.save_template(&name, data);
    cache.clear();
    match result {
        Ok(()) => success(json!({ "message": "Template saved successfully" })),
        Err(e) => {
            log::warn!("Template save failed: {}", e);
            failure("Failed to save template")
        }
    }
}

#[post("/templates/get", format = "json", data = "<body>")]
pub fn get_template(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    body: Json<TemplateNameRequest>,
) -> Json<Value> {
    let name = body.name();
    if name.is_empty() {
        return failure("Template name is required");
    }
    match TemplateManager::new(&**store.inner()).get_template(&name) {
        Some(tpl) => success(serde_json::to_value(tpl).unwrap_or_default()),
        None => failure("Template not found"),
    }
}

#[post("/templates/duplicate", format = "json", data = "<body>")]
pub fn duplicate_template(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    body: Json<DuplicateRequest>,
) -> Json<Value> {
    let source = sanitize::text_field(&body.source_name);
    let new_name = sanitize::text_field(&body.new_name);
    if source.is_empty() || new_name.is_empty() {
        return failure("Source and new template names are required");
    }
    match TemplateManager::new(&**store.inner()).duplicate_template(&source, &new_name) {
        Ok(()) => {
            cache.clear();
            success(json!({ "message": "Template duplicated successfully" }))
        }
        Err(e) => {
            log::warn!("Template duplicate failed: {}", e);
            failure("Failed to duplicate template")
        }
    }
}

#[post("/templates/delete", format = "json", data = "<body>")]
pub fn delete_template(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    body: Json<TemplateNameRequest>,
) -> Json<Value> {
    let name = body.name();
    if name.is_empty() {
        return failure("Template name is required");
    }
    match TemplateManager::new(&**store.inner()).delete_template(&name) {
        Ok(()) => {
            cache.clear();
            success(json!({ "message": "Template deleted successfully" }))
        }
        Err(e) => {
            log::warn!("Template delete failed: {}", e);
            failure("Failed to delete template")
        }
    }
}

#[post("/templates/default", format = "json", data = "<body>")]
pub fn set_default_template(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    body: Json<TemplateNameRequest>,
) -> Json<Value> {
    let name = body.name();
    if name.is_empty() {
        return failure("Template name is required");
    }
    match TemplateManager::new(&**store.inner()).set_default_template(&name) {
        Ok(()) => {
            cache.clear();
            success(json!({ "message": "Default template set successfully" }))
        }
        Err(e) => {
            log::warn!("Setting default template failed: {}", e);
            failure("Failed to set default template")
        }
    }
}

// ── Editor data ───────────────────────────────────────

#[get("/categories")]
pub fn list_categories(_admin: AdminKey, store: &State<Arc<dyn Store>>) -> Json<Value> {
    let options: Vec<Value> = store
        .category_list()
        .into_iter()
        .map(|c| json!({ "value": c.id, "label": c.name }))
        .collect();
    success(Value::Array(options))
}

// ── Settings ──────────────────────────────────────────

#[post("/settings/css", format = "json", data = "<body>")]
pub fn save_css_settings(
    _admin: AdminKey,
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    body: Json<CssSettingsRequest>,
) -> Json<Value> {
    let value = if body.disable_css { "true" } else { "false" };
    match store.setting_set(DISABLE_CSS_OPTION, value) {
        Ok(()) => {
            cache.clear();
            success(json!({ "disable_css": body.disable_css }))
        }
        Err(e) => {
            log::warn!("Saving CSS setting failed: {}", e);
            failure("Failed to save settings")
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        list_templates,
        preview_template,
        save_template,
        get_template,
        duplicate_template,
        delete_template,
        set_default_template,
        list_categories,
        save_css_settings,
    ]
}
