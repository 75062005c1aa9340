use std::collections::HashMap;
use std::sync::Arc;

use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::State;

use crate::cache::RenderCache;
use crate::render::StyleQueue;
use crate::shortcode::{self, BlockAttrs, ShortcodeAtts};
use crate::store::Store;

fn render_fragment(store: &dyn Store, cache: &RenderCache, atts: &ShortcodeAtts) -> RawHtml<String> {
    let mut styles = StyleQueue::new();
    let html = shortcode::render_shortcode(store, cache, atts, &mut styles);
    RawHtml(format!("{}{}", html, styles.render()))
}

// ── News listing ───────────────────────────────────────

#[get("/news?<layout>&<cats>&<per_page>&<pinned_first>&<exclude_expired>")]
pub fn news_list(
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    layout: Option<String>,
    cats: Option<String>,
    per_page: Option<String>,
    pinned_first: Option<String>,
    exclude_expired: Option<String>,
) -> RawHtml<String> {
    let attrs: HashMap<String, String> = [
        ("layout", layout),
        ("cats", cats),
        ("per_page", per_page),
        ("pinned_first", pinned_first),
        ("exclude_expired", exclude_expired),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
    .collect();

    render_fragment(&**store.inner(), cache, &ShortcodeAtts::from_attributes(&attrs))
}

#[post("/news/block", format = "json", data = "<body>")]
pub fn news_block(
    store: &State<Arc<dyn Store>>,
    cache: &State<RenderCache>,
    body: Json<BlockAttrs>,
) -> RawHtml<String> {
    let atts: ShortcodeAtts = body.into_inner().into();
    render_fragment(&**store.inner(), cache, &atts)
}

pub fn routes() -> Vec<rocket::Route> {
    routes![news_list, news_block]
}
