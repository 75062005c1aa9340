use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{CachedRender, RenderCache};
use crate::models::news::{self, NewsQuery, DEFAULT_PER_PAGE};
use crate::models::template::{NewsTemplate, TemplateManager, DISABLE_CSS_OPTION, TABS_BY_CATEGORY};
use crate::render::{self, html_escape, StyleQueue};
use crate::store::Store;

pub const EMPTY_HTML: &str = "<div class=\"andw-news-empty\">お知らせはありません。</div>";
pub const MISSING_TEMPLATE_HTML: &str =
    "<div class=\"andw-news-error\">テンプレートが見つかりません。</div>";
pub const MISSING_TABS_HTML: &str =
    "<div class=\"andw-news-error\">タブテンプレートが見つかりません。</div>";

/// Template used for every pane of the category tabs.
const TABS_TEMPLATE: &str = "tabs";

/// Listing attributes as given to the `andw_news` shortcode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortcodeAtts {
    pub layout: String,
    pub cats: Vec<i64>,
    pub per_page: i64,
    pub pinned_first: bool,
    pub exclude_expired: bool,
}

impl ShortcodeAtts {
    /// Build from raw string attributes. `cats` is a comma list of ids,
    /// flags are on only when exactly `"1"`. A missing or unparsable
    /// `per_page` is left at 0 and resolved against the site default.
    pub fn from_attributes(attrs: &HashMap<String, String>) -> Self {
        let get = |key: &str| attrs.get(key).map(|v| v.trim()).unwrap_or("");
        ShortcodeAtts {
            layout: crate::sanitize::text_field(get("layout")),
            cats: parse_cats(get("cats")),
            per_page: get("per_page").parse().unwrap_or(0),
            pinned_first: get("pinned_first") == "1",
            exclude_expired: get("exclude_expired") == "1",
        }
    }

    fn query(&self) -> NewsQuery {
        NewsQuery {
            per_page: self.per_page,
            cats: self.cats.clone(),
            pinned_first: self.pinned_first,
            exclude_expired: self.exclude_expired,
        }
    }
}

fn parse_cats(raw: &str) -> Vec<i64> {
    raw.split(',')
        .filter_map(|c| c.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .collect()
}

/// Attributes of the editor block, as posted by the block editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockAttrs {
    pub layout: String,
    pub categories: Vec<i64>,
    pub per_page: i64,
    pub pinned_first: bool,
    pub exclude_expired: bool,
}

impl Default for BlockAttrs {
    fn default() -> Self {
        BlockAttrs {
            layout: String::new(),
            categories: Vec::new(),
            per_page: DEFAULT_PER_PAGE,
            pinned_first: false,
            exclude_expired: false,
        }
    }
}

impl From<BlockAttrs> for ShortcodeAtts {
    fn from(block: BlockAttrs) -> Self {
        ShortcodeAtts {
            layout: crate::sanitize::text_field(&block.layout),
            cats: block.categories.into_iter().filter(|id| *id > 0).collect(),
            per_page: block.per_page,
            pinned_first: block.pinned_first,
            exclude_expired: block.exclude_expired,
        }
    }
}

/// Render a news listing. Template CSS used by the listing is pushed into
/// `styles`, including on a cache hit.
pub fn render_shortcode(
    store: &dyn Store,
    cache: &RenderCache,
    atts: &ShortcodeAtts,
    styles: &mut StyleQueue,
) -> String {
    let manager = TemplateManager::new(store);
    let mut atts = atts.clone();
    if atts.layout.is_empty() {
        atts.layout = manager.get_default_template();
    }
    if atts.per_page <= 0 {
        atts.per_page = store.setting_get_i64("news_per_page_default");
    }

    let ttl_minutes = store.setting_get_i64("news_cache_ttl_minutes").max(0) as u64;
    let ttl = Duration::from_secs(ttl_minutes * 60);
    let key = serde_json::to_string(&atts)
        .map(|s| RenderCache::key_for(&s))
        .ok()
        .filter(|_| ttl_minutes > 0);

    if let Some(key) = key.as_deref() {
        if let Some(hit) = cache.get(key, ttl) {
            for (slug, css) in &hit.styles {
                styles.push(slug, css);
            }
            return hit.html;
        }
    }

    let mut local = StyleQueue::new();
    let html = if atts.layout == TABS_BY_CATEGORY {
        render_tabs(store, &manager, &atts, &mut local)
    } else {
        render_list(store, &manager, &atts, &mut local)
    };

    if let Some(key) = key.as_deref() {
        cache.put(
            key,
            CachedRender {
                html: html.clone(),
                styles: local.entries().to_vec(),
            },
            ttl,
        );
        log::debug!("News cache stored: {}", key);
    }
    for (slug, css) in local.entries() {
        styles.push(slug, css);
    }
    html
}

fn queue_css(store: &dyn Store, template: &NewsTemplate, styles: &mut StyleQueue) {
    if !template.has_css() || store.setting_get_bool(DISABLE_CSS_OPTION) {
        return;
    }
    if let Some(css) = template.css.as_deref() {
        styles.push(&template.slug, css);
    }
}

fn render_list(
    store: &dyn Store,
    manager: &TemplateManager,
    atts: &ShortcodeAtts,
    styles: &mut StyleQueue,
) -> String {
    let records = news::records(store, &atts.query());
    if records.is_empty() {
        return EMPTY_HTML.to_string();
    }
    let template = match manager.get_template(&atts.layout) {
        Some(t) => t,
        None => {
            log::warn!("News layout '{}' has no template", atts.layout);
            return MISSING_TEMPLATE_HTML.to_string();
        }
    };
    queue_css(store, &template, styles);

    format!(
        "<div class=\"andw-news-wrapper andw-news-layout-{}\">{}</div>",
        html_escape(&atts.layout),
        render::render_posts(&records, &template)
    )
}

/// One tab per category that has matching posts, each pane rendered with
/// the `tabs` template. The category filter does not apply here.
fn render_tabs(
    store: &dyn Store,
    manager: &TemplateManager,
    atts: &ShortcodeAtts,
    styles: &mut StyleQueue,
) -> String {
    let query = NewsQuery {
        cats: Vec::new(),
        ..atts.query()
    };
    let groups = store.news_by_categories(&query);
    if groups.is_empty() {
        return EMPTY_HTML.to_string();
    }
    let template = match manager.get_template(TABS_TEMPLATE) {
        Some(t) => t,
        None => return MISSING_TABS_HTML.to_string(),
    };
    queue_css(store, &template, styles);

    let mut html = String::from("<div class=\"andw-tabs\" data-andw-tabs>");

    html.push_str("<ul class=\"andw-tabs__nav\" role=\"tablist\">");
    for (i, (category, _)) in groups.iter().enumerate() {
        let first = i == 0;
        let tab_id = format!("andw-tab-{}", category.id);
        html.push_str(&format!(
            "<li class=\"andw-tabs__nav-item{}\" role=\"tab\" aria-controls=\"{}\" aria-selected=\"{}\" tabindex=\"{}\" data-tab-target=\"{}\">{}</li>",
            if first { " andw-tabs__nav-item--active" } else { "" },
            tab_id,
            first,
            if first { "0" } else { "-1" },
            tab_id,
            html_escape(&category.name)
        ));
    }
    html.push_str("</ul>");

    html.push_str("<div class=\"andw-tabs__content\">");
    for (i, (category, posts)) in groups.iter().enumerate() {
        let first = i == 0;
        html.push_str(&format!(
            "<div class=\"andw-tabs__pane{}\" id=\"andw-tab-{}\" role=\"tabpanel\" aria-hidden=\"{}\">",
            if first { " andw-tabs__pane--active" } else { "" },
            category.id,
            !first
        ));
        let records: Vec<_> = posts.iter().map(|p| p.to_record(store)).collect();
        html.push_str(&render::render_posts(&records, &template));
        html.push_str("</div>");
    }
    html.push_str("</div>");

    html.push_str("</div>");
    html
}
