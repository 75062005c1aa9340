use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::render::{self, Record};
use crate::sanitize;
use crate::store::Store;

pub const TEMPLATES_OPTION: &str = "andw_news_templates";
pub const DEFAULT_TEMPLATE_OPTION: &str = "andw_news_default_template";
pub const DISABLE_CSS_OPTION: &str = "andw_news_disable_css";

/// Layout name handled by the tab renderer rather than a stored template.
pub const TABS_BY_CATEGORY: &str = "tabs_by_category";
/// Fallback default template name.
pub const FALLBACK_TEMPLATE: &str = "list";
/// Wrapper given to templates stored in the single-`html` legacy shape.
pub const DEFAULT_WRAPPER: &str = "<div class=\"andw-news-list\">{items}</div>";

const COPY_SUFFIX: &str = " のコピー";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub wrapper_html: String,
    #[serde(default)]
    pub item_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    /// Legacy single-string form; kept alongside the derived fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl NewsTemplate {
    pub fn new(name: &str, wrapper_html: &str, item_html: &str) -> Self {
        NewsTemplate {
            name: name.to_string(),
            wrapper_html: wrapper_html.to_string(),
            item_html: item_html.to_string(),
            ..Default::default()
        }
    }

    /// Bring a stored template into the wrapper/item shape. Legacy `html`
    /// becomes the item template and is left in place.
    pub fn normalized(mut self) -> Self {
        if self.item_html.is_empty() {
            if let Some(html) = self.html.as_ref() {
                self.item_html = html.clone();
            }
        }
        if self.wrapper_html.is_empty() {
            self.wrapper_html = DEFAULT_WRAPPER.to_string();
        }
        if self.slug.is_empty() && !self.name.is_empty() {
            self.slug = slug::slugify(&self.name);
        }
        self
    }

    pub fn has_css(&self) -> bool {
        self.css.as_deref().map(|c| !c.trim().is_empty()).unwrap_or(false)
    }
}

/// The three templates installed on first boot.
pub fn default_templates() -> BTreeMap<String, NewsTemplate> {
    let mut templates = BTreeMap::new();
    templates.insert(
        "list".to_string(),
        NewsTemplate {
            name: "リスト".to_string(),
            description: "シンプルなリスト表示".to_string(),
            slug: "list".to_string(),
            wrapper_html: "<div class=\"andw-news-list\">{items}</div>".to_string(),
            item_html: concat!(
                "<article class=\"andw-news-item{if pinned} andw-news-item--pinned{/if}\">",
                "<div class=\"andw-news-content\">",
                "<time class=\"andw-news-date\">{date}</time>",
                "<h3 class=\"andw-news-title\"><a href=\"{link_url}\" target=\"{link_target}\">{title}</a></h3>",
                "{if excerpt}<div class=\"andw-news-excerpt\">{excerpt}</div>{/if}",
                "</div></article>"
            )
            .to_string(),
            css: None,
            html: None,
        },
    );
    templates.insert(
        "cards".to_string(),
        NewsTemplate {
            name: "カード".to_string(),
            description: "カード形式での表示".to_string(),
            slug: "cards".to_string(),
            wrapper_html: "<div class=\"andw-news-cards\">{items}</div>".to_string(),
            item_html: concat!(
                "<div class=\"andw-news-card\">",
                "{if thumbnail}<div class=\"andw-news-card-thumbnail\">{thumbnail}</div>{/if}",
                "<div class=\"andw-news-card-content\">",
                "<time class=\"andw-news-card-date\">{date}</time>",
                "<h3 class=\"andw-news-card-title\"><a href=\"{link_url}\" target=\"{link_target}\">{title}</a></h3>",
                "<div class=\"andw-news-card-excerpt\">{excerpt}</div>",
                "{event_date}",
                "</div></div>"
            )
            .to_string(),
            css: None,
            html: None,
        },
    );
    templates.insert(
        "tabs".to_string(),
        NewsTemplate {
            name: "タブ".to_string(),
            description: "タブ切り替え表示".to_string(),
            slug: "tabs".to_string(),
            wrapper_html: "<div class=\"andw-news-tab-content\">{items}</div>".to_string(),
            item_html: concat!(
                "<article class=\"andw-news-tab-item\">",
                "<div class=\"andw-news-tab-meta\">",
                "<time class=\"andw-news-tab-date\">{date}</time>",
                "{event_date}",
                "</div>",
                "<h3 class=\"andw-news-tab-title\"><a href=\"{link_url}\" target=\"{link_target}\">{title}</a></h3>",
                "<div class=\"andw-news-tab-excerpt\">{excerpt}</div>",
                "</article>"
            )
            .to_string(),
            css: None,
            html: None,
        },
    );
    templates
}

/// Fixed record used for admin previews.
pub fn sample_record() -> Record {
    Record::new()
        .with("title", "サンプルニュースタイトル")
        .with("date", "2024.01.15")
        .with("date_raw", "2024-01-15")
        .with(
            "excerpt",
            "これはサンプルのニュース記事です。実際の投稿データに置き換わります。",
        )
        .with(
            "thumbnail",
            "<div class=\"andw-news-thumbnail andw-news-thumbnail--sample\">サンプル画像</div>",
        )
        .with("event_date", "<span class=\"andw-event-date\">2024.01.20</span>")
        .with("link_url", "#")
        .with("link_target", "_self")
        .with("pinned", true)
        .with(
            "categories",
            "<span class=\"andw-news-category andw-news-category-info\">お知らせ</span>",
        )
}

/// Template CRUD on top of the settings store. All templates live in one
/// JSON document keyed by template name.
pub struct TemplateManager<'a> {
    store: &'a dyn Store,
}

impl<'a> TemplateManager<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        TemplateManager { store }
    }

    /// Install the default set when no templates exist yet.
    pub fn install_default_templates(&self) -> Result<bool, String> {
        if !self.get_templates().is_empty() {
            return Ok(false);
        }
        self.write_all(&default_templates())?;
        self.store.setting_set(DEFAULT_TEMPLATE_OPTION, FALLBACK_TEMPLATE)?;
        log::info!("Installed default news templates");
        Ok(true)
    }

    /// Every stored template, normalized.
    pub fn get_templates(&self) -> BTreeMap<String, NewsTemplate> {
        self.read_all()
            .into_iter()
            .map(|(key, tpl)| {
                let tpl = with_key_slug(tpl, &key);
                (key, tpl)
            })
            .collect()
    }

    pub fn get_template(&self, name: &str) -> Option<NewsTemplate> {
        self.read_all()
            .remove(name)
            .map(|tpl| with_key_slug(tpl, name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.read_all().contains_key(name)
    }

    /// Sanitize and store `template` under `name`, replacing any existing one.
    pub fn save_template(&self, name: &str, template: NewsTemplate) -> Result<(), String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Template name is required".to_string());
        }

        let mut clean = NewsTemplate {
            name: sanitize::text_field(&template.name),
            description: sanitize::textarea_field(&template.description),
            slug: slug::slugify(template.slug.trim()),
            wrapper_html: sanitize::template_html(&template.wrapper_html),
            item_html: sanitize::template_html(&template.item_html),
            css: template
                .css
                .map(|c| sanitize::stylesheet(&c))
                .filter(|c| !c.trim().is_empty()),
            html: template.html.map(|h| sanitize::template_html(&h)),
        };
        if clean.slug.is_empty() {
            clean.slug = slug::slugify(name);
        }
        let clean = clean.normalized();

        let mut all = self.read_all();
        all.insert(name.to_string(), clean);
        self.write_all(&all)?;
        log::info!("Saved news template '{}'", name);
        Ok(())
    }

    /// Remove a template. When it was the default, the default moves to the
    /// first remaining template (or `list` when none remain).
    pub fn delete_template(&self, name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("Template name is required".to_string());
        }
        let mut all = self.read_all();
        if all.remove(name).is_none() {
            return Err(format!("Template '{}' not found", name));
        }

        self.write_all(&all)?;
        log::info!("Deleted news template '{}'", name);

        if self.get_default_template() == name {
            let next = all
                .keys()
                .next()
                .cloned()
                .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string());
            self.store.setting_set(DEFAULT_TEMPLATE_OPTION, &next)?;
        }
        Ok(())
    }

    pub fn duplicate_template(&self, source: &str, new_name: &str) -> Result<(), String> {
        if source.is_empty() || new_name.trim().is_empty() {
            return Err("Source and new template names are required".to_string());
        }
        let mut copy = self
            .get_template(source)
            .ok_or_else(|| format!("Template '{}' not found", source))?;
        copy.name = format!("{}{}", copy.name, COPY_SUFFIX);
        copy.slug = String::new();
        self.save_template(new_name, copy)
    }

    pub fn set_default_template(&self, name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("Template name is required".to_string());
        }
        if !self.exists(name) {
            return Err(format!("Template '{}' not found", name));
        }
        self.store.setting_set(DEFAULT_TEMPLATE_OPTION, name)
    }

    pub fn get_default_template(&self) -> String {
        self.store
            .setting_get_or(DEFAULT_TEMPLATE_OPTION, FALLBACK_TEMPLATE)
    }

    /// Render a stored template against the fixed sample record.
    pub fn preview_template(&self, name: &str) -> Option<String> {
        let template = self.get_template(name)?;
        Some(render::render_posts(&[sample_record()], &template))
    }

    fn read_all(&self) -> BTreeMap<String, NewsTemplate> {
        let raw = match self.store.setting_get(TEMPLATES_OPTION) {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return BTreeMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("Stored news templates are not valid JSON: {}", e);
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, templates: &BTreeMap<String, NewsTemplate>) -> Result<(), String> {
        let json = serde_json::to_string(templates).map_err(|e| e.to_string())?;
        self.store.setting_set(TEMPLATES_OPTION, &json)
    }
}

fn with_key_slug(mut tpl: NewsTemplate, key: &str) -> NewsTemplate {
    if tpl.slug.is_empty() {
        tpl.slug = slug::slugify(key);
    }
    tpl.normalized()
}
