//! News template renderer.
//!
//! An item template goes through two stages per record: conditional
//! blocks are resolved, then `{token}`s (`{date:FMT}` included) are
//! substituted in a single scan. Rendered items are joined and dropped into
//! the wrapper's `{items}` slot.

pub mod conditional;
pub mod dates;
pub mod record;
pub mod styles;
pub mod tokens;

pub use conditional::Conditional;
pub use record::{FieldValue, Record};
pub use styles::StyleQueue;
pub use tokens::TokenTable;

use crate::models::template::NewsTemplate;

/// Placeholder in a wrapper that receives the rendered items.
pub const ITEMS_PLACEHOLDER: &str = "{items}";

/// Render one record through an item template.
pub fn render_item(item_html: &str, record: &Record) -> String {
    render_parsed(&Conditional::parse(item_html), record)
}

fn render_parsed(parsed: &Conditional, record: &Record) -> String {
    let resolved = parsed.evaluate(record);
    TokenTable::for_record(record).substitute(&resolved)
}

/// Render every record with `item_html`, in order, and place the result in
/// `wrapper_html`. A wrapper without `{items}` comes back without the items.
pub fn compose(wrapper_html: &str, item_html: &str, records: &[Record]) -> String {
    let parsed = Conditional::parse(item_html);
    // Without conditionals the resolved text is the same for every record
    let plain = parsed.is_plain().then(|| parsed.evaluate(&Record::new()));
    let items: String = records
        .iter()
        .map(|r| match plain.as_deref() {
            Some(text) => TokenTable::for_record(r).substitute(text),
            None => render_parsed(&parsed, r),
        })
        .collect();
    wrapper_html.replace(ITEMS_PLACEHOLDER, &items)
}

/// Render a list of records through a stored template.
pub fn render_posts(records: &[Record], template: &NewsTemplate) -> String {
    let template = template.clone().normalized();
    compose(&template.wrapper_html, &template.item_html, records)
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Drop anything that looks like a tag. Used for excerpts and plain-text
/// fields, not as an HTML sanitizer.
pub(crate) fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

pub(crate) fn truncate_words(text: &str, max_words: usize, more: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        words.join(" ")
    } else {
        let mut result = words[..max_words].join(" ");
        result.push_str(more);
        result
    }
}
