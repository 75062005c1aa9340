use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::render::strip_tags;

/// Tags allowed in stored template HTML, with their allowed attributes.
/// `data-*` in a list allows every data attribute on that tag.
const ALLOWED_TAGS: &[(&str, &[&str])] = &[
    ("div", &["class", "id", "data-*"]),
    ("article", &["class", "id", "data-*"]),
    ("section", &["class", "id", "data-*"]),
    ("header", &["class", "id", "data-*"]),
    ("footer", &["class", "id", "data-*"]),
    ("h1", &["class", "id"]),
    ("h2", &["class", "id"]),
    ("h3", &["class", "id"]),
    ("h4", &["class", "id"]),
    ("h5", &["class", "id"]),
    ("h6", &["class", "id"]),
    ("p", &["class", "id"]),
    ("a", &["href", "class", "id", "target", "rel"]),
    ("span", &["class", "id", "data-*"]),
    ("time", &["class", "id", "datetime"]),
    (
        "img",
        &["src", "alt", "class", "id", "width", "height", "loading"],
    ),
    ("figure", &["class", "id"]),
    ("figcaption", &["class", "id"]),
    ("blockquote", &["class", "id", "cite"]),
    ("cite", &["class"]),
    ("code", &["class"]),
    ("pre", &["class"]),
    ("ul", &["class", "id"]),
    ("ol", &["class", "id"]),
    ("li", &["class", "id"]),
    ("dl", &["class", "id"]),
    ("dt", &["class"]),
    ("dd", &["class"]),
    ("strong", &["class"]),
    ("em", &["class"]),
    ("small", &["class"]),
    ("mark", &["class"]),
    ("del", &["class", "datetime"]),
    ("ins", &["class", "datetime"]),
    ("sub", &["class"]),
    ("sup", &["class"]),
    ("br", &[]),
    ("hr", &["class"]),
];

/// Elements removed together with everything inside them.
const STRIPPED_WITH_CONTENT: &[&str] = &["script", "style", "iframe", "object", "embed"];

/// URL schemes never allowed in link-like attributes.
const DANGEROUS_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

const URI_ATTRIBUTES: &[&str] = &["href", "src", "cite"];

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    STRIPPED_WITH_CONTENT
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{0}\b[^>]*>.*?</{0}\s*>", tag)).unwrap())
        .collect()
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(/?)([a-zA-Z][a-zA-Z0-9]*)\b([^>]*?)(/?)>").unwrap());

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .unwrap()
});

/// Reduce template HTML to the allowed tag set. Template tokens and
/// conditional tags are plain text to the sanitizer and pass untouched.
pub fn template_html(input: &str) -> String {
    let mut html = COMMENT_RE.replace_all(input, "").into_owned();
    for re in BLOCK_RES.iter() {
        html = re.replace_all(&html, "").into_owned();
    }
    TAG_RE
        .replace_all(&html, |caps: &Captures| clean_tag(caps))
        .into_owned()
}

fn clean_tag(caps: &Captures) -> String {
    let closing = !caps[1].is_empty();
    let name = caps[2].to_ascii_lowercase();
    let allowed = match ALLOWED_TAGS.iter().find(|(tag, _)| *tag == name) {
        Some((_, attrs)) => *attrs,
        None => return String::new(),
    };
    if closing {
        return format!("</{}>", name);
    }

    let mut out = format!("<{}", name);
    for attr in ATTR_RE.captures_iter(&caps[3]) {
        let attr_name = attr[1].to_ascii_lowercase();
        if !attribute_allowed(allowed, &attr_name) {
            continue;
        }
        let value = attr
            .get(2)
            .or_else(|| attr.get(3))
            .or_else(|| attr.get(4))
            .map(|m| m.as_str());
        match value {
            Some(v) => {
                if URI_ATTRIBUTES.contains(&attr_name.as_str()) && has_dangerous_scheme(v) {
                    continue;
                }
                out.push(' ');
                out.push_str(&attr_name);
                out.push('=');
                out.push_str(&quote_attr(v));
            }
            None => out.push_str(&format!(" {}", attr_name)),
        }
    }
    if !caps[4].is_empty() {
        out.push_str(" /");
    }
    out.push('>');
    out
}

/// Quote an attribute value. Only a single-quoted value can hold `"`; it
/// keeps its quotes so conditions like `{if status="draft"}` stay intact.
fn quote_attr(value: &str) -> String {
    if value.contains('"') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value)
    }
}

fn attribute_allowed(allowed: &[&str], name: &str) -> bool {
    if name.starts_with("on") {
        return false;
    }
    allowed.contains(&name) || (name.starts_with("data-") && allowed.contains(&"data-*"))
}

fn has_dangerous_scheme(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    DANGEROUS_SCHEMES.iter().any(|s| compact.starts_with(s))
}

/// Single-line plain text: tags stripped, whitespace collapsed.
pub fn text_field(input: &str) -> String {
    strip_tags(input).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Multi-line plain text: tags stripped, line breaks kept, each line trimmed.
pub fn textarea_field(input: &str) -> String {
    strip_tags(input)
        .lines()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Raw stylesheet text with anything that could close the style element
/// or open markup removed.
pub fn stylesheet(input: &str) -> String {
    let mut css = input.to_string();
    for needle in ["</style", "</STYLE", "<script", "<SCRIPT"] {
        css = css.replace(needle, "");
    }
    css.trim().to_string()
}
