use std::borrow::Cow;
use std::collections::HashMap;

use super::dates::DateSources;
use super::record::Record;

/// Prefixes that expose a record field as an extra `{token}`.
pub const EXTRA_FIELD_PREFIXES: &[&str] = &["andw_", "andw-"];

/// Tokens every template can use, whether or not the record has the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedToken {
    Title,
    Date,
    Excerpt,
    Thumbnail,
    EventDate,
    LinkUrl,
    LinkTarget,
    Pinned,
    Categories,
    NewsPinned,
}

impl FixedToken {
    pub const ALL: [FixedToken; 10] = [
        FixedToken::Title,
        FixedToken::Date,
        FixedToken::Excerpt,
        FixedToken::Thumbnail,
        FixedToken::EventDate,
        FixedToken::LinkUrl,
        FixedToken::LinkTarget,
        FixedToken::Pinned,
        FixedToken::Categories,
        FixedToken::NewsPinned,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FixedToken::Title => "title",
            FixedToken::Date => "date",
            FixedToken::Excerpt => "excerpt",
            FixedToken::Thumbnail => "thumbnail",
            FixedToken::EventDate => "event_date",
            FixedToken::LinkUrl => "link_url",
            FixedToken::LinkTarget => "link_target",
            FixedToken::Pinned => "pinned",
            FixedToken::Categories => "categories",
            FixedToken::NewsPinned => "andw-news-pinned",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    fn value_for(self, record: &Record) -> String {
        match self {
            FixedToken::LinkTarget => match record.get("link_target") {
                Some(v) => v.as_text(),
                None => "_self".to_string(),
            },
            FixedToken::NewsPinned => match record.get("andw-news-pinned") {
                Some(v) => v.as_text(),
                None => {
                    let pinned = record.get("pinned").map(|v| v.is_truthy()).unwrap_or(false);
                    if pinned { "1" } else { "0" }.to_string()
                }
            },
            other => record.text(other.name()),
        }
    }
}

pub fn is_extra_field(name: &str) -> bool {
    EXTRA_FIELD_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Token → value table for one record: the fixed set, any prefixed extra
/// fields the record carries, and the formatted date tokens.
#[derive(Debug, Clone)]
pub struct TokenTable {
    fixed: HashMap<FixedToken, String>,
    extra: HashMap<String, String>,
    dates: DateSources,
}

impl TokenTable {
    pub fn for_record(record: &Record) -> Self {
        let fixed = FixedToken::ALL
            .iter()
            .map(|t| (*t, t.value_for(record)))
            .collect();
        let extra = record
            .iter()
            .filter(|(k, _)| is_extra_field(k) && FixedToken::from_name(k).is_none())
            .map(|(k, v)| (k.clone(), v.as_text()))
            .collect();
        TokenTable {
            fixed,
            extra,
            dates: DateSources::from_record(record),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        match FixedToken::from_name(name) {
            Some(t) => self.fixed.get(&t).map(String::as_str),
            None => self.extra.get(name).map(String::as_str),
        }
    }

    fn value(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.lookup(name) {
            Some(v) => Some(Cow::Borrowed(v)),
            None => self.dates.expand(name).map(Cow::Owned),
        }
    }

    /// Replace known `{token}`s, `{date:FMT}` included, in one left-to-right
    /// scan. Substituted values are not scanned again; unknown `{...}` stays
    /// as written.
    pub fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let replaced = after
                .find('}')
                .and_then(|close| self.value(&after[..close]).map(|v| (v, close)));
            match replaced {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}
