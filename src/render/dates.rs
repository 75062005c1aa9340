//! `{date:FORMAT}` and `{event_date:FORMAT}` expansion.
//!
//! FORMAT is either a named preset or a PHP `date()` style pattern
//! (`Y-m-d`, `n/j`, `Y年n月j日(D)`, ...). Values that cannot be parsed as a
//! date are emitted unchanged.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use regex::Regex;

use super::record::Record;

static DOTTED_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\.(\d{1,2})\.(\d{1,2})$").unwrap());

/// Named presets usable as `{date:jp}` etc.
pub const NAMED_FORMATS: &[(&str, &str)] = &[
    ("jp", "Y年n月j日"),
    ("jp_full", "Y年m月d日"),
    ("short", "n/j"),
    ("short_full", "m/d"),
    ("iso", "Y-m-d"),
    ("dot", "Y.m.d"),
    ("slash", "Y/m/d"),
    ("w", "Y年n月j日(D)"),
    ("w_full", "Y年m月d日(D)"),
];

/// Explicit formats tried after the flexible parser, in order.
/// Pairs are (PHP pattern, chrono pattern, has_time).
const EXPLICIT_FORMATS: &[(&str, &str, bool)] = &[
    ("Y-m-d", "%Y-%m-%d", false),
    ("Y.m.d", "%Y.%m.%d", false),
    ("Y/m/d", "%Y/%m/%d", false),
    ("Y-m-d H:i:s", "%Y-%m-%d %H:%M:%S", true),
    ("m/d/Y", "%m/%d/%Y", false),
    ("d/m/Y", "%d/%m/%Y", false),
    ("d.m.Y", "%d.%m.%Y", false),
];

/// Values behind the `{date:FORMAT}` and `{event_date:FORMAT}` tokens of
/// one record.
#[derive(Debug, Clone, Default)]
pub struct DateSources {
    date: String,
    event_date: String,
}

impl DateSources {
    /// `date_raw` is preferred; the display `date` is used when it is empty.
    pub fn from_record(record: &Record) -> Self {
        let raw = record.text("date_raw");
        DateSources {
            date: if raw.is_empty() { record.text("date") } else { raw },
            event_date: record.text("event_date"),
        }
    }

    /// Value for a token name such as `date:jp`. `None` when `name` is not
    /// a formatted date token.
    pub fn expand(&self, name: &str) -> Option<String> {
        let (field, format) = name.split_once(':')?;
        if format.is_empty() || format.contains('{') {
            return None;
        }
        match field {
            "date" => Some(format_source(&self.date, format)),
            // Pre-rendered markup is emitted as is
            "event_date" if self.event_date.contains('<') => Some(self.event_date.clone()),
            "event_date" => Some(format_source(&self.event_date, format)),
            _ => None,
        }
    }
}

fn format_source(source: &str, format: &str) -> String {
    if source.is_empty() {
        return String::new();
    }
    match parse_datetime(source) {
        Some(dt) => format_php(&dt, resolve_format(format)),
        None => source.to_string(),
    }
}

/// Named preset lookup; unknown names are taken as literal patterns.
pub fn resolve_format(name: &str) -> &str {
    let key = name.trim();
    NAMED_FORMATS
        .iter()
        .find(|(n, _)| *n == key)
        .map(|(_, pattern)| *pattern)
        .unwrap_or(name)
}

/// Parse a stored date value. Strategies run in order; first success wins.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    parse_flexible(s)
        .or_else(|| parse_explicit(s))
        .or_else(|| parse_dotted(s))
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

fn parse_flexible(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    const DATE_FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%Y%m%d",
        "%B %d, %Y",
        "%b %d, %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(midnight(d));
        }
    }
    None
}

fn parse_explicit(s: &str) -> Option<NaiveDateTime> {
    EXPLICIT_FORMATS.iter().find_map(|(_, fmt, has_time)| {
        if *has_time {
            NaiveDateTime::parse_from_str(s, fmt).ok()
        } else {
            NaiveDate::parse_from_str(s, fmt).ok().map(midnight)
        }
    })
}

fn parse_dotted(s: &str) -> Option<NaiveDateTime> {
    let caps = DOTTED_DATE_RE.captures(s)?;
    let normalized = format!(
        "{}-{:0>2}-{:0>2}",
        &caps[1], &caps[2], &caps[3]
    );
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .map(midnight)
}

// ── PHP-style formatting ──────────────────────────────────

const WEEKDAY_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEKDAY_LONG: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const MONTH_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTH_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Format `dt` with a PHP `date()` pattern. Values are treated as UTC.
pub fn format_php(dt: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'D' => out.push_str(WEEKDAY_SHORT[dt.weekday().num_days_from_monday() as usize]),
            'j' => out.push_str(&dt.day().to_string()),
            'l' => out.push_str(WEEKDAY_LONG[dt.weekday().num_days_from_monday() as usize]),
            'N' => out.push_str(&dt.weekday().number_from_monday().to_string()),
            'S' => out.push_str(ordinal_suffix(dt.day())),
            'w' => out.push_str(&dt.weekday().num_days_from_sunday().to_string()),
            'z' => out.push_str(&dt.ordinal0().to_string()),
            'W' => out.push_str(&format!("{:02}", dt.iso_week().week())),
            'F' => out.push_str(MONTH_LONG[dt.month0() as usize]),
            'M' => out.push_str(MONTH_SHORT[dt.month0() as usize]),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'n' => out.push_str(&dt.month().to_string()),
            't' => out.push_str(&days_in_month(dt.year(), dt.month()).to_string()),
            'L' => out.push(if is_leap(dt.year()) { '1' } else { '0' }),
            'o' => out.push_str(&dt.iso_week().year().to_string()),
            'Y' => out.push_str(&format!("{:04}", dt.year())),
            'y' => out.push_str(&format!("{:02}", dt.year().rem_euclid(100))),
            'a' => out.push_str(if dt.hour() < 12 { "am" } else { "pm" }),
            'A' => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
            'g' => out.push_str(&hour12(dt.hour()).to_string()),
            'G' => out.push_str(&dt.hour().to_string()),
            'h' => out.push_str(&format!("{:02}", hour12(dt.hour()))),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'i' => out.push_str(&format!("{:02}", dt.minute())),
            's' => out.push_str(&format!("{:02}", dt.second())),
            'u' => out.push_str(&format!("{:06}", dt.nanosecond() / 1_000)),
            'v' => out.push_str(&format!("{:03}", dt.nanosecond() / 1_000_000)),
            'U' => out.push_str(
                &DateTime::<Utc>::from_naive_utc_and_offset(*dt, Utc)
                    .timestamp()
                    .to_string(),
            ),
            'e' | 'T' => out.push_str("UTC"),
            'P' => out.push_str("+00:00"),
            'O' => out.push_str("+0000"),
            'Z' | 'I' => out.push('0'),
            'c' => out.push_str(&dt.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()),
            'r' => out.push_str(&dt.format("%a, %d %b %Y %H:%M:%S +0000").to_string()),
            other => out.push(other),
        }
    }
    out
}

fn hour12(h: u32) -> u32 {
    match h % 12 {
        0 => 12,
        n => n,
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}
