//! `{if}` / `{ifnot}` / `{else}` blocks inside item templates.
//!
//! The template is lexed into text and tag tokens, parsed into a small tree,
//! and the tree is evaluated against one record at a time. Parsing never
//! fails: tags that do not pair up are kept as literal text.

use std::sync::LazyLock;

use regex::Regex;

use super::record::Record;

/// Any conditional tag. Groups: 1/2 = opening keyword + condition,
/// 3 = else, 4 = closing keyword.
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*(?:(ifnot|if)\s+([^{}]+?)\s*|(else)\s*|/\s*(ifnot|if)\s*)\}").unwrap()
});

static COMPARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([A-Za-z0-9_-]+)\s*(!=|=)\s*(?:"([^"]*)"|'([^']*)')$"#).unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals { field: String, value: String },
    NotEquals { field: String, value: String },
    /// Bare field name; also the fallback for anything unparseable.
    Truthy(String),
}

impl Condition {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(caps) = COMPARE_RE.captures(raw) {
            let field = caps[1].to_string();
            let value = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            return if &caps[2] == "!=" {
                Condition::NotEquals { field, value }
            } else {
                Condition::Equals { field, value }
            };
        }
        Condition::Truthy(raw.to_string())
    }

    pub fn eval(&self, record: &Record) -> bool {
        match self {
            Condition::Equals { field, value } => record.text(field) == *value,
            Condition::NotEquals { field, value } => record.text(field) != *value,
            Condition::Truthy(field) => record.get(field).map(|v| v.is_truthy()).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    If {
        cond: Condition,
        then: Vec<Node>,
        otherwise: Option<Vec<Node>>,
    },
    IfNot {
        cond: Condition,
        body: Vec<Node>,
    },
}

/// Parsed item template, reusable across records.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    nodes: Vec<Node>,
}

impl Conditional {
    pub fn parse(template: &str) -> Self {
        let mut parser = Parser {
            toks: lex(template),
            pos: 0,
        };
        let (nodes, _) = parser.parse_seq(None);
        Conditional { nodes }
    }

    /// True when the template has no conditional blocks at all.
    pub fn is_plain(&self) -> bool {
        self.nodes.iter().all(|n| matches!(n, Node::Text(_)))
    }

    pub fn evaluate(&self, record: &Record) -> String {
        let mut out = String::new();
        eval_nodes(&self.nodes, record, &mut out);
        out
    }
}

fn eval_nodes(nodes: &[Node], record: &Record, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::If {
                cond,
                then,
                otherwise,
            } => {
                if cond.eval(record) {
                    eval_nodes(then, record, out);
                } else if let Some(otherwise) = otherwise {
                    eval_nodes(otherwise, record, out);
                }
            }
            Node::IfNot { cond, body } => {
                if !cond.eval(record) {
                    eval_nodes(body, record, out);
                }
            }
        }
    }
}

// ── Lexer ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Tok<'a> {
    Text(&'a str),
    IfOpen { cond: &'a str, raw: &'a str },
    IfNotOpen { cond: &'a str, raw: &'a str },
    Else(&'a str),
    IfClose(&'a str),
    IfNotClose(&'a str),
}

fn lex(src: &str) -> Vec<Tok<'_>> {
    let mut toks = Vec::new();
    let mut last = 0;
    for caps in TAG_RE.captures_iter(src) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        if whole.start() > last {
            toks.push(Tok::Text(&src[last..whole.start()]));
        }
        let raw = whole.as_str();
        let tok = if let (Some(kw), Some(cond)) = (caps.get(1), caps.get(2)) {
            if kw.as_str() == "ifnot" {
                Tok::IfNotOpen { cond: cond.as_str(), raw }
            } else {
                Tok::IfOpen { cond: cond.as_str(), raw }
            }
        } else if caps.get(3).is_some() {
            Tok::Else(raw)
        } else if caps.get(4).map(|m| m.as_str()) == Some("ifnot") {
            Tok::IfNotClose(raw)
        } else {
            Tok::IfClose(raw)
        };
        toks.push(tok);
        last = whole.end();
    }
    if last < src.len() {
        toks.push(Tok::Text(&src[last..]));
    }
    toks
}

// ── Parser ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    IfThen,
    IfElse,
    IfNot,
}

enum Stop<'a> {
    Else(&'a str),
    Close,
    Eof,
}

struct Parser<'a> {
    toks: Vec<Tok<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn next(&mut self) -> Option<Tok<'a>> {
        let tok = self.toks.get(self.pos).copied();
        self.pos += 1;
        tok
    }

    fn parse_seq(&mut self, frame: Option<Frame>) -> (Vec<Node>, Stop<'a>) {
        let mut nodes = Vec::new();
        while let Some(tok) = self.next() {
            match tok {
                Tok::Text(t) => push_text(&mut nodes, t),
                Tok::IfOpen { cond, raw } => {
                    let parsed = self.parse_if(cond, raw);
                    append(&mut nodes, parsed);
                }
                Tok::IfNotOpen { cond, raw } => {
                    let parsed = self.parse_ifnot(cond, raw);
                    append(&mut nodes, parsed);
                }
                Tok::Else(raw) => {
                    if frame == Some(Frame::IfThen) {
                        return (nodes, Stop::Else(raw));
                    }
                    push_text(&mut nodes, raw);
                }
                Tok::IfClose(raw) => {
                    if matches!(frame, Some(Frame::IfThen) | Some(Frame::IfElse)) {
                        return (nodes, Stop::Close);
                    }
                    push_text(&mut nodes, raw);
                }
                Tok::IfNotClose(raw) => {
                    if frame == Some(Frame::IfNot) {
                        return (nodes, Stop::Close);
                    }
                    push_text(&mut nodes, raw);
                }
            }
        }
        (nodes, Stop::Eof)
    }

    fn parse_if(&mut self, cond: &str, raw: &'a str) -> Vec<Node> {
        let (then, stop) = self.parse_seq(Some(Frame::IfThen));
        match stop {
            Stop::Close => vec![Node::If {
                cond: Condition::parse(cond),
                then,
                otherwise: None,
            }],
            Stop::Else(else_raw) => {
                let (otherwise, stop) = self.parse_seq(Some(Frame::IfElse));
                match stop {
                    Stop::Close => vec![Node::If {
                        cond: Condition::parse(cond),
                        then,
                        otherwise: Some(otherwise),
                    }],
                    _ => {
                        let mut nodes = vec![Node::Text(raw.to_string())];
                        append(&mut nodes, then);
                        push_text(&mut nodes, else_raw);
                        append(&mut nodes, otherwise);
                        nodes
                    }
                }
            }
            Stop::Eof => {
                let mut nodes = vec![Node::Text(raw.to_string())];
                append(&mut nodes, then);
                nodes
            }
        }
    }

    fn parse_ifnot(&mut self, cond: &str, raw: &'a str) -> Vec<Node> {
        let (body, stop) = self.parse_seq(Some(Frame::IfNot));
        match stop {
            Stop::Close => vec![Node::IfNot {
                cond: Condition::parse(cond),
                body,
            }],
            _ => {
                let mut nodes = vec![Node::Text(raw.to_string())];
                append(&mut nodes, body);
                nodes
            }
        }
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(prev)) = nodes.last_mut() {
        prev.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn append(nodes: &mut Vec<Node>, more: Vec<Node>) {
    for node in more {
        match node {
            Node::Text(t) => push_text(nodes, &t),
            other => nodes.push(other),
        }
    }
}
