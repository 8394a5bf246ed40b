//! Route id parsing.
//!
//! Turns a path template such as `/blog/[slug]` or `/[[lang]]/[...rest]`
//! into a regular expression and its ordered parameter bindings.
//!
//! # Grammar
//! - `[name]`: one segment
//! - `[[name]]`: optional; as a whole segment the segment itself may be absent
//! - `[...name]`: rest; as a whole segment it spans zero or more segments
//! - `=matcher` after the name constrains the value with a named matcher
//! - `(group)` segments organise routes without affecting the path
//! - `[x+2f]` and `[u+002f]` encode a literal character by code point

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::RouteParam;

static PARAM: OnceLock<Regex> = OnceLock::new();
static REST_SEGMENT: OnceLock<Regex> = OnceLock::new();
static OPTIONAL_SEGMENT: OnceLock<Regex> = OnceLock::new();

fn param_grammar() -> &'static Regex {
    PARAM.get_or_init(|| {
        Regex::new(r"^(\[)?(\.\.\.)?(\w+)(?:=(\w+))?(\])?$").expect("param grammar")
    })
}

fn rest_segment() -> &'static Regex {
    REST_SEGMENT
        .get_or_init(|| Regex::new(r"^\[\.\.\.(\w+)(?:=(\w+))?\]$").expect("rest grammar"))
}

fn optional_segment() -> &'static Regex {
    OPTIONAL_SEGMENT.get_or_init(|| {
        Regex::new(r"^\[\[(\w+)(?:=(\w+))?\]\]$").expect("optional grammar")
    })
}

/// Errors raised while parsing a route id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route id {0} must start with '/'")]
    NotAbsolute(String),

    #[error(
        "invalid param [{0}]; params and matcher names can only contain underscores and \
         alphanumeric characters"
    )]
    InvalidParam(String),

    #[error("invalid character escape [{0}]")]
    InvalidEscape(String),

    #[error("invalid pattern: {0}")]
    Regex(String),
}

impl From<regex::Error> for PatternError {
    fn from(e: regex::Error) -> Self {
        PatternError::Regex(e.to_string())
    }
}

/// Pattern source and params derived from a route id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoute {
    pub pattern: String,
    pub params: Vec<RouteParam>,
}

/// Parse a route id into a pattern and its parameter bindings.
pub fn parse_route_id(id: &str) -> Result<ParsedRoute, PatternError> {
    if !id.starts_with('/') {
        return Err(PatternError::NotAbsolute(id.to_string()));
    }
    if id == "/" {
        return Ok(ParsedRoute {
            pattern: "^/$".to_string(),
            params: Vec::new(),
        });
    }

    let mut params = Vec::new();
    let mut pattern = String::from("^");

    for segment in route_segments(id) {
        if let Some(caps) = rest_segment().captures(segment) {
            params.push(param(&caps[1], caps.get(2).map(|m| m.as_str()), false, true, true));
            pattern.push_str("(?:/(.*))?");
            continue;
        }

        if let Some(caps) = optional_segment().captures(segment) {
            params.push(param(&caps[1], caps.get(2).map(|m| m.as_str()), true, false, true));
            pattern.push_str("(?:/([^/]+))?");
            continue;
        }

        if segment.is_empty() {
            continue;
        }

        pattern.push('/');
        for (i, part) in split_segment(segment).into_iter().enumerate() {
            match part {
                Part::Literal(text) => pattern.push_str(&escape(text)),
                Part::Dynamic(content) => {
                    if let Some(literal) = decode_escape(content)? {
                        pattern.push_str(&escape(&literal));
                        continue;
                    }

                    let caps = param_grammar()
                        .captures(content)
                        .ok_or_else(|| PatternError::InvalidParam(content.to_string()))?;
                    let optional = caps.get(1).is_some();
                    let rest = caps.get(2).is_some();
                    // A rest param opening its segment may swallow separators.
                    let chained = rest && i == 1 && segment.starts_with('[');

                    let matcher = caps.get(4).map(|m| m.as_str());
                    params.push(param(&caps[3], matcher, optional, rest, chained));
                    pattern.push_str(if rest {
                        "(.*?)"
                    } else if optional {
                        "([^/]*)?"
                    } else {
                        "([^/]+?)"
                    });
                }
            }
        }
    }

    pattern.push_str("/?$");
    Ok(ParsedRoute { pattern, params })
}

/// Path segments of a route id, minus `(group)` segments.
pub fn route_segments(id: &str) -> impl Iterator<Item = &str> {
    id[1..].split('/').filter(|segment| !is_group(segment))
}

fn is_group(segment: &str) -> bool {
    segment.len() > 2
        && segment.starts_with('(')
        && segment.ends_with(')')
        && !segment[1..segment.len() - 1].contains(')')
}

fn param(
    name: &str,
    matcher: Option<&str>,
    optional: bool,
    rest: bool,
    chained: bool,
) -> RouteParam {
    RouteParam {
        name: name.to_string(),
        matcher: matcher.map(str::to_string),
        optional,
        rest,
        chained,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Part<'a> {
    Literal(&'a str),
    Dynamic(&'a str),
}

/// Split a segment into alternating literal and `[...]` parts.
///
/// The first part is always a literal (possibly empty), so dynamic parts sit
/// at odd positions. A bracket group closes at the first `]` that is not
/// followed by another `]`, which keeps `[[name]]` in one piece.
fn split_segment(segment: &str) -> Vec<Part<'_>> {
    let bytes = segment.as_bytes();
    let mut parts = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'[' {
            let close = (i + 2..bytes.len())
                .find(|&j| bytes[j] == b']' && bytes.get(j + 1) != Some(&b']'));
            if let Some(close) = close {
                parts.push(Part::Literal(&segment[literal_start..i]));
                parts.push(Part::Dynamic(&segment[i + 1..close]));
                i = close + 1;
                literal_start = i;
                continue;
            }
        }
        i += 1;
    }

    parts.push(Part::Literal(&segment[literal_start..]));
    parts
}

/// Decode `x+HH` and `u+HHHH[-HHHH...]` escapes.
fn decode_escape(content: &str) -> Result<Option<String>, PatternError> {
    let invalid = || PatternError::InvalidEscape(content.to_string());

    if let Some(hex) = content.strip_prefix("x+") {
        let byte = u8::from_str_radix(hex, 16).map_err(|_| invalid())?;
        return Ok(Some(char::from(byte).to_string()));
    }

    if let Some(codes) = content.strip_prefix("u+") {
        return codes
            .split('-')
            .map(|code| {
                u32::from_str_radix(code, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(invalid)
            })
            .collect::<Result<String, _>>()
            .map(Some);
    }

    Ok(None)
}

/// Escape literal route text for use in a pattern.
///
/// Characters the browser percent-encodes in a pathname are matched in their
/// encoded form.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2[Ff]"),
            '?' => out.push_str("%3[Ff]"),
            '#' => out.push_str("%23"),
            _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    out
}
