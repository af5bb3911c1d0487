use serde_json::Value;

use crate::pipeline::PathExtractor;

/// Resolves `$.data.items[0].id` style paths against a JSON body.
///
/// Accepted segments: `.key`, `[index]`, `['key']` and `["key"]`. The
/// leading `$` is optional. Strings come back unquoted; every other value is
/// rendered as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPathExtractor;

impl PathExtractor for JsonPathExtractor {
    fn extract(&self, body: &str, path: &str) -> Option<String> {
        let root: Value = serde_json::from_str(body).ok()?;
        let segments = parse_path(path)?;
        let mut current = &root;
        for segment in &segments {
            current = match segment {
                Segment::Key(key) => current.get(key.as_str())?,
                Segment::Index(index) => current.get(*index)?,
            };
        }
        Some(match current {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

/// `None` when the path is malformed.
pub(crate) fn parse_path(path: &str) -> Option<Vec<Segment>> {
    let trimmed = path.trim();
    let mut rest = trimmed.strip_prefix('$').unwrap_or(trimmed);
    let mut segments = Vec::new();

    while !rest.is_empty() {
        if let Some(after_dot) = rest.strip_prefix('.') {
            let end = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            let (key, remaining) = after_dot.split_at(end);
            if key.is_empty() {
                return None;
            }
            segments.push(Segment::Key(key.to_owned()));
            rest = remaining;
        } else if let Some(after_bracket) = rest.strip_prefix('[') {
            let end = after_bracket.find(']')?;
            let (inner, remaining) = after_bracket.split_at(end);
            segments.push(bracket_segment(inner.trim())?);
            rest = remaining.strip_prefix(']')?;
        } else if segments.is_empty() {
            // Bare leading key, as in `data.items`.
            let end = rest.find(['.', '[']).unwrap_or(rest.len());
            let (key, remaining) = rest.split_at(end);
            segments.push(Segment::Key(key.to_owned()));
            rest = remaining;
        } else {
            return None;
        }
    }

    Some(segments)
}

fn bracket_segment(inner: &str) -> Option<Segment> {
    for quote in ['\'', '"'] {
        if let Some(quoted) = inner
            .strip_prefix(quote)
            .and_then(|value| value.strip_suffix(quote))
        {
            return Some(Segment::Key(quoted.to_owned()));
        }
    }
    inner.parse::<usize>().ok().map(Segment::Index)
}
