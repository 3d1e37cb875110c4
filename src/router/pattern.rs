use std::fmt::Display;

use regex::Regex;

use crate::error::PatternError;

/// One parsed segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    /// `:name`, optionally constrained by an inline regex: `:name{[0-9]+}`.
    Param {
        name: String,
        constraint: Option<String>,
    },
    /// A bare `*` before the final segment: matches exactly one segment,
    /// binds nothing.
    Wildcard,
    /// A trailing `*`: captures the full non-empty remainder under `"*"`.
    Tail,
}

impl Segment {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(text) => text.fmt(f),
            Self::Param {
                name,
                constraint: None,
            } => write!(f, ":{name}"),
            Self::Param {
                name,
                constraint: Some(constraint),
            } => write!(f, ":{name}{{{constraint}}}"),
            Self::Wildcard | Self::Tail => "*".fmt(f),
        }
    }
}

/// Wraps an inline constraint so it must cover a whole segment.
pub(crate) fn anchored(constraint: &str) -> String {
    format!("^(?:{constraint})$")
}

/// Splits a concrete request path into non-empty segments, so `/a`, `/a/`
/// and `//a` are the same path and `/` is the empty list.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|segment| !segment.is_empty()).collect()
}

pub(crate) fn normalize(path: &str) -> String {
    let segments = split_path(path);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Parses a template into one or two expanded segment lists; a trailing `?`
/// on the final dynamic segment produces both the with- and without-segment
/// variants.
pub(crate) fn parse(template: &str) -> Result<Vec<Vec<Segment>>, PatternError> {
    if !template.starts_with('/') {
        return Err(PatternError::MissingLeadingSlash(template.to_string()));
    }
    let mut raw = split_template(template)?;
    let mut optional = false;
    if let Some(last) = raw.last_mut() {
        if last.ends_with('?') {
            last.pop();
            optional = true;
        }
    }

    let mut segments = Vec::new();
    let count = raw.len();
    for (index, part) in raw.iter().enumerate() {
        parse_segment(part, index + 1 == count, template, &mut segments)?;
    }

    if optional {
        match segments.last() {
            Some(Segment::Param { .. }) | Some(Segment::Tail) => {}
            _ => return Err(PatternError::OptionalLiteral(template.to_string())),
        }
        let mut without = segments.clone();
        without.pop();
        Ok(vec![segments, without])
    } else {
        Ok(vec![segments])
    }
}

/// Splits on `/` outside braces, so `{a/b}` groups and `:id{[0-9/]+}`
/// constraints survive as single parts.
fn split_template(template: &str) -> Result<Vec<String>, PatternError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in template.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| PatternError::UnclosedBrace(template.to_string()))?;
                current.push(c);
            }
            '/' if depth == 0 => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if depth != 0 {
        return Err(PatternError::UnclosedBrace(template.to_string()));
    }
    if !current.is_empty() {
        parts.push(current);
    }
    Ok(parts)
}

fn parse_segment(
    raw: &str,
    last: bool,
    template: &str,
    out: &mut Vec<Segment>,
) -> Result<(), PatternError> {
    if raw == "*" {
        out.push(if last { Segment::Tail } else { Segment::Wildcard });
        return Ok(());
    }
    if let Some(rest) = raw.strip_prefix(':') {
        let (name, constraint) = match rest.split_once('{') {
            Some((name, tail)) => {
                let constraint = tail
                    .strip_suffix('}')
                    .ok_or_else(|| PatternError::UnclosedBrace(template.to_string()))?;
                (name, Some(constraint.to_string()))
            }
            None => (rest, None),
        };
        if name.is_empty() {
            return Err(PatternError::EmptyParamName(template.to_string()));
        }
        if let Some(constraint) = &constraint {
            Regex::new(&anchored(constraint)).map_err(|e| PatternError::InvalidConstraint {
                template: template.to_string(),
                detail: e.to_string(),
            })?;
        }
        out.push(Segment::Param {
            name: name.to_string(),
            constraint,
        });
        return Ok(());
    }
    if raw.starts_with('{') && raw.ends_with('}') {
        // Multi-segment literal group: `{css/vendor}` contributes two
        // literal segments.
        out.extend(
            raw[1..raw.len() - 1]
                .split('/')
                .filter(|part| !part.is_empty())
                .map(|part| Segment::Literal(part.to_string())),
        );
        return Ok(());
    }
    out.push(Segment::Literal(raw.to_string()));
    Ok(())
}
