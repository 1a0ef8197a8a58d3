//! Route pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns into segments
//! - Match request paths and capture parameters
//!
//! # Design Decisions
//! - Both `/users/:id` and `/users/{id}` parameter syntaxes are accepted
//! - `*` and `{*name}` capture the rest of the path and must come last
//! - Literal segments compare ASCII case-insensitively
//! - One trailing slash is ignored on both sides
//! - Captured values are percent-decoded; literals compare against the raw path
//! - No regex, matching is a single pass over the segments

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::percent_decode_str;

/// Parameters captured while matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(BTreeMap<String, String>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Rest(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, String> {
        if !pattern.starts_with('/') {
            return Err(format!("pattern `{}` must start with `/`", pattern));
        }

        let raw = split(pattern);
        let mut segments = Vec::with_capacity(raw.len());
        for (i, part) in raw.iter().enumerate() {
            let segment = parse_segment(part).map_err(|reason| format!("pattern `{}`: {}", pattern, reason))?;
            if matches!(segment, Segment::Rest(_)) && i + 1 != raw.len() {
                return Err(format!("pattern `{}`: wildcard must be the last segment", pattern));
            }
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Match a request path, returning the captured parameters.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts = split(path);
        let mut params = BTreeMap::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Rest(name) => {
                    let rest = parts
                        .get(i..)
                        .unwrap_or_default()
                        .iter()
                        .map(|part| decode(part))
                        .collect::<Vec<_>>()
                        .join("/");
                    params.insert(name.clone(), rest);
                    return Some(PathParams(params));
                }
                Segment::Literal(literal) => {
                    if !parts.get(i)?.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i).filter(|v| !v.is_empty())?;
                    params.insert(name.clone(), decode(value));
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(PathParams(params))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn parse_segment(part: &str) -> Result<Segment, String> {
    if part == "*" {
        return Ok(Segment::Rest("0".to_string()));
    }
    if let Some(name) = part.strip_prefix(':') {
        return param_name(name).map(Segment::Param);
    }
    if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        return match inner.strip_prefix('*') {
            Some(name) => param_name(name).map(Segment::Rest),
            None => param_name(inner).map(Segment::Param),
        };
    }
    if part.contains(['{', '}', '*']) {
        return Err(format!("unsupported segment `{}`", part));
    }
    Ok(Segment::Literal(part.to_string()))
}

fn param_name(name: &str) -> Result<String, String> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid parameter name `{}`", name));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(p: &str) -> PathPattern {
        PathPattern::parse(p).unwrap()
    }

    #[test]
    fn literal_match_ignores_case_and_trailing_slash() {
        let p = pattern("/api/Users");
        assert!(p.matches("/api/users").is_some());
        assert!(p.matches("/API/USERS/").is_some());
        assert!(p.matches("/api/users/7").is_none());
        assert!(p.matches("/api").is_none());
    }

    #[test]
    fn root_pattern() {
        let p = pattern("/");
        assert!(p.matches("/").is_some());
        assert!(p.matches("/x").is_none());
    }

    #[test]
    fn captures_params_in_both_syntaxes() {
        let express = pattern("/users/:id/posts/:post_id");
        let params = express.matches("/users/7/posts/42").unwrap();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("post_id"), Some("42"));

        let braces = pattern("/users/{id}");
        assert_eq!(braces.matches("/users/ada").unwrap().get("id"), Some("ada"));
        assert!(braces.matches("/users").is_none());
    }

    #[test]
    fn captured_values_are_percent_decoded() {
        let p = pattern("/users/:id");
        assert_eq!(p.matches("/users/a%20b").unwrap().get("id"), Some("a b"));
        assert_eq!(p.matches("/users/caf%C3%A9").unwrap().get("id"), Some("café"));
        assert_eq!(p.matches("/users/a+b").unwrap().get("id"), Some("a+b"));

        let rest = pattern("/files/{*rest}");
        assert_eq!(rest.matches("/files/my%20docs/a%2Fb.txt").unwrap().get("rest"), Some("my docs/a/b.txt"));
    }

    #[test]
    fn wildcards_capture_the_rest() {
        let named = pattern("/files/{*rest}");
        assert_eq!(named.matches("/files/a/b/c.txt").unwrap().get("rest"), Some("a/b/c.txt"));

        let bare = pattern("/static/*");
        assert_eq!(bare.matches("/static/css/site.css").unwrap().get("0"), Some("css/site.css"));
        assert_eq!(bare.matches("/static").unwrap().get("0"), Some(""));
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert!(PathPattern::parse("users").is_err());
        assert!(PathPattern::parse("/a/*/b").is_err());
        assert!(PathPattern::parse("/a/:").is_err());
        assert!(PathPattern::parse("/a/{bad-name}").is_err());
        assert!(PathPattern::parse("/a/b{c}").is_err());
    }
}
