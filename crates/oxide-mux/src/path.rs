//! Path pattern matching and route priority.
//!
//! A pattern is a literal path in which `:name` introduces a parameter that
//! captures everything up to the next `/`. A pattern ending in `/` matches
//! every path below it.

use std::cmp::Ordering;

use crate::error::{MuxError, Result};
use crate::request::PathParams;

/// Byte introducing a named parameter.
pub const PARAM_MARKER: u8 = b':';

/// A validated route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// The original pattern string.
    pattern: String,
    /// Parameter names in order of appearance.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Parses a route pattern.
    ///
    /// Pattern syntax:
    /// - `/users` - Literal path
    /// - `/users/:id` - Path with parameter
    /// - `/static/` - Subtree, matches `/static/` and everything below it
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_mux::PathPattern;
    ///
    /// let pattern = PathPattern::parse("/posts/:id/comments/:comment_id").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`MuxError::EmptyPattern`] for an empty pattern and
    /// [`MuxError::DuplicateParam`] if a parameter name repeats.
    pub fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(MuxError::EmptyPattern);
        }

        let bytes = pattern.as_bytes();
        let mut param_names: Vec<String> = Vec::new();
        let mut p = 0;
        while p < bytes.len() {
            if bytes[p] == PARAM_MARKER {
                let start = p + 1;
                p = segment_end(bytes, p);
                let name = &pattern[start..p];
                if param_names.iter().any(|n| n == name) {
                    return Err(MuxError::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                param_names.push(name.to_string());
            } else {
                p += 1;
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            param_names,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns the extracted parameters if the path matches.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        if self.is_static() {
            let hit = self.pattern == path
                || (self.is_subtree() && path.starts_with(self.pattern.as_str()));
            return hit.then(PathParams::new);
        }
        match_pattern(&self.pattern, path)
    }

    /// Returns the original pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns the parameter names.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Returns `true` if the pattern has no parameters.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.param_names.is_empty()
    }

    /// Returns `true` if the pattern ends in `/` and so matches a subtree.
    #[must_use]
    pub fn is_subtree(&self) -> bool {
        self.pattern.ends_with('/')
    }

    /// Compares this pattern against a request path in priority order.
    ///
    /// Every pattern that matches `path` compares less than or equal to it.
    #[must_use]
    pub fn cmp_path(&self, path: &str) -> Ordering {
        self.pattern
            .bytes()
            .map(pattern_rank)
            .cmp(path.bytes().map(literal_rank))
    }
}

impl Ord for PathPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        priority_cmp(&self.pattern, &other.pattern)
    }
}

impl PartialOrd for PathPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Orders two patterns by matching priority; greater wins.
///
/// Byte-wise lexicographic order, except that the parameter marker sorts
/// before every literal byte. A literal continuation therefore outranks a
/// parameter at the same position and a longer literal prefix outranks a
/// shorter one: `/x/a` > `/x/` > `/x` > `/:id`.
#[must_use]
pub fn priority_cmp(a: &str, b: &str) -> Ordering {
    a.bytes().map(pattern_rank).cmp(b.bytes().map(pattern_rank))
}

/// Matches `path` against the raw pattern string `pattern`.
///
/// Walks both strings with one cursor each. A parameter consumes the path up
/// to the next `/`. When the pattern runs out right after a `/`, the rest of
/// the path is accepted without being captured.
#[must_use]
pub fn match_pattern(pattern: &str, path: &str) -> Option<PathParams> {
    let left = pattern.as_bytes();
    let right = path.as_bytes();
    let (mut p, mut i) = (0, 0);
    let mut params = PathParams::new();

    loop {
        if p == left.len() && i == right.len() {
            return Some(params);
        }
        if p == left.len() && p > 0 && left[p - 1] == b'/' {
            return Some(params);
        }
        if p == left.len() || i == right.len() {
            return None;
        }

        if left[p] == PARAM_MARKER {
            let name_start = p + 1;
            p = segment_end(left, p);
            let value_start = i;
            i = segment_end(right, i);
            params.insert(&pattern[name_start..p], &path[value_start..i]);
        } else if left[p] != right[i] {
            return None;
        } else {
            p += 1;
            i += 1;
        }
    }
}

fn segment_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(bytes.len(), |n| from + n)
}

fn pattern_rank(b: u8) -> u16 {
    if b == PARAM_MARKER {
        0
    } else {
        literal_rank(b)
    }
}

fn literal_rank(b: u8) -> u16 {
    u16::from(b) + 1
}
