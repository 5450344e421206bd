//! Wildcard path patterns
//!
//! Glob syntax relative to a storage root: `*` and `?` stay within one path
//! segment, `**` matches any number of segments. A pattern without wildcards
//! names a single file.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled path pattern relative to a storage root
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// Pattern as written, without leading or doubled slashes
    raw: String,
    /// Wildcard-free directory segments, used as the listing prefix
    literal_prefix: String,
    matcher: Pattern,
}

impl PathPattern {
    /// Compile a pattern such as `log_data/*/*/*.json`
    pub fn parse(pattern: &str) -> Result<Self> {
        let segments: Vec<&str> = pattern
            .trim()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let Some((_, dirs)) = segments.split_last() else {
            return Err(Error::invalid_value("pattern", "pattern is empty"));
        };

        let literal_prefix = dirs
            .iter()
            .take_while(|s| !has_wildcard(s))
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        let raw = segments.join("/");
        let matcher = Pattern::new(&raw)
            .map_err(|e| Error::invalid_value("pattern", format!("'{pattern}': {e}")))?;

        Ok(Self {
            raw,
            literal_prefix,
            matcher,
        })
    }

    /// Pattern as written (without a leading slash)
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Directory prefix that contains every match
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// Check a relative object path against the pattern
    pub fn matches(&self, path: &str) -> bool {
        self.matcher
            .matches_with(path.trim_start_matches('/'), MATCH_OPTIONS)
    }
}

fn has_wildcard(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}
