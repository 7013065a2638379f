//! Ignore patterns for workspace root scanning.
//!
//! A pattern is either an exact canonical name (`example.com/tools`) or a
//! prefix ending in `*` (`example.com/tools*`). Prefix patterns compare text,
//! not path segments, so `example.com/tools*` also matches
//! `example.com/toolshed`. Existing ignore lists rely on that.

/// Marker that turns a pattern into a prefix match.
const WILDCARD: char = '*';

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

/// Decides whether a canonical package name is excluded from root scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreMatcher {
    patterns: Vec<Pattern>,
}

impl IgnoreMatcher {
    /// Build a matcher from patterns. Blank patterns are dropped.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref().trim();
                if p.is_empty() {
                    return None;
                }
                Some(match p.strip_suffix(WILDCARD) {
                    Some(prefix) => Pattern::Prefix(prefix.to_string()),
                    None => Pattern::Exact(p.to_string()),
                })
            })
            .collect();
        Self { patterns }
    }

    /// Parse a comma-separated pattern list, as given on the command line.
    #[must_use]
    pub fn from_comma_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Add the patterns of `other` to this matcher.
    pub fn extend(&mut self, other: IgnoreMatcher) {
        self.patterns.extend(other.patterns);
    }

    /// Whether no patterns are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether `canonical_name` matches any pattern.
    #[must_use]
    pub fn should_ignore(&self, canonical_name: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            Pattern::Exact(name) => name == canonical_name,
            Pattern::Prefix(prefix) => canonical_name.starts_with(prefix.as_str()),
        })
    }
}
