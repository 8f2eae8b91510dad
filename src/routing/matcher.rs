//! Exclusion matching.
//!
//! # Responsibilities
//! - Match raw path prefixes (framework internals, API routes)
//! - Match paths that look like files (contain a `.`)
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes are raw string prefixes, not segments (`/api` also hides `/apis`)
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches any path containing a dot, e.g. `/favicon.ico`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DottedPathMatcher;

impl Matcher for DottedPathMatcher {
    fn matches(&self, path: &str) -> bool {
        path.contains('.')
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}
