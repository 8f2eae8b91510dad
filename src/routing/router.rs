//! Request dispatch in front of the locale decision.
//!
//! # Responsibilities
//! - Compile exclusion matchers once from config
//! - Send locale-prefixed paths to the decision unconditionally
//! - Bypass excluded paths, decide everything else
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Prefixed paths win over exclusions, so `/en/logo.svg` is still locale-routed

use crate::config::RoutingConfig;
use crate::locale::{decide, locale_prefix, RequestDescriptor, RoutingDecision};
use crate::routing::matcher::{AnyMatcher, DottedPathMatcher, Matcher, PathPrefixMatcher};

/// What the gateway should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Static asset or internal path; forward without a locale decision.
    Bypass,
    /// Apply this locale decision.
    Decide(RoutingDecision),
}

impl Dispatch {
    pub fn kind(&self) -> &'static str {
        match self {
            Dispatch::Bypass => "bypass",
            Dispatch::Decide(decision) => decision.kind(),
        }
    }
}

/// Compiled exclusions plus the locale decision.
#[derive(Debug)]
pub struct LocaleRouter {
    excluded: AnyMatcher,
}

impl LocaleRouter {
    /// Build a router from its configuration.
    pub fn from_config(config: &RoutingConfig) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = config
            .excluded_prefixes
            .iter()
            .map(|prefix| Box::new(PathPrefixMatcher::new(prefix.clone())) as Box<dyn Matcher>)
            .collect();
        if config.exclude_dotted_paths {
            matchers.push(Box::new(DottedPathMatcher));
        }

        tracing::debug!(exclusions = matchers.len(), "Locale router compiled");
        Self {
            excluded: AnyMatcher::new(matchers),
        }
    }

    /// Route one request.
    pub fn route(&self, path: &str, accept_language: Option<&str>) -> Dispatch {
        if locale_prefix(path).is_none() && self.excluded.matches(path) {
            return Dispatch::Bypass;
        }
        Dispatch::Decide(decide(&RequestDescriptor::new(path, accept_language)))
    }
}

impl Default for LocaleRouter {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}
