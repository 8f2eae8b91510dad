//! The locale routing decision.
//!
//! # Rules
//! ```text
//! path carries /<locale>         → PassThrough
//! resolve locale (ordered):
//!     Accept-Language match
//!     secondary fallback (en)
//! resolved == primary (ja)       → RewriteTo(ja, path)
//! otherwise                      → RedirectTo(locale, path)
//! ```
//!
//! Every input resolves to a decision; there is no error path.

use serde::Serialize;

use crate::locale::negotiate::negotiate;
use crate::locale::tag::{locale_prefix, localize_path, Locale, SECONDARY_FALLBACK};

/// What the router looks at for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDescriptor<'a> {
    pub path: &'a str,
    pub accept_language: Option<&'a str>,
}

impl<'a> RequestDescriptor<'a> {
    pub fn new(path: &'a str, accept_language: Option<&'a str>) -> Self {
        Self { path, accept_language }
    }
}

/// Outcome of routing a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Request is already locale-qualified.
    PassThrough,
    /// Serve `path` as if it were prefixed with `locale`; the client URL is unchanged.
    RewriteTo { locale: Locale, path: String },
    /// Send the client to the `locale`-prefixed form of `path`.
    RedirectTo { locale: Locale, path: String },
}

impl RoutingDecision {
    /// Locale-qualified path for rewrites and redirects.
    pub fn target_path(&self) -> Option<String> {
        match self {
            RoutingDecision::PassThrough => None,
            RoutingDecision::RewriteTo { locale, path }
            | RoutingDecision::RedirectTo { locale, path } => Some(localize_path(*locale, path)),
        }
    }

    pub fn locale(&self) -> Option<Locale> {
        match self {
            RoutingDecision::PassThrough => None,
            RoutingDecision::RewriteTo { locale, .. }
            | RoutingDecision::RedirectTo { locale, .. } => Some(*locale),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::PassThrough => "pass",
            RoutingDecision::RewriteTo { .. } => "rewrite",
            RoutingDecision::RedirectTo { .. } => "redirect",
        }
    }
}

/// One step of the locale resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocaleSource {
    AcceptLanguage,
    SecondaryFallback,
}

impl LocaleSource {
    /// Resolution order; the first rule that yields a locale wins.
    pub const CHAIN: [LocaleSource; 2] = [LocaleSource::AcceptLanguage, LocaleSource::SecondaryFallback];

    pub fn resolve(self, request: &RequestDescriptor<'_>) -> Option<Locale> {
        match self {
            LocaleSource::AcceptLanguage => request.accept_language.and_then(negotiate),
            LocaleSource::SecondaryFallback => Some(SECONDARY_FALLBACK),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LocaleSource::AcceptLanguage => "accept_language",
            LocaleSource::SecondaryFallback => "secondary_fallback",
        }
    }
}

/// Run the resolution chain for an unprefixed request.
pub fn resolve(request: &RequestDescriptor<'_>) -> (Locale, LocaleSource) {
    LocaleSource::CHAIN
        .into_iter()
        .find_map(|source| source.resolve(request).map(|locale| (locale, source)))
        .unwrap_or((SECONDARY_FALLBACK, LocaleSource::SecondaryFallback))
}

/// Map a request to its routing decision.
pub fn decide(request: &RequestDescriptor<'_>) -> RoutingDecision {
    if locale_prefix(request.path).is_some() {
        return RoutingDecision::PassThrough;
    }

    let (locale, _) = resolve(request);
    let path = request.path.to_string();
    if locale.is_primary() {
        RoutingDecision::RewriteTo { locale, path }
    } else {
        RoutingDecision::RedirectTo { locale, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::tag::PRIMARY_DEFAULT;

    fn decide_for(path: &str, header: Option<&str>) -> RoutingDecision {
        decide(&RequestDescriptor::new(path, header))
    }

    #[test]
    fn test_prefixed_paths_pass_through() {
        for path in ["/ja", "/en", "/ja/pricing", "/en/tools/favicon-generator"] {
            assert_eq!(decide_for(path, None), RoutingDecision::PassThrough);
            assert_eq!(decide_for(path, Some("ja")), RoutingDecision::PassThrough);
            assert_eq!(decide_for(path, Some("en")), RoutingDecision::PassThrough);
        }
    }

    #[test]
    fn test_missing_header_redirects_to_fallback() {
        let decision = decide_for("/pricing", None);
        assert_eq!(
            decision,
            RoutingDecision::RedirectTo { locale: Locale::En, path: "/pricing".into() }
        );
        assert_eq!(decision.target_path().as_deref(), Some("/en/pricing"));
    }

    #[test]
    fn test_root_is_an_ordinary_path() {
        assert_eq!(
            decide_for("/", None),
            RoutingDecision::RedirectTo { locale: Locale::En, path: "/".into() }
        );
        assert_eq!(decide_for("/", None).target_path().as_deref(), Some("/en"));
        assert_eq!(decide_for("/", Some("ja")).target_path().as_deref(), Some("/ja"));
    }

    #[test]
    fn test_primary_preference_rewrites() {
        let decision = decide_for("/pricing", Some("ja"));
        assert_eq!(
            decision,
            RoutingDecision::RewriteTo { locale: Locale::Ja, path: "/pricing".into() }
        );
        assert_eq!(decision.kind(), "rewrite");
    }

    #[test]
    fn test_secondary_preference_redirects() {
        let decision = decide_for("/pricing", Some("en-US,en;q=0.9,ja;q=0.5"));
        assert_eq!(
            decision,
            RoutingDecision::RedirectTo { locale: Locale::En, path: "/pricing".into() }
        );
    }

    #[test]
    fn test_malformed_header_falls_back() {
        for header in ["", ";;;", "ja;q=oops", "fr-FR, de", "*"] {
            assert_eq!(
                decide_for("/pricing", Some(header)),
                RoutingDecision::RedirectTo { locale: Locale::En, path: "/pricing".into() },
                "header {:?}",
                header
            );
        }
    }

    #[test]
    fn test_rewrite_target_is_idempotent() {
        for path in ["/", "/pricing", "/tools/svg-optimizer"] {
            let target = decide_for(path, Some("ja-JP")).target_path().unwrap();
            assert_eq!(decide_for(&target, Some("ja-JP")), RoutingDecision::PassThrough);
            assert_eq!(decide_for(&target, None), RoutingDecision::PassThrough);
        }
    }

    #[test]
    fn test_resolution_chain_reports_source() {
        let with_header = RequestDescriptor::new("/x", Some("ja"));
        assert_eq!(resolve(&with_header), (Locale::Ja, LocaleSource::AcceptLanguage));

        let without = RequestDescriptor::new("/x", None);
        assert_eq!(resolve(&without), (Locale::En, LocaleSource::SecondaryFallback));

        let unmatched = RequestDescriptor::new("/x", Some("ko"));
        assert_eq!(resolve(&unmatched).1, LocaleSource::SecondaryFallback);
    }

    #[test]
    fn test_fallback_differs_from_primary() {
        // a bare unprefixed request must become visible under the fallback prefix
        assert_ne!(SECONDARY_FALLBACK, PRIMARY_DEFAULT);
        assert_eq!(decide_for("/about", None).kind(), "redirect");
    }

    #[test]
    fn test_pass_through_has_no_target() {
        let decision = RoutingDecision::PassThrough;
        assert_eq!(decision.target_path(), None);
        assert_eq!(decision.locale(), None);
        assert_eq!(decision.kind(), "pass");
    }

    #[test]
    fn test_serializes_tagged() {
        let decision = decide_for("/pricing", None);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"decision": "redirect_to", "locale": "en", "path": "/pricing"})
        );
    }
}
