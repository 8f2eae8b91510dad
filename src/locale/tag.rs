//! Supported locales and path-prefix handling.
//!
//! # Design Decisions
//! - The supported set is a closed enum, not configuration
//! - Path prefixes are segment-aware (`/japan` is not `/ja`)
//! - Prefix matching is case-sensitive, tag parsing is not

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A supported site locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Ja,
    En,
}

/// Locale served at bare paths, without a visible prefix.
pub const PRIMARY_DEFAULT: Locale = Locale::Ja;

/// Locale chosen when no language preference can be matched.
///
/// Fixed to English regardless of [`Locale::ALL`].
pub const SECONDARY_FALLBACK: Locale = Locale::En;

impl Locale {
    /// Every supported locale, in declaration order.
    pub const ALL: [Locale; 2] = [Locale::Ja, Locale::En];

    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::Ja => "ja",
            Locale::En => "en",
        }
    }

    pub fn is_primary(self) -> bool {
        self == PRIMARY_DEFAULT
    }

    /// Match a language range (`ja-JP`, `EN`) by its primary subtag.
    pub fn from_language_range(range: &str) -> Option<Self> {
        let primary = range.split('-').next().unwrap_or(range).trim();
        Self::ALL
            .into_iter()
            .find(|locale| primary.eq_ignore_ascii_case(locale.as_str()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a supported locale tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0:?}")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|locale| s.trim().eq_ignore_ascii_case(locale.as_str()))
            .ok_or_else(|| UnsupportedLocale(s.to_string()))
    }
}

/// Returns the locale whose prefix `path` carries, if any.
///
/// A path carries a prefix when it equals `/<locale>` or starts with
/// `/<locale>/`.
pub fn locale_prefix(path: &str) -> Option<Locale> {
    let rest = path.strip_prefix('/')?;
    let segment = rest.split('/').next().unwrap_or(rest);
    Locale::ALL
        .into_iter()
        .find(|locale| segment == locale.as_str())
}

/// Build the locale-qualified form of `path`.
pub fn localize_path(locale: Locale, path: &str) -> String {
    match path {
        "" | "/" => format!("/{}", locale),
        p if p.starts_with('/') => format!("/{}{}", locale, p),
        p => format!("/{}/{}", locale, p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PRIMARY_DEFAULT, Locale::Ja);
        assert_eq!(SECONDARY_FALLBACK, Locale::En);
        assert!(Locale::Ja.is_primary());
        assert!(!Locale::En.is_primary());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ja".parse::<Locale>(), Ok(Locale::Ja));
        assert_eq!(" EN ".parse::<Locale>(), Ok(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
        assert!("ja-JP".parse::<Locale>().is_err());
    }

    #[test]
    fn test_from_language_range() {
        assert_eq!(Locale::from_language_range("ja-JP"), Some(Locale::Ja));
        assert_eq!(Locale::from_language_range("en-us"), Some(Locale::En));
        assert_eq!(Locale::from_language_range("EN"), Some(Locale::En));
        assert_eq!(Locale::from_language_range("fr-CA"), None);
        assert_eq!(Locale::from_language_range("jav"), None);
        assert_eq!(Locale::from_language_range("*"), None);
    }

    #[test]
    fn test_locale_prefix() {
        assert_eq!(locale_prefix("/ja"), Some(Locale::Ja));
        assert_eq!(locale_prefix("/ja/pricing"), Some(Locale::Ja));
        assert_eq!(locale_prefix("/en/"), Some(Locale::En));
        assert_eq!(locale_prefix("/japan"), None);
        assert_eq!(locale_prefix("/JA/pricing"), None);
        assert_eq!(locale_prefix("/pricing/ja"), None);
        assert_eq!(locale_prefix("/"), None);
        assert_eq!(locale_prefix(""), None);
    }

    #[test]
    fn test_localize_path() {
        assert_eq!(localize_path(Locale::En, "/pricing"), "/en/pricing");
        assert_eq!(localize_path(Locale::Ja, "/"), "/ja");
        assert_eq!(localize_path(Locale::En, ""), "/en");
        assert_eq!(localize_path(Locale::En, "tools/x"), "/en/tools/x");
        assert_eq!(localize_path(Locale::Ja, "/a/b/"), "/ja/a/b/");
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Ja).unwrap(), "\"ja\"");
        let parsed: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Locale::En);
    }
}
