//! `Accept-Language` negotiation against the supported locales.
//!
//! Entries are `range[;q=value]`, ordered by quality with ties kept in
//! header order. Malformed entries and `q=0` entries are dropped; a header
//! with nothing usable negotiates to no locale.

use crate::locale::tag::Locale;

/// A single parsed `Accept-Language` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageRange<'a> {
    pub range: &'a str,
    pub quality: f32,
}

/// Parse a header value into acceptable ranges, best first.
pub fn parse_accept_language(header: &str) -> Vec<LanguageRange<'_>> {
    let mut ranges: Vec<LanguageRange<'_>> = header
        .split(',')
        .filter_map(parse_entry)
        .filter(|r| r.quality > 0.0)
        .collect();

    // sort_by is stable, so equal weights keep their header order
    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

/// Pick the first supported locale from the header's preference order.
pub fn negotiate(header: &str) -> Option<Locale> {
    parse_accept_language(header)
        .into_iter()
        .find_map(|r| Locale::from_language_range(r.range))
}

fn parse_entry(entry: &str) -> Option<LanguageRange<'_>> {
    let mut parts = entry.split(';');
    let range = parts.next()?.trim();
    if !is_valid_range(range) {
        return None;
    }

    let mut quality = 1.0;
    for param in parts {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("q") {
            quality = parse_quality(value.trim())?;
        }
    }

    Some(LanguageRange { range, quality })
}

fn is_valid_range(range: &str) -> bool {
    if range == "*" {
        return true;
    }
    !range.is_empty()
        && !range.starts_with('-')
        && !range.ends_with('-')
        && range.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// `qvalue = ( "0" [ "." 0*3DIGIT ] ) / ( "1" [ "." 0*3("0") ] )`
fn parse_quality(value: &str) -> Option<f32> {
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match whole {
        "0" => value.parse().ok(),
        "1" if frac.bytes().all(|b| b == b'0') => Some(1.0),
        _ => None,
    }
}
