//! Text heuristics applied to individual fields of a result.

use crate::results::Author;
use once_cell::sync::Lazy;
use regex::Regex;

/// Author fragments this long or longer are prose, not names
const MAX_AUTHOR_NAME_CHARS: usize = 50;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u:\b)(?:19|20)[0-9]{2}(?-u:\b)").unwrap());

static LABELED_CITATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:Cited by|Citado por|Citations?:?)\s*([0-9]+)").unwrap());

static BARE_CITATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([0-9]+)\s*(?:citations?|citas?)?$").unwrap());

/// First four-digit year between 1900 and 2099, or an empty string
pub fn parse_year(text: &str) -> String {
    YEAR.find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Citation count in a single element's text.
///
/// A labelled count ("Cited by 42", "Citado por 7", "Citations: 3") is tried
/// before a bare number ("15", "15 citations").
pub fn parse_citation_count(text: &str) -> Option<String> {
    let text = text.trim();
    if let Some(caps) = LABELED_CITATIONS.captures(text) {
        return Some(caps[1].to_string());
    }
    BARE_CITATIONS
        .captures(text)
        .map(|caps| caps[1].to_string())
}

/// Scans citation candidates in order; the first that parses wins.
/// Defaults to "0".
pub fn first_citation_count<I, S>(candidates: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .find_map(|text| parse_citation_count(text.as_ref()))
        .unwrap_or_else(|| "0".to_string())
}

/// Splits a free-text author line into authors without links.
///
/// Everything after the first `" - "` is venue/date and is dropped. The rest
/// is split on commas and semicolons; fragments of 50+ characters are
/// discarded, trailing ellipses stripped, and single characters ignored.
/// Names that themselves contain commas are split apart.
pub fn split_author_line(text: &str) -> Vec<Author> {
    let text = text.trim();
    let author_part = match text.split(" - ").next() {
        Some(part) if !part.is_empty() => part,
        _ => text,
    };

    author_part
        .split([',', ';'])
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty() && fragment.chars().count() < MAX_AUTHOR_NAME_CHARS)
        .map(strip_ellipsis)
        .filter(|name| name.chars().count() > 1)
        .map(|name| Author::new(name, ""))
        .collect()
}

fn strip_ellipsis(fragment: &str) -> &str {
    let fragment = fragment.strip_suffix('…').unwrap_or(fragment);
    let fragment = fragment.strip_suffix("...").unwrap_or(fragment);
    fragment.trim()
}
