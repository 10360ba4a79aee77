//! Keyword and domain matching helpers shared by both validators.

use regex::Regex;

/// Distinct keywords from `list` appearing as substrings of `text`
/// (case-insensitive). Order follows the list, not the text.
pub(crate) fn matched_keywords(text: &str, list: &[String]) -> Vec<String> {
    let lower = text.to_lowercase();
    list.iter()
        .filter(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()))
        .cloned()
        .collect()
}

/// Distinct keywords from `list` appearing in `text` as whole words
/// (unicode word boundaries, case-insensitive). Used for business names,
/// where substring matching is too eager ("AutoMax" must not match "auto").
pub(crate) fn whole_word_matches(text: &str, list: &[String]) -> Vec<String> {
    list.iter()
        .filter(|kw| {
            if kw.is_empty() {
                return false;
            }
            let pattern = format!(r"(?i)\b{}\b", regex::escape(kw));
            Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
        })
        .cloned()
        .collect()
}

/// Extracts the lowercased host from a website URL, dropping any
/// `www.` prefix. Falls back to `None` for empty input.
pub(crate) fn domain_of(url: &str) -> Option<String> {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = without_scheme.split('/').next().unwrap_or("");
    let host = host.split('@').next_back().unwrap_or(host);
    let host = host.split(':').next().unwrap_or(host);
    let host = host.strip_prefix("www.").unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// True when `domain` equals `forbidden` or is a subdomain of it.
pub(crate) fn domain_matches(domain: &str, forbidden: &str) -> bool {
    domain == forbidden || domain.ends_with(&format!(".{forbidden}"))
}
