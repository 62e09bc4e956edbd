//! Identifier and text normalization shared by the adapters and the resolver

use std::sync::LazyLock;

use regex::Regex;

/// Abstracts longer than this are cut and suffixed with `…`
pub const ABSTRACT_MAX_CHARS: usize = 1000;

/// Title component cap inside the content key
const KEY_TITLE_MAX: usize = 80;

const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi.org/",
    "dx.doi.org/",
    "doi:",
];

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("invalid tag regex"));

/// Trim, lower-case and strip resolver prefixes. `None` when nothing is left.
///
/// `https://doi.org/10.1000/ABC` and `doi:10.1000/abc` both become `10.1000/abc`.
pub fn normalize_doi(raw: &str) -> Option<String> {
    let mut doi = raw.trim().to_lowercase();
    for prefix in DOI_PREFIXES {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim().to_string();
            break;
        }
    }
    (!doi.is_empty()).then_some(doi)
}

/// Lower-case and keep ASCII alphanumerics only.
pub fn key_component(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Content key `<title>|<year or ?>|<author>` for records without identifiers.
pub fn content_key(title: &str, year: Option<i32>, first_author: &str) -> String {
    let title: String = key_component(title).chars().take(KEY_TITLE_MAX).collect();
    let year = year.map_or_else(|| "?".to_string(), |y| y.to_string());
    format!("{title}|{year}|{}", key_component(first_author))
}

/// `hash:` plus the first 16 hex digits of the key's blake3 digest.
pub fn hash_id(key: &str) -> String {
    let hex = blake3::hash(key.as_bytes()).to_hex();
    format!("hash:{}", &hex[..16])
}

/// Strip markup, trim and cap at [`ABSTRACT_MAX_CHARS`].
pub fn clean_abstract(raw: &str) -> Option<String> {
    let stripped = TAG_RE.replace_all(raw, "");
    let text = stripped.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= ABSTRACT_MAX_CHARS {
        return Some(text.to_string());
    }
    let mut cut: String = text.chars().take(ABSTRACT_MAX_CHARS).collect();
    cut.push('…');
    Some(cut)
}

/// Year from the leading four digits of a date string (`2023 Mar 15`, `2023-03`).
pub fn year_from_date(date: &str) -> Option<i32> {
    let head = date.trim().get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// `"Family I"` display form; family name alone without a given name.
pub fn display_name(family: &str, given: Option<&str>) -> String {
    let family = family.trim();
    match given.and_then(|g| g.trim().chars().next()) {
        Some(initial) => format!("{family} {initial}"),
        None => family.to_string(),
    }
}

/// Trimmed, `None` when blank.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
