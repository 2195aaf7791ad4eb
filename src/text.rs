use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Collapse runs of whitespace (including `&nbsp;`) into single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    WHITESPACE
        .replace_all(&s.replace('\u{a0}', " "), " ")
        .trim()
        .to_string()
}

/// Like [`normalize_ws`] but maps an empty result to `None`.
pub fn non_empty(s: &str) -> Option<String> {
    let s = normalize_ws(s);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Filename stem for a person's image: spaces → underscores, lower-cased, periods stripped.
///
/// Path separators also become underscores and anything else outside
/// letters, digits, `_` and `-` is dropped, so the stem is always a single
/// path component.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    for ch in lowered.chars() {
        match ch {
            ' ' | '/' | '\\' => out.push('_'),
            '.' => {}
            c if c.is_alphanumeric() || c == '_' || c == '-' => out.push(c),
            _ => {}
        }
    }
    out.trim_matches('_').to_string()
}
