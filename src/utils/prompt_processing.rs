use std::collections::{HashMap, HashSet};
use regex::{Captures, Regex};
use lazy_static::lazy_static;


lazy_static! {
    /// Matches `{name}` where name is an identifier. Braces around anything else (JSON, prose) are not placeholders.
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}").unwrap();
}

#[inline]
pub(crate) fn strip_format(key: &str) -> &str {
    //! Strips "{" and "}" for a string, which is algorithmically unsafe.
    //! Ensure the string is properly formatted like "{a}".
    &key[1..key.len() - 1]
}

/// Replaces every placeholder that has a filling value. Placeholders without a value are left as-is.
///
/// The replacement is a single pass over `original`, so braces inside the filling values are never re-expanded.
pub(crate) fn replace_all_placeholders(original: &str, mapping: &HashMap<String, Option<String>>) -> String {
    let new_string = PLACEHOLDER_MATCH_RE.replace_all(original, |captures: &Captures| {
        let match_text = &captures[0];
        let key = strip_format(match_text);
        match mapping.get(key) {
            Some(Some(value)) => value.clone(),
            _ => match_text.to_string(),
        }
    });
    new_string.into_owned()
}

pub fn get_placeholders(string: &str) -> HashSet<String> {
    PLACEHOLDER_MATCH_RE.captures_iter(string)
        .map(|captures| strip_format(&captures[0]).to_string())
        .collect()
}
