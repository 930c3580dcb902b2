//! Interpolation placeholder utilities.
//!
//! A placeholder is a `{{name}}` marker that is substituted at runtime. Every
//! locale of a key must carry the same set of names, so the validator compares
//! the sorted name lists produced by [`extract_placeholders`].

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INTERPOLATION_REGEX: Regex = Regex::new(r"\{\{([^}]+)\}\}").unwrap();
}

/// One `{{...}}` occurrence inside a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolation<'a> {
    /// Byte range of the whole literal, braces included.
    pub range: Range<usize>,
    /// The literal exactly as written, e.g. `{{ user.name }}`.
    pub literal: &'a str,
    /// The expression inside the braces, trimmed.
    pub name: &'a str,
}

/// Finds interpolations in occurrence order.
pub fn find_interpolations(text: &str) -> Vec<Interpolation<'_>> {
    INTERPOLATION_REGEX
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(Interpolation {
                range: whole.range(),
                literal: whole.as_str(),
                name: inner.as_str().trim(),
            })
        })
        .collect()
}

/// Returns placeholder names sorted lexicographically.
///
/// Duplicates are kept: `"{{a}} {{a}}"` yields `["a", "a"]`.
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = find_interpolations(text)
        .into_iter()
        .map(|i| i.name.to_string())
        .collect();
    names.sort();
    names
}

/// Compares two placeholder lists as multisets.
pub fn placeholders_match(left: &[String], right: &[String]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut left = left.to_vec();
    let mut right = right.to_vec();
    left.sort();
    right.sort();
    left == right
}
