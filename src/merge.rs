//! Reconciles a fresh extraction with the translation table on disk.
//!
//! The defaults never destroy translator work: existing non-empty texts win and
//! keys that disappeared from the templates are kept. Overwriting or shrinking
//! the table requires opting in through [`MergeOptions`].

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    types::{LocaleMap, TranslationTable},
    validation::{ValidationWarning, ValidationWarningKind},
};

/// Options controlling merge behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Keep existing non-empty texts instead of the newly extracted ones.
    pub preserve_existing: bool,
    /// Drop keys that are no longer extracted.
    pub clean_unused: bool,
    /// Locale compared to detect changed source text. When `None`, the first
    /// locale of each new entry is compared.
    pub source_locale: Option<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            preserve_existing: true,
            clean_unused: false,
            source_locale: None,
        }
    }
}

/// Keys touched by a merge, grouped by what happened to them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeResult {
    /// Keys that were not in the existing table.
    pub added: Vec<String>,
    /// Keys whose source text differs from the existing table.
    pub updated: Vec<String>,
    /// Keys no longer extracted. Listed whether or not they were dropped.
    pub removed: Vec<String>,
    /// Keys for which at least one existing text was kept.
    pub preserved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: TranslationTable,
    pub result: MergeResult,
}

/// Merges `new` (the current extraction) into `existing`.
///
/// New keys come first in `new`'s order, followed by existing keys that are no
/// longer extracted (unless `clean_unused`).
pub fn merge_translations(
    new: &TranslationTable,
    existing: &TranslationTable,
    target_locales: &[String],
    options: &MergeOptions,
) -> MergeOutcome {
    let mut merged = TranslationTable::new();
    let mut result = MergeResult::default();

    for (key, new_langs) in new {
        let Some(existing_langs) = existing.get(key) else {
            let mut langs = new_langs.clone();
            for locale in target_locales {
                langs.entry(locale.clone()).or_default();
            }
            merged.insert(key.clone(), langs);
            result.added.push(key.clone());
            continue;
        };

        let mut langs = LocaleMap::with_capacity(new_langs.len().max(existing_langs.len()));
        let mut preserved = false;
        for (locale, new_text) in new_langs {
            match existing_langs.get(locale) {
                Some(old) if options.preserve_existing && !old.is_empty() => {
                    langs.insert(locale.clone(), old.clone());
                    preserved = true;
                }
                _ => {
                    langs.insert(locale.clone(), new_text.clone());
                }
            }
        }
        for (locale, old) in existing_langs {
            if !langs.contains_key(locale) {
                langs.insert(locale.clone(), old.clone());
            }
        }

        if preserved {
            result.preserved.push(key.clone());
        }
        if source_changed(new_langs, existing_langs, options.source_locale.as_deref()) {
            result.updated.push(key.clone());
        }
        merged.insert(key.clone(), langs);
    }

    for (key, langs) in existing {
        if new.contains_key(key) {
            continue;
        }
        if !options.clean_unused {
            merged.insert(key.clone(), langs.clone());
        }
        result.removed.push(key.clone());
    }

    tracing::debug!(
        added = result.added.len(),
        updated = result.updated.len(),
        removed = result.removed.len(),
        preserved = result.preserved.len(),
        "merged translations"
    );

    MergeOutcome { merged, result }
}

fn source_changed(
    new_langs: &LocaleMap,
    existing_langs: &LocaleMap,
    source_locale: Option<&str>,
) -> bool {
    let locale = match source_locale {
        Some(locale) => locale,
        None => match new_langs.keys().next() {
            Some(first) => first.as_str(),
            None => return false,
        },
    };
    new_langs.get(locale) != existing_langs.get(locale)
}

/// Keys of `table` that no template references, as `unused_key` warnings.
pub fn find_unused_keys(
    table: &TranslationTable,
    used_keys: &HashSet<String>,
) -> Vec<ValidationWarning> {
    table
        .keys()
        .filter(|key| !used_keys.contains(*key))
        .map(|key| ValidationWarning {
            kind: ValidationWarningKind::UnusedKey,
            key: key.clone(),
            message: format!("Key '{}' not found in any template", key),
            file: None,
        })
        .collect()
}

/// Number of keys with no usable text, per target locale.
///
/// Absent and whitespace-only slots both count as missing.
pub fn missing_by_locale(
    table: &TranslationTable,
    target_locales: &[String],
) -> IndexMap<String, usize> {
    target_locales
        .iter()
        .map(|locale| {
            let missing = table
                .iter()
                .filter(|(_, langs)| langs.get(locale).is_none_or(|t| t.trim().is_empty()))
                .count();
            (locale.clone(), missing)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::locale_map;

    fn targets() -> Vec<String> {
        vec!["es".to_string(), "fr".to_string()]
    }

    #[test]
    fn test_added_keys_get_empty_targets() {
        let mut new = TranslationTable::new();
        new.insert("k", locale_map([("en", "Hi"), ("es", "Hola")]));

        let outcome = merge_translations(
            &new,
            &TranslationTable::new(),
            &targets(),
            &MergeOptions::default(),
        );

        assert_eq!(outcome.result.added, vec!["k"]);
        assert_eq!(outcome.merged.text("k", "es"), Some("Hola"));
        assert_eq!(outcome.merged.text("k", "fr"), Some(""));
    }

    #[test]
    fn test_preserves_existing_translations() {
        let mut existing = TranslationTable::new();
        existing.insert("k", locale_map([("en", "Hi"), ("es", "Hola")]));
        let mut new = TranslationTable::new();
        new.insert("k", locale_map([("en", "Hi"), ("es", "")]));

        let outcome = merge_translations(&new, &existing, &targets(), &MergeOptions::default());

        assert_eq!(outcome.merged.text("k", "es"), Some("Hola"));
        assert_eq!(outcome.result.preserved, vec!["k"]);
        assert!(outcome.result.updated.is_empty());
    }

    #[test]
    fn test_locales_only_in_existing_are_carried_over() {
        let mut existing = TranslationTable::new();
        existing.insert("k", locale_map([("en", "Hi"), ("es", "Hola")]));
        let mut new = TranslationTable::new();
        new.insert("k", locale_map([("en", "Hi")]));

        let outcome = merge_translations(&new, &existing, &targets(), &MergeOptions::default());
        assert_eq!(outcome.merged.text("k", "es"), Some("Hola"));
    }

    #[test]
    fn test_overwrite_when_not_preserving() {
        let mut existing = TranslationTable::new();
        existing.insert("k", locale_map([("en", "Hi"), ("es", "Hola")]));
        let mut new = TranslationTable::new();
        new.insert("k", locale_map([("en", "Hello"), ("es", "Buenas")]));

        let options = MergeOptions {
            preserve_existing: false,
            ..MergeOptions::default()
        };
        let outcome = merge_translations(&new, &existing, &targets(), &options);

        assert_eq!(outcome.merged.text("k", "en"), Some("Hello"));
        assert_eq!(outcome.merged.text("k", "es"), Some("Buenas"));
        assert_eq!(outcome.result.updated, vec!["k"]);
        assert!(outcome.result.preserved.is_empty());
    }

    #[test]
    fn test_updated_uses_first_locale_by_default() {
        let mut existing = TranslationTable::new();
        existing.insert("k", locale_map([("en", "Hi"), ("es", "Hola")]));
        let mut new = TranslationTable::new();
        // es enumerates first, so a changed en text goes unnoticed
        new.insert("k", locale_map([("es", "Hola"), ("en", "Hello")]));

        let outcome = merge_translations(&new, &existing, &targets(), &MergeOptions::default());
        assert!(outcome.result.updated.is_empty());

        let options = MergeOptions {
            source_locale: Some("en".to_string()),
            ..MergeOptions::default()
        };
        let outcome = merge_translations(&new, &existing, &targets(), &options);
        assert_eq!(outcome.result.updated, vec!["k"]);
    }

    #[test]
    fn test_preserved_lists_each_key_once() {
        let mut existing = TranslationTable::new();
        existing.insert("k", locale_map([("en", "Hi"), ("es", "Hola"), ("fr", "Salut")]));
        let new = existing.clone();

        let outcome = merge_translations(&new, &existing, &targets(), &MergeOptions::default());
        assert_eq!(outcome.result.preserved, vec!["k"]);
    }

    #[test]
    fn test_removed_keys_kept_unless_clean_unused() {
        let mut existing = TranslationTable::new();
        existing.insert("k1", locale_map([("en", "One")]));
        existing.insert("k2", locale_map([("en", "Two")]));
        let mut new = TranslationTable::new();
        new.insert("k1", locale_map([("en", "One")]));

        let outcome = merge_translations(&new, &existing, &targets(), &MergeOptions::default());
        assert!(outcome.merged.contains_key("k2"));
        assert_eq!(outcome.result.removed, vec!["k2"]);

        let options = MergeOptions {
            clean_unused: true,
            ..MergeOptions::default()
        };
        let outcome = merge_translations(&new, &existing, &targets(), &options);
        assert!(!outcome.merged.contains_key("k2"));
        assert_eq!(outcome.result.removed, vec!["k2"]);
    }

    #[test]
    fn test_find_unused_keys() {
        let mut table = TranslationTable::new();
        table.insert("used", locale_map([("en", "A")]));
        table.insert("stale", locale_map([("en", "B")]));
        let used: HashSet<String> = ["used".to_string()].into_iter().collect();

        let warnings = find_unused_keys(&table, &used);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].key, "stale");
        assert_eq!(warnings[0].kind, ValidationWarningKind::UnusedKey);
    }

    #[test]
    fn test_missing_by_locale() {
        let mut table = TranslationTable::new();
        table.insert("a", locale_map([("en", "A"), ("es", "A"), ("fr", "  ")]));
        table.insert("b", locale_map([("en", "B")]));

        let missing = missing_by_locale(&table, &targets());
        assert_eq!(missing["es"], 1);
        assert_eq!(missing["fr"], 2);
    }
}
