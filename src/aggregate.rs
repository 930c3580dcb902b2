//! Moving between per-component translation files and a single merged table.

use indexmap::IndexMap;

use crate::types::TranslationTable;

/// Unions the tables of several files into one.
///
/// A key found in more than one file gets the union of its locale maps; on a
/// conflicting locale the later file wins. Duplicates are not reported here, see
/// [`crate::validation::validate_duplicate_keys`].
pub fn merge_multiple_files(files: &IndexMap<String, TranslationTable>) -> TranslationTable {
    let mut merged = TranslationTable::new();
    for table in files.values() {
        for (key, langs) in table {
            let slot = merged.entry(key.clone());
            for (locale, text) in langs {
                slot.insert(locale.clone(), text.clone());
            }
        }
    }
    tracing::debug!(files = files.len(), keys = merged.len(), "merged translation files");
    merged
}

/// Result of splitting a merged table into per-component tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitOutcome {
    /// Component path → its share of the table, in component order.
    pub files: IndexMap<String, TranslationTable>,
    /// Component path → keys it references that the table does not define.
    pub missing: IndexMap<String, Vec<String>>,
}

/// Splits `table` by the keys each component references.
///
/// Components without keys produce no file. A key may be handed to several
/// components.
pub fn split_translations(
    table: &TranslationTable,
    components: &IndexMap<String, Vec<String>>,
) -> SplitOutcome {
    let mut outcome = SplitOutcome::default();

    for (path, keys) in components {
        if keys.is_empty() {
            tracing::warn!(component = %path, "no translation keys found");
            continue;
        }

        let mut part = TranslationTable::new();
        for key in keys {
            match table.get(key) {
                Some(langs) => {
                    part.insert(key.clone(), langs.clone());
                }
                None => {
                    tracing::warn!(component = %path, key = %key, "key not found in source table");
                    outcome.missing.entry(path.clone()).or_default().push(key.clone());
                }
            }
        }
        outcome.files.insert(path.clone(), part);
    }

    outcome
}
