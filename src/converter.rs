//! Conversions between the translation table and XLIFF documents.
//!
//! The table is the source of truth; XLIFF files are generated from it for the
//! build and read back when translators return their work.

use indexmap::IndexMap;

use crate::{
    config::I18nConfig,
    error::Error,
    formats::{XliffUnit, XliffVersion, generate_xliff, parse_xliff},
    types::TranslationTable,
};

/// Turns a table into XLIFF units for one locale pair.
///
/// Keys without source text are skipped, since a unit with an empty source is
/// invalid. A target is attached only when `target_locale` is given and the
/// key has non-empty text for it.
pub fn json_to_xliff_units(
    table: &TranslationTable,
    source_locale: &str,
    target_locale: Option<&str>,
) -> Vec<XliffUnit> {
    table
        .iter()
        .filter_map(|(key, langs)| {
            let source = langs.get(source_locale).filter(|s| !s.is_empty())?;
            let target = target_locale
                .and_then(|locale| langs.get(locale))
                .filter(|t| !t.is_empty())
                .cloned();
            Some(XliffUnit {
                id: key.clone(),
                source: source.clone(),
                target,
                ..XliffUnit::default()
            })
        })
        .collect()
}

/// Generates a complete XLIFF document for one locale pair.
///
/// # Example
///
/// ```rust
/// use xliffkit::{converter::json_to_xliff, formats::XliffVersion, types::TranslationTable};
///
/// let mut table = TranslationTable::new();
/// table.set("app.title", "en", "My App");
/// table.set("app.title", "es", "Mi Aplicación");
///
/// let xliff = json_to_xliff(&table, "en", Some("es"), XliffVersion::V2_0)?;
/// assert!(xliff.contains("<target>Mi Aplicación</target>"));
/// # Ok::<(), xliffkit::Error>(())
/// ```
pub fn json_to_xliff(
    table: &TranslationTable,
    source_locale: &str,
    target_locale: Option<&str>,
    version: XliffVersion,
) -> Result<String, Error> {
    let units = json_to_xliff_units(table, source_locale, target_locale);
    generate_xliff(&units, source_locale, target_locale, version)
}

/// Generates the source document (no targets) and one document per target
/// locale, keyed by locale. The source locale comes first.
pub fn json_to_multiple_xliff(
    table: &TranslationTable,
    source_locale: &str,
    target_locales: &[String],
    version: XliffVersion,
) -> Result<IndexMap<String, String>, Error> {
    let mut documents = IndexMap::with_capacity(target_locales.len() + 1);
    documents.insert(
        source_locale.to_string(),
        json_to_xliff(table, source_locale, None, version)?,
    );
    for locale in target_locales {
        documents.insert(
            locale.clone(),
            json_to_xliff(table, source_locale, Some(locale), version)?,
        );
    }
    Ok(documents)
}

/// Same as [`json_to_multiple_xliff`], keyed by the configured XLIFF file name
/// (`messages.<locale>.xlf` by default).
pub fn xliff_documents_by_file_name(
    table: &TranslationTable,
    config: &I18nConfig,
) -> Result<IndexMap<String, String>, Error> {
    let documents = json_to_multiple_xliff(
        table,
        &config.source_locale,
        &config.target_locales,
        config.format,
    )?;
    Ok(documents
        .into_iter()
        .map(|(locale, content)| (config.xliff_file_name(&locale), content))
        .collect())
}

/// Reads an XLIFF document back into a table.
///
/// Every requested target locale gets a slot, set to the document's target text
/// or `""`, so later completeness checks see every locale. Units with an empty
/// id are dropped.
pub fn xliff_to_json(
    content: &str,
    source_locale: &str,
    target_locales: &[String],
) -> Result<TranslationTable, Error> {
    let mut table = TranslationTable::new();
    for entry in parse_xliff(content)? {
        if entry.id.is_empty() {
            continue;
        }
        let langs = table.entry(entry.id);
        langs.insert(source_locale.to_string(), entry.source);
        let target = entry.target.unwrap_or_default();
        for locale in target_locales {
            langs.insert(locale.clone(), target.clone());
        }
    }
    Ok(table)
}

/// Combines per-locale XLIFF documents into one table.
///
/// The document for `source_locale` supplies source text; every other document
/// supplies its target text for its own locale. Keys accumulate across
/// documents; a later document never clears slots set by an earlier one.
pub fn merge_xliff_files(
    documents: &IndexMap<String, String>,
    source_locale: &str,
) -> Result<TranslationTable, Error> {
    let mut table = TranslationTable::new();
    for (locale, content) in documents {
        let is_source = locale == source_locale;
        for entry in parse_xliff(content)? {
            if entry.id.is_empty() {
                continue;
            }
            let text = if is_source {
                entry.source
            } else {
                entry.target.unwrap_or_default()
            };
            table.set(entry.id, locale.clone(), text);
        }
    }
    tracing::debug!(
        documents = documents.len(),
        keys = table.len(),
        "merged XLIFF documents"
    );
    Ok(table)
}
