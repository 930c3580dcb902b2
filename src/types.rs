//! Core, format-agnostic types for xliffkit.
//! Parsers decode into these; encoders serialize these.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    io::{BufRead, Write},
    path::Path,
    str::FromStr,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    formats::{TranslationXml, build_translation_xml},
    traits::Parser,
};

/// Locale code → translated text. An empty string means "not yet translated".
pub type LocaleMap = IndexMap<String, String>;

/// The all-in-one translation table: key → locale → text.
///
/// Iteration follows insertion order, which is what every writer emits. Use
/// [`TranslationTable::sorted`] when deterministic output is needed. Equality
/// ignores ordering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TranslationTable {
    entries: IndexMap<String, LocaleMap>,
}

impl TranslationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&LocaleMap> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut LocaleMap> {
        self.entries.get_mut(key)
    }

    /// Text for one key/locale slot, if the slot exists.
    pub fn text(&self, key: &str, locale: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|langs| langs.get(locale))
            .map(String::as_str)
    }

    /// Replaces the whole locale map of `key`, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, langs: LocaleMap) -> Option<LocaleMap> {
        self.entries.insert(key.into(), langs)
    }

    /// Sets a single slot, creating the key if needed.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        locale: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.entry(key).insert(locale.into(), text.into());
    }

    /// Locale map of `key`, inserted empty if absent.
    pub fn entry(&mut self, key: impl Into<String>) -> &mut LocaleMap {
        self.entries.entry(key.into()).or_default()
    }

    /// Removes `key`, keeping the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<LocaleMap> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, LocaleMap> {
        self.entries.iter()
    }

    /// Returns a copy with keys in lexicographic order. Locale order inside each
    /// entry is left untouched.
    pub fn sorted(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.sort_keys();
        Self { entries }
    }

    /// Builds a fresh table for `keys`: the source slot gets the supplied text
    /// (or ""), every target slot starts empty.
    pub fn initialize<'a>(
        keys: impl IntoIterator<Item = &'a str>,
        source_locale: &str,
        source_texts: &HashMap<String, String>,
        target_locales: &[String],
    ) -> Self {
        let mut table = Self::new();
        for key in keys {
            let langs = table.entry(key);
            langs.insert(
                source_locale.to_string(),
                source_texts.get(key).cloned().unwrap_or_default(),
            );
            for locale in target_locales {
                langs.insert(locale.clone(), String::new());
            }
        }
        table
    }
}

impl<'a> IntoIterator for &'a TranslationTable {
    type Item = (&'a String, &'a LocaleMap);
    type IntoIter = indexmap::map::Iter<'a, String, LocaleMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for TranslationTable {
    type Item = (String, LocaleMap);
    type IntoIter = indexmap::map::IntoIter<String, LocaleMap>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, LocaleMap)> for TranslationTable {
    fn from_iter<T: IntoIterator<Item = (String, LocaleMap)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// The canonical JSON file: `{ "<key>": { "<locale>": "<text>" } }`.
impl Parser for TranslationTable {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(Error::Parse)
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        serde_json::to_writer_pretty(&mut writer, self).map_err(Error::Parse)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// On-disk representation of a [`TranslationTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Canonical JSON table.
    #[default]
    Json,
    /// The flat `<translations>` XML dialect.
    Xml,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Json => "json",
            TableFormat::Xml => "xml",
        }
    }

    /// Infers the format from a file extension (case-insensitive).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(TableFormat::Json),
            Some("xml") => Ok(TableFormat::Xml),
            other => Err(Error::UnsupportedFormat(format!(
                "translation file extension {:?}",
                other.unwrap_or_default()
            ))),
        }
    }

    /// Parses file content in this format.
    pub fn load(&self, content: &str) -> Result<TranslationTable, Error> {
        match self {
            TableFormat::Json => TranslationTable::from_str(content),
            TableFormat::Xml => TranslationXml::from_str(content).map(TranslationTable::from),
        }
    }

    /// Serializes a table in this format.
    pub fn serialize(&self, table: &TranslationTable) -> Result<String, Error> {
        match self {
            TableFormat::Json => Parser::to_string(table),
            TableFormat::Xml => build_translation_xml(table),
        }
    }
}

impl Display for TableFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(TableFormat::Json),
            "xml" => Ok(TableFormat::Xml),
            other => Err(Error::UnsupportedFormat(format!(
                "translation table format `{}`",
                other
            ))),
        }
    }
}

/// Builds a [`LocaleMap`] from `(locale, text)` pairs, keeping their order.
pub fn locale_map<I, L, T>(pairs: I) -> LocaleMap
where
    I: IntoIterator<Item = (L, T)>,
    L: Into<String>,
    T: Into<String>,
{
    pairs
        .into_iter()
        .map(|(locale, text)| (locale.into(), text.into()))
        .collect()
}
