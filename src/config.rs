//! Project configuration.
//!
//! `I18nConfig` is read once and passed explicitly to every pipeline step.
//! Every field has a default, so `{}` is a valid configuration file.
//!
//! ```json
//! {
//!   "sourceLocale": "en",
//!   "targetLocales": ["es", "fr"],
//!   "format": "xliff2",
//!   "outputFormat": "json"
//! }
//! ```

use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::{error::Error, formats::XliffVersion, merge::MergeOptions, types::TableFormat};

const COMPONENT_TOKEN: &str = "{component}";
const LOCALE_TOKEN: &str = "{locale}";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nConfig {
    pub source_locale: String,
    pub target_locales: Vec<String>,
    /// XLIFF dialect written on export.
    pub format: XliffVersion,
    /// Format of the translation tables kept in the repository.
    pub output_format: TableFormat,
    pub preserve_existing: bool,
    pub clean_unused: bool,
    pub validate_interpolations: bool,
    pub sort_keys: bool,
    /// Per-component table file name, e.g. `{component}.i18n.json`.
    pub translation_file_naming: String,
    /// XLIFF file name, e.g. `messages.{locale}.xlf`.
    pub xliff_file_naming: String,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            source_locale: "en".to_string(),
            target_locales: Vec::new(),
            format: XliffVersion::V2_0,
            output_format: TableFormat::Json,
            preserve_existing: true,
            clean_unused: false,
            validate_interpolations: true,
            sort_keys: false,
            translation_file_naming: format!("{}.i18n.json", COMPONENT_TOKEN),
            xliff_file_naming: format!("messages.{}.xlf", LOCALE_TOKEN),
        }
    }
}

impl I18nConfig {
    /// Parses a JSON configuration. Missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(content)?)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from: {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks locales and naming patterns. All problems are reported together.
    pub fn validate(&self) -> Result<(), Error> {
        let mut problems = Vec::new();

        if self.source_locale.trim().is_empty() {
            problems.push("sourceLocale must not be empty".to_string());
        } else if !is_valid_locale(&self.source_locale) {
            problems.push(format!("sourceLocale '{}' is not a valid locale", self.source_locale));
        }

        let mut seen = HashSet::new();
        for (i, locale) in self.target_locales.iter().enumerate() {
            if !is_valid_locale(locale) {
                problems.push(format!("targetLocales[{}] '{}' is not a valid locale", i, locale));
            }
            if locale == &self.source_locale {
                problems.push(format!(
                    "targetLocales[{}] repeats the source locale '{}'",
                    i, locale
                ));
            }
            if !seen.insert(locale.as_str()) {
                problems.push(format!("targetLocales[{}] '{}' is listed twice", i, locale));
            }
        }

        if !self.translation_file_naming.contains(COMPONENT_TOKEN) {
            problems.push(format!("translationFileNaming must contain {}", COMPONENT_TOKEN));
        }
        if !self.xliff_file_naming.contains(LOCALE_TOKEN) {
            problems.push(format!("xliffFileNaming must contain {}", LOCALE_TOKEN));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::validation_error(format!(
                "invalid configuration: {}",
                problems.join("; ")
            )))
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            preserve_existing: self.preserve_existing,
            clean_unused: self.clean_unused,
            source_locale: Some(self.source_locale.clone()),
        }
    }

    pub fn xliff_file_name(&self, locale: &str) -> String {
        self.xliff_file_naming.replace(LOCALE_TOKEN, locale)
    }

    pub fn translation_file_name(&self, component: &str) -> String {
        self.translation_file_naming.replace(COMPONENT_TOKEN, component)
    }
}

fn is_valid_locale(locale: &str) -> bool {
    !locale.trim().is_empty() && locale.parse::<LanguageIdentifier>().is_ok()
}
