//! Translation table checks.
//!
//! Findings are accumulated across the whole table in one pass; nothing here
//! stops at the first problem. Callers decide whether errors abort their step.

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    placeholder::{extract_placeholders, placeholders_match},
    types::TranslationTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    DuplicateKey,
    MissingLanguage,
    InvalidInterpolation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationWarningKind {
    IncompleteTranslation,
    UnusedKey,
}

impl ValidationErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationErrorKind::DuplicateKey => "duplicate_key",
            ValidationErrorKind::MissingLanguage => "missing_language",
            ValidationErrorKind::InvalidInterpolation => "invalid_interpolation",
        }
    }
}

impl ValidationWarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationWarningKind::IncompleteTranslation => "incomplete_translation",
            ValidationWarningKind::UnusedKey => "unused_key",
        }
    }
}

impl Display for ValidationErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for ValidationWarningKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub key: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub kind: ValidationWarningKind,
    pub key: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.key, self.message)
    }
}

impl Display for ValidationWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.key, self.message)
    }
}

/// Errors and warnings from one validation pass. `valid` is true iff there are
/// no errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
        self.valid = self.errors.is_empty();
    }

    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = ValidationWarning>) {
        self.warnings.extend(warnings);
    }
}

/// Checks every key of `table`.
///
/// - A key without source text (absent or empty) is a `missing_language` error
///   and is not checked further.
/// - An empty or whitespace-only target is an `incomplete_translation` warning.
/// - A target whose placeholder names differ from the source's is an
///   `invalid_interpolation` error.
pub fn validate_translations(
    table: &TranslationTable,
    target_locales: &[String],
    source_locale: &str,
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (key, langs) in table {
        let Some(source_text) = langs.get(source_locale).filter(|s| !s.is_empty()) else {
            errors.push(ValidationError {
                kind: ValidationErrorKind::MissingLanguage,
                key: key.clone(),
                message: format!("Missing source language '{}'", source_locale),
                file: None,
            });
            continue;
        };

        let source_placeholders = extract_placeholders(source_text);

        for locale in target_locales {
            let Some(target_text) = langs.get(locale).filter(|t| !t.trim().is_empty()) else {
                warnings.push(ValidationWarning {
                    kind: ValidationWarningKind::IncompleteTranslation,
                    key: key.clone(),
                    message: format!("Missing translation for locale '{}'", locale),
                    file: None,
                });
                continue;
            };

            let target_placeholders = extract_placeholders(target_text);
            if !placeholders_match(&source_placeholders, &target_placeholders) {
                errors.push(ValidationError {
                    kind: ValidationErrorKind::InvalidInterpolation,
                    key: key.clone(),
                    message: format!(
                        "Interpolation mismatch in '{}': source has [{}], target has [{}]",
                        locale,
                        source_placeholders.join(", "),
                        target_placeholders.join(", ")
                    ),
                    file: None,
                });
            }
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Reports keys defined in more than one file. The error's `file` is the first
/// file the key was seen in; the message lists all of them.
pub fn validate_duplicate_keys(files: &IndexMap<String, TranslationTable>) -> Vec<ValidationError> {
    let mut key_to_files: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for (path, table) in files {
        for key in table.keys() {
            key_to_files.entry(key.as_str()).or_default().push(path.as_str());
        }
    }

    key_to_files
        .into_iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(key, paths)| ValidationError {
            kind: ValidationErrorKind::DuplicateKey,
            key: key.to_string(),
            message: format!("Duplicate key found in: {}", paths.join(", ")),
            file: paths.first().map(|p| p.to_string()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LanguageCoverage {
    pub complete: usize,
    pub missing: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoverageStats {
    pub total_keys: usize,
    /// Keys × target locales.
    pub total_translations: usize,
    pub complete_translations: usize,
    pub missing_translations: usize,
    pub coverage_percentage: u32,
    pub by_language: IndexMap<String, LanguageCoverage>,
}

/// Counts translated slots. A slot is complete when its text is non-empty after
/// trimming. Percentages are rounded to the nearest integer and are 0 when there
/// is nothing to count.
pub fn calculate_coverage(table: &TranslationTable, target_locales: &[String]) -> CoverageStats {
    let total_keys = table.len();
    let total_translations = total_keys * target_locales.len();
    let mut complete_translations = 0;
    let mut by_language = IndexMap::with_capacity(target_locales.len());

    for locale in target_locales {
        let complete = count_complete(table, locale);
        complete_translations += complete;
        by_language.insert(
            locale.clone(),
            LanguageCoverage {
                complete,
                missing: total_keys - complete,
                percentage: percentage(complete, total_keys),
            },
        );
    }

    CoverageStats {
        total_keys,
        total_translations,
        complete_translations,
        missing_translations: total_translations - complete_translations,
        coverage_percentage: percentage(complete_translations, total_translations),
        by_language,
    }
}

/// Percentage of keys translated into `locale`. An empty table is 100% complete.
pub fn completeness(table: &TranslationTable, locale: &str) -> u32 {
    if table.is_empty() {
        return 100;
    }
    percentage(count_complete(table, locale), table.len())
}

fn count_complete(table: &TranslationTable, locale: &str) -> usize {
    table
        .iter()
        .filter(|(_, langs)| langs.get(locale).is_some_and(|t| !t.trim().is_empty()))
        .count()
}

fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}
