//! Extract, export, validate and import steps driven by [`I18nConfig`].
//!
//! These are the I/O-free cores of the build steps: callers read files into
//! tables/strings, call a step, and write whatever comes back. Progress is
//! reported through `tracing`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::merge_multiple_files,
    config::I18nConfig,
    converter::{merge_xliff_files, xliff_documents_by_file_name},
    error::Error,
    merge::{MergeResult, merge_translations, missing_by_locale},
    types::TranslationTable,
    validation::{
        CoverageStats, ValidationError, ValidationErrorKind, ValidationResult, ValidationWarning,
        calculate_coverage, completeness, validate_duplicate_keys, validate_translations,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutcome {
    /// The table to write back, sorted when `sortKeys` is set.
    pub table: TranslationTable,
    pub result: MergeResult,
    /// Untranslated keys per target locale, after merging.
    pub missing_by_locale: IndexMap<String, usize>,
}

impl ExtractOutcome {
    /// Renders the table in the configured `outputFormat`.
    pub fn serialize(&self, config: &I18nConfig) -> Result<String, Error> {
        config.output_format.serialize(&self.table)
    }
}

/// Merges a fresh extraction into the existing table.
pub fn extract(
    new: &TranslationTable,
    existing: &TranslationTable,
    config: &I18nConfig,
) -> ExtractOutcome {
    let outcome = merge_translations(
        new,
        existing,
        &config.target_locales,
        &config.merge_options(),
    );
    let table = if config.sort_keys {
        outcome.merged.sorted()
    } else {
        outcome.merged
    };
    let result = outcome.result;

    tracing::info!(keys = table.len(), "extracted translations");
    if !result.added.is_empty() {
        tracing::info!("Added {} keys", result.added.len());
    }
    if !result.updated.is_empty() {
        tracing::warn!(keys = ?result.updated, "Updated source for {} keys", result.updated.len());
    }
    if !result.removed.is_empty() && !config.clean_unused {
        tracing::warn!(
            "{} unused keys kept (enable cleanUnused to remove them)",
            result.removed.len()
        );
    }

    let missing = missing_by_locale(&table, &config.target_locales);
    for (locale, count) in &missing {
        if *count > 0 {
            tracing::warn!(locale = %locale, "Missing translations: {}", count);
        }
    }

    ExtractOutcome {
        table,
        result,
        missing_by_locale: missing,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// XLIFF file name → document, source locale first.
    pub documents: IndexMap<String, String>,
    /// Target locale → percentage of keys translated.
    pub completeness: IndexMap<String, u32>,
    pub warnings: Vec<ValidationWarning>,
}

/// Validates `table` and renders one XLIFF document per locale.
///
/// Fails with [`Error::Validation`] if the table has validation errors. When
/// `validateInterpolations` is off, placeholder mismatches are not counted.
pub fn export(table: &TranslationTable, config: &I18nConfig) -> Result<ExportOutcome, Error> {
    let mut validation =
        validate_translations(table, &config.target_locales, &config.source_locale);
    if !config.validate_interpolations {
        validation
            .errors
            .retain(|e| e.kind != ValidationErrorKind::InvalidInterpolation);
        validation.valid = validation.errors.is_empty();
    }

    if !validation.valid {
        for error in &validation.errors {
            tracing::error!("{}", error);
        }
        return Err(Error::validation_error(format!(
            "export aborted with {} validation errors",
            validation.errors.len()
        )));
    }
    for warning in &validation.warnings {
        tracing::warn!("{}", warning);
    }

    let documents = xliff_documents_by_file_name(table, config)?;
    let completeness: IndexMap<String, u32> = config
        .target_locales
        .iter()
        .map(|locale| (locale.clone(), completeness(table, locale)))
        .collect();

    for name in documents.keys() {
        tracing::info!(file = %name, "generated XLIFF");
    }
    for (locale, percent) in &completeness {
        if *percent == 100 {
            tracing::info!(locale = %locale, "{}% complete", percent);
        } else {
            tracing::warn!(locale = %locale, "{}% complete", percent);
        }
    }

    Ok(ExportOutcome {
        documents,
        completeness,
        warnings: validation.warnings,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub result: ValidationResult,
    pub duplicates: Vec<ValidationError>,
    pub coverage: CoverageStats,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.result.valid && self.duplicates.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.result.errors.len() + self.duplicates.len()
    }
}

/// Checks a set of translation files together: per-key checks on their union,
/// duplicate keys across files, and coverage.
pub fn validate(
    files: &IndexMap<String, TranslationTable>,
    config: &I18nConfig,
) -> ValidationReport {
    let all = merge_multiple_files(files);
    let result = validate_translations(&all, &config.target_locales, &config.source_locale);
    let duplicates = validate_duplicate_keys(files);
    let coverage = calculate_coverage(&all, &config.target_locales);

    let report = ValidationReport {
        result,
        duplicates,
        coverage,
    };

    if report.is_valid() {
        tracing::info!("All validations passed");
    } else {
        for error in report.duplicates.iter().chain(&report.result.errors) {
            tracing::error!("{}", error);
        }
    }
    for warning in &report.result.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!(
        "Overall coverage: {}% ({}/{})",
        report.coverage.coverage_percentage,
        report.coverage.complete_translations,
        report.coverage.total_translations
    );

    report
}

/// Reads translated XLIFF documents (locale → content) back into a table.
pub fn import(
    documents: &IndexMap<String, String>,
    config: &I18nConfig,
) -> Result<TranslationTable, Error> {
    let table = merge_xliff_files(documents, &config.source_locale)?;
    tracing::info!(documents = documents.len(), keys = table.len(), "imported XLIFF");
    Ok(if config.sort_keys { table.sorted() } else { table })
}
