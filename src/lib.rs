#![forbid(unsafe_code)]
//! Translation table toolkit for Angular-style i18n workflows.
//!
//! Keeps an all-in-one translation table (key → locale → text) in sync with the
//! XLIFF files a build consumes, without losing translator work.
//!
//! # Quick Start
//!
//! ```rust
//! use xliffkit::{I18nConfig, TranslationTable, pipeline};
//!
//! let config = I18nConfig {
//!     target_locales: vec!["es".to_string()],
//!     ..I18nConfig::default()
//! };
//!
//! let mut existing = TranslationTable::new();
//! existing.set("app.title", "en", "My App");
//! existing.set("app.title", "es", "Mi Aplicación");
//!
//! let mut extracted = TranslationTable::new();
//! extracted.set("app.title", "en", "My App");
//! extracted.set("app.footer", "en", "Footer");
//!
//! let outcome = pipeline::extract(&extracted, &existing, &config);
//! assert_eq!(outcome.table.text("app.title", "es"), Some("Mi Aplicación"));
//! assert_eq!(outcome.result.added, vec!["app.footer"]);
//!
//! let export = pipeline::export(&outcome.table, &config)?;
//! assert!(export.documents.contains_key("messages.es.xlf"));
//! # Ok::<(), xliffkit::Error>(())
//! ```
//!
//! # Formats
//!
//! - **Canonical JSON table**: `{ "<key>": { "<locale>": "<text>" } }`
//! - **Flat XML dialect**: `<translations><translation key="..."><en>...</en></translation></translations>`
//! - **XLIFF 1.2 / 2.0**: the interchange files handed to translation tooling

pub mod aggregate;
pub mod config;
pub mod converter;
pub mod error;
pub mod formats;
pub mod merge;
pub mod pipeline;
pub mod placeholder;
pub mod traits;
pub mod types;
pub mod validation;

// Re-export most used types for easy consumption
pub use crate::{
    aggregate::{merge_multiple_files, split_translations},
    config::I18nConfig,
    converter::{json_to_multiple_xliff, json_to_xliff, merge_xliff_files, xliff_to_json},
    error::Error,
    formats::{XliffVersion, build_translation_xml, parse_translation_xml, parse_xliff},
    merge::{MergeOptions, MergeResult, merge_translations},
    placeholder::extract_placeholders,
    traits::Parser,
    types::{LocaleMap, TableFormat, TranslationTable},
    validation::{ValidationResult, calculate_coverage, validate_translations},
};
