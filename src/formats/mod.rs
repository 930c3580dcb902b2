//! All supported document formats for xliffkit.
//!
//! - [`translation_xml`]: the flat, hand-editable `<translations>` dialect.
//! - [`xliff`]: XLIFF 1.2 and 2.0 documents exchanged with translation tooling.
//!
//! The canonical JSON table is handled directly by [`crate::types::TranslationTable`].

pub mod translation_xml;
pub mod xliff;

use quick_xml::events::BytesStart;

// Reexporting the formats for easier access
pub use translation_xml::{
    TranslationXml, build_translation_xml, parse_translation_xml, write_translation_xml,
};
pub use xliff::{
    Content, Run, TranslationEntry, XliffDocument, XliffUnit, XliffVersion, generate_xliff,
    parse_xliff, write_xliff,
};

use crate::error::Error;

/// Looks up an attribute by its qualified name and unescapes its value.
pub(crate) fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, Error> {
    for attr in e.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::DataMismatch(e.to_string()))?;
        if attr.key.as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Element name as an owned string.
pub(crate) fn element_name(e: &BytesStart<'_>) -> Result<String, Error> {
    std::str::from_utf8(e.name().as_ref())
        .map(str::to_string)
        .map_err(|e| Error::DataMismatch(e.to_string()))
}

pub(crate) fn unexpected_eof(element: &str) -> Error {
    Error::InvalidResource(format!(
        "unexpected end of document inside <{}>",
        element
    ))
}
