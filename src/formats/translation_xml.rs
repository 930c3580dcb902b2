//! Support for the flat all-in-one XML dialect.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <translations>
//!   <translation key="app.title">
//!     <en>My App</en>
//!     <es/>
//!   </translation>
//! </translations>
//! ```
//!
//! Every child of `<translation>` is a locale; its tag name is the locale code and
//! is not checked against any list. Translators edit this file by hand, so the
//! writer indents it. Locale text is kept byte for byte, surrounding whitespace
//! included.

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use std::io::{BufRead, Write};

use crate::{
    error::Error,
    formats::{attribute, element_name, unexpected_eof},
    traits::Parser,
    types::{LocaleMap, TranslationTable},
};

const ROOT_TAG: &str = "translations";
const TRANSLATION_TAG: &str = "translation";

/// A translation table read from / written to the XML dialect.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationXml {
    pub table: TranslationTable,
}

impl Parser for TranslationXml {
    /// Parse from any reader.
    ///
    /// `<translation>` elements without a `key` attribute are skipped. A document
    /// whose root is not `<translations>` yields an empty table.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut table = TranslationTable::new();
        let mut in_root = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) if e.name().as_ref() == ROOT_TAG.as_bytes() => {
                    in_root = true;
                }
                Ok(Event::End(ref e)) if e.name().as_ref() == ROOT_TAG.as_bytes() => {
                    in_root = false;
                }
                Ok(Event::Start(ref e))
                    if in_root && e.name().as_ref() == TRANSLATION_TAG.as_bytes() =>
                {
                    let key = attribute(e, b"key")?;
                    let langs = parse_locales(&mut xml_reader)?;
                    if let Some(key) = key.filter(|k| !k.is_empty()) {
                        table.insert(key, langs);
                    }
                }
                Ok(Event::Empty(ref e))
                    if in_root && e.name().as_ref() == TRANSLATION_TAG.as_bytes() =>
                {
                    if let Some(key) = attribute(e, b"key")?.filter(|k| !k.is_empty()) {
                        table.insert(key, LocaleMap::new());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::XmlParse(e)),
            }
            buf.clear();
        }

        tracing::debug!(keys = table.len(), "parsed translation XML");
        Ok(TranslationXml { table })
    }

    /// Write to any writer (file, memory, etc.).
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        write_translation_xml(&self.table, writer)
    }
}

impl From<TranslationTable> for TranslationXml {
    fn from(table: TranslationTable) -> Self {
        Self { table }
    }
}

impl From<TranslationXml> for TranslationTable {
    fn from(value: TranslationXml) -> Self {
        value.table
    }
}

/// Parses the XML dialect into a table.
pub fn parse_translation_xml(content: &str) -> Result<TranslationTable, Error> {
    TranslationXml::from_str(content).map(TranslationTable::from)
}

/// Serializes a table into the XML dialect, in the table's iteration order.
pub fn build_translation_xml(table: &TranslationTable) -> Result<String, Error> {
    let mut out = Vec::new();
    write_translation_xml(table, &mut out)?;
    String::from_utf8(out).map_err(|e| Error::DataMismatch(e.to_string()))
}

/// Writes a table in the XML dialect. Empty locale slots become self-closing
/// elements.
///
/// Fails with [`Error::DataMismatch`] if a locale code cannot be used as an
/// element name.
pub fn write_translation_xml<W: Write>(
    table: &TranslationTable,
    mut writer: W,
) -> Result<(), Error> {
    let mut xml_writer = Writer::new_with_indent(&mut writer, b' ', 2);

    xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    xml_writer.write_event(Event::Start(BytesStart::new(ROOT_TAG)))?;

    for (key, langs) in table {
        let mut elem = BytesStart::new(TRANSLATION_TAG);
        elem.push_attribute(("key", key.as_str()));

        if langs.is_empty() {
            xml_writer.write_event(Event::Empty(elem))?;
            continue;
        }

        xml_writer.write_event(Event::Start(elem))?;
        for (locale, text) in langs {
            if !is_element_name(locale) {
                return Err(Error::DataMismatch(format!(
                    "locale `{}` of key `{}` is not a valid XML element name",
                    locale, key
                )));
            }
            if text.is_empty() {
                xml_writer.write_event(Event::Empty(BytesStart::new(locale.as_str())))?;
            } else {
                xml_writer.write_event(Event::Start(BytesStart::new(locale.as_str())))?;
                xml_writer.write_event(Event::Text(BytesText::new(text)))?;
                xml_writer.write_event(Event::End(BytesEnd::new(locale.as_str())))?;
            }
        }
        xml_writer.write_event(Event::End(BytesEnd::new(TRANSLATION_TAG)))?;
    }

    xml_writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;
    xml_writer.get_mut().write_all(b"\n")?;
    Ok(())
}

/// Letters, digits, `_`, `-` and `.`, not starting with a digit, `-` or `.`.
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Reads the locale children of one `<translation>` up to its end tag.
fn parse_locales<R: BufRead>(xml_reader: &mut Reader<R>) -> Result<LocaleMap, Error> {
    let mut buf = Vec::new();
    let mut langs = LocaleMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let locale = element_name(e)?;
                let text = read_text(xml_reader, &locale)?;
                langs.insert(locale, text);
            }
            Ok(Event::Empty(ref e)) => {
                langs.insert(element_name(e)?, String::new());
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => return Err(unexpected_eof(TRANSLATION_TAG)),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    Ok(langs)
}

/// Collects the text of the current element, including any nested elements,
/// exactly as written.
fn read_text<R: BufRead>(xml_reader: &mut Reader<R>, element: &str) -> Result<String, Error> {
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => text.push_str(&e.unescape()?),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) if depth == 0 => break,
            Ok(Event::End(_)) => depth -= 1,
            Ok(Event::Eof) => return Err(unexpected_eof(element)),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::locale_map;

    #[test]
    fn test_parse_basic_document() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <translations>
            <translation key="app.title">
                <en>My App</en>
                <es>Mi Aplicación</es>
            </translation>
            <translation key="app.footer">
                <en>Footer</en>
                <es/>
                <fr></fr>
            </translation>
        </translations>
        "#;
        let table = parse_translation_xml(xml).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.text("app.title", "es"), Some("Mi Aplicación"));
        assert_eq!(table.text("app.footer", "es"), Some(""));
        assert_eq!(table.text("app.footer", "fr"), Some(""));
    }

    #[test]
    fn test_translation_without_key_is_skipped() {
        let xml = r#"
        <translations>
            <translation><en>Orphan</en></translation>
            <translation key="kept"><en>Kept</en></translation>
        </translations>
        "#;
        let table = parse_translation_xml(xml).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains_key("kept"));
    }

    #[test]
    fn test_any_element_is_a_locale() {
        let xml = r#"<translations><translation key="k"><zh-Hans>你好</zh-Hans><klingon>nuqneH</klingon></translation></translations>"#;
        let table = parse_translation_xml(xml).unwrap();
        assert_eq!(table.text("k", "zh-Hans"), Some("你好"));
        assert_eq!(table.text("k", "klingon"), Some("nuqneH"));
    }

    #[test]
    fn test_single_translation_and_empty_root() {
        let single = r#"<translations><translation key="only"><en>One</en></translation></translations>"#;
        assert_eq!(parse_translation_xml(single).unwrap().len(), 1);

        assert!(parse_translation_xml("<translations/>").unwrap().is_empty());
        assert!(parse_translation_xml("<other><translation key=\"x\"/></other>").unwrap().is_empty());
    }

    #[test]
    fn test_unescapes_entities() {
        let xml = r#"<translations><translation key="a&amp;b"><en>Tom &amp; Jerry &lt;3</en></translation></translations>"#;
        let table = parse_translation_xml(xml).unwrap();
        assert_eq!(table.text("a&b", "en"), Some("Tom & Jerry <3"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let xml = "<translations><translation key=\"k\"><en>Hi</es></translation></translations>";
        assert!(matches!(parse_translation_xml(xml), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_unterminated_translation_is_an_error() {
        let xml = "<translations><translation key=\"k\"><en>Hi</en>";
        assert!(parse_translation_xml(xml).is_err());
    }

    #[test]
    fn test_build_exact_layout() {
        let mut table = TranslationTable::new();
        table.insert("app.title", locale_map([("en", "My App"), ("es", "")]));
        let xml = build_translation_xml(&table).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <translations>\n  \
             <translation key=\"app.title\">\n    \
             <en>My App</en>\n    \
             <es/>\n  \
             </translation>\n\
             </translations>\n"
        );
    }

    #[test]
    fn test_build_escapes_text_and_keys() {
        let mut table = TranslationTable::new();
        table.insert("say \"hi\"", locale_map([("en", "Fish & <Chips>")]));
        let xml = build_translation_xml(&table).unwrap();
        assert!(xml.contains("key=\"say &quot;hi&quot;\""));
        assert!(xml.contains("<en>Fish &amp; &lt;Chips&gt;</en>"));

        let parsed = parse_translation_xml(&xml).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_build_keeps_table_order() {
        let mut table = TranslationTable::new();
        table.insert("z", locale_map([("fr", "Z"), ("en", "Z")]));
        table.insert("a", locale_map([("en", "A")]));
        let xml = build_translation_xml(&table).unwrap();
        assert!(xml.find("key=\"z\"").unwrap() < xml.find("key=\"a\"").unwrap());
        assert!(xml.find("<fr>").unwrap() < xml.find("<en>Z").unwrap());
    }

    #[test]
    fn test_surrounding_whitespace_is_kept() {
        let mut table = TranslationTable::new();
        table.insert("cart.total", locale_map([("en", "Total: "), ("es", "  Total:")]));
        let xml = build_translation_xml(&table).unwrap();
        assert!(xml.contains("<en>Total: </en>"));
        assert!(xml.contains("<es>  Total:</es>"));

        let parsed = parse_translation_xml(&xml).unwrap();
        assert_eq!(parsed.text("cart.total", "en"), Some("Total: "));
        assert_eq!(parsed.text("cart.total", "es"), Some("  Total:"));
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_whitespace_between_elements_is_ignored() {
        let xml = "<translations>\n  <translation key=\"k\">\n    <en>Hi</en>\n    <es/>\n  </translation>\n</translations>\n";
        let table = parse_translation_xml(xml).unwrap();
        assert_eq!(table.get("k"), Some(&locale_map([("en", "Hi"), ("es", "")])));
    }

    #[test]
    fn test_invalid_locale_name_is_rejected() {
        for locale in ["", "1en", "en us", "-x", "a<b"] {
            let mut table = TranslationTable::new();
            table.insert("k", locale_map([(locale, "x")]));
            assert!(
                matches!(build_translation_xml(&table), Err(Error::DataMismatch(_))),
                "{:?}",
                locale
            );
        }

        let mut table = TranslationTable::new();
        table.insert("k", locale_map([("zh-Hans", "x"), ("pt_BR", "y")]));
        assert!(build_translation_xml(&table).is_ok());
    }

    #[test]
    fn test_empty_entry_roundtrip() {
        let mut table = TranslationTable::new();
        table.insert("bare", LocaleMap::new());
        let xml = build_translation_xml(&table).unwrap();
        assert!(xml.contains("<translation key=\"bare\"/>"));
        assert_eq!(parse_translation_xml(&xml).unwrap(), table);
    }
}
