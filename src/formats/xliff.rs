//! Support for XLIFF 1.2 and 2.0 documents.
//!
//! Only the subset that Angular-style tooling produces and consumes is handled:
//!
//! - 2.0: `xliff/file/unit/segment/{source,target}` plus `unit/notes/note`.
//!   Interpolations are `<ph id="0" equiv="INTERPOLATION" disp="{{name}}"/>`.
//! - 1.2: `xliff/file/body/trans-unit/{source,target,note}` plus location
//!   `context-group`s. Interpolations are `<x id="0" equiv-text="{{name}}"/>`.
//!
//! Units nested in `group` elements are collected as well.

use quick_xml::{
    Reader, Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    io::{BufRead, Write},
    str::FromStr,
};

use crate::{
    error::Error,
    formats::{attribute, unexpected_eof},
    placeholder::find_interpolations,
    traits::Parser,
};

pub const XLIFF2_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:2.0";
pub const XLIFF1_NAMESPACE: &str = "urn:oasis:names:tc:xliff:document:1.2";

const FILE_ID: &str = "ngi18n";
const FILE_ORIGINAL: &str = "ng.template";
const FILE_DATATYPE: &str = "plaintext";
const DEFAULT_UNIT_DATATYPE: &str = "html";
const INTERPOLATION_EQUIV: &str = "INTERPOLATION";

/// XLIFF dialect. Serialized the way build configurations name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum XliffVersion {
    #[serde(rename = "xliff")]
    V1_2,
    #[default]
    #[serde(rename = "xliff2")]
    V2_0,
}

impl XliffVersion {
    /// Value of the root `version` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            XliffVersion::V1_2 => "1.2",
            XliffVersion::V2_0 => "2.0",
        }
    }

    pub fn namespace(&self) -> &'static str {
        match self {
            XliffVersion::V1_2 => XLIFF1_NAMESPACE,
            XliffVersion::V2_0 => XLIFF2_NAMESPACE,
        }
    }

    fn from_version_attribute(version: &str) -> Result<Self, Error> {
        match version {
            "2.0" => Ok(XliffVersion::V2_0),
            "1.2" => Ok(XliffVersion::V1_2),
            other => Err(Error::unsupported_version(other)),
        }
    }
}

impl Display for XliffVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for XliffVersion {
    type Err = Error;

    /// Accepts either the version number or the format name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1.2" | "xliff" => Ok(XliffVersion::V1_2),
            "2.0" | "xliff2" => Ok(XliffVersion::V2_0),
            other => Err(Error::unsupported_version(other)),
        }
    }
}

/// One translation unit as read from an XLIFF document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct TranslationEntry {
    /// Unit id; the translation table key.
    pub id: String,
    /// Source text with interpolations written back as `{{...}}`.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meaning: Option<String>,
    /// Template the message was extracted from, when the document records it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_number: Option<u32>,
    /// 1.2 `trans-unit` datatype, kept only when it is not the default `html`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub datatype: Option<String>,
}

/// One translation unit to be written.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct XliffUnit {
    pub id: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    /// Overrides the 1.2 `trans-unit` datatype (default `html`).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub datatype: Option<String>,
}

impl XliffUnit {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

impl From<TranslationEntry> for XliffUnit {
    fn from(entry: TranslationEntry) -> Self {
        Self {
            id: entry.id,
            source: entry.source,
            target: entry.target,
            note: entry.description,
            datatype: entry.datatype,
        }
    }
}

/// Content of a `source`/`target` element.
///
/// Text without interpolations is written as a plain text node; anything else
/// becomes a sequence of text runs and placeholder elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Segments(Vec<Run>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Text(String),
    /// `id` counts placeholders within one element, starting at 0.
    Placeholder { id: usize, literal: String },
}

impl Content {
    /// Splits `text` around its `{{...}}` interpolations.
    pub fn from_text(text: &str) -> Self {
        let interpolations = find_interpolations(text);
        if interpolations.is_empty() {
            return Content::Text(text.to_string());
        }

        let mut runs = Vec::with_capacity(interpolations.len() * 2 + 1);
        let mut last = 0;
        for (id, interpolation) in interpolations.into_iter().enumerate() {
            if interpolation.range.start > last {
                runs.push(Run::Text(text[last..interpolation.range.start].to_string()));
            }
            runs.push(Run::Placeholder {
                id,
                literal: interpolation.literal.to_string(),
            });
            last = interpolation.range.end;
        }
        if last < text.len() {
            runs.push(Run::Text(text[last..].to_string()));
        }

        Content::Segments(runs)
    }

    /// The text with placeholders written back as their literals.
    pub fn to_plain_text(&self) -> String {
        match self {
            Content::Text(text) => text.clone(),
            Content::Segments(runs) => runs
                .iter()
                .map(|run| match run {
                    Run::Text(text) => text.as_str(),
                    Run::Placeholder { literal, .. } => literal.as_str(),
                })
                .collect(),
        }
    }
}

/// A parsed XLIFF document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XliffDocument {
    pub version: XliffVersion,
    pub source_language: String,
    pub target_language: Option<String>,
    pub entries: Vec<TranslationEntry>,
}

impl Parser for XliffDocument {
    /// Parse from any reader. Fails if the root element is not `<xliff>`.
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        read_document(reader)?
            .ok_or_else(|| Error::InvalidResource("missing <xliff> root element".to_string()))
    }

    /// Write to any writer. Targets are written only when `target_language` is set.
    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let units: Vec<XliffUnit> = self.entries.iter().cloned().map(XliffUnit::from).collect();
        write_xliff(
            writer,
            &units,
            &self.source_language,
            self.target_language.as_deref(),
            self.version,
        )
    }
}

/// Parses XLIFF 1.2 or 2.0 content into entries.
///
/// A document without an `<xliff>` root, or without `file`/`body` containers,
/// yields no entries. Any version other than `1.2`/`2.0` is an error.
pub fn parse_xliff(content: &str) -> Result<Vec<TranslationEntry>, Error> {
    Ok(read_document(content.as_bytes())?
        .map(|doc| doc.entries)
        .unwrap_or_default())
}

/// Generates an XLIFF document for `units`.
pub fn generate_xliff(
    units: &[XliffUnit],
    source_locale: &str,
    target_locale: Option<&str>,
    version: XliffVersion,
) -> Result<String, Error> {
    let mut out = Vec::new();
    write_xliff(&mut out, units, source_locale, target_locale, version)?;
    String::from_utf8(out).map_err(|e| Error::DataMismatch(e.to_string()))
}

/// Writes an XLIFF document, indented by two spaces.
///
/// A unit's target is written only when a target locale is given and the unit
/// has non-empty target text.
pub fn write_xliff<W: Write>(
    mut writer: W,
    units: &[XliffUnit],
    source_locale: &str,
    target_locale: Option<&str>,
    version: XliffVersion,
) -> Result<(), Error> {
    let mut xml_writer = Writer::new_with_indent(&mut writer, b' ', 2);
    xml_writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    match version {
        XliffVersion::V2_0 => write_xliff2(&mut xml_writer, units, source_locale, target_locale)?,
        XliffVersion::V1_2 => write_xliff1(&mut xml_writer, units, source_locale, target_locale)?,
    }

    xml_writer.get_mut().write_all(b"\n")?;
    Ok(())
}

fn write_xliff2<W: Write>(
    xml_writer: &mut Writer<W>,
    units: &[XliffUnit],
    source_locale: &str,
    target_locale: Option<&str>,
) -> Result<(), Error> {
    let mut root = BytesStart::new("xliff");
    root.push_attribute(("version", XliffVersion::V2_0.as_str()));
    root.push_attribute(("xmlns", XliffVersion::V2_0.namespace()));
    root.push_attribute(("srcLang", source_locale));
    if let Some(target) = target_locale {
        root.push_attribute(("trgLang", target));
    }
    xml_writer.write_event(Event::Start(root))?;

    let mut file = BytesStart::new("file");
    file.push_attribute(("id", FILE_ID));
    file.push_attribute(("original", FILE_ORIGINAL));

    if units.is_empty() {
        xml_writer.write_event(Event::Empty(file))?;
    } else {
        xml_writer.write_event(Event::Start(file))?;
        for unit in units {
            let mut elem = BytesStart::new("unit");
            elem.push_attribute(("id", unit.id.as_str()));
            xml_writer.write_event(Event::Start(elem))?;

            if let Some(note) = unit.note.as_deref().filter(|n| !n.is_empty()) {
                xml_writer.write_event(Event::Start(BytesStart::new("notes")))?;
                write_content(
                    xml_writer,
                    "note",
                    &Content::Text(note.to_string()),
                    XliffVersion::V2_0,
                )?;
                xml_writer.write_event(Event::End(BytesEnd::new("notes")))?;
            }

            xml_writer.write_event(Event::Start(BytesStart::new("segment")))?;
            write_content(
                xml_writer,
                "source",
                &Content::from_text(&unit.source),
                XliffVersion::V2_0,
            )?;
            if let Some(target) = unit_target(unit, target_locale) {
                write_content(
                    xml_writer,
                    "target",
                    &Content::from_text(target),
                    XliffVersion::V2_0,
                )?;
            }
            xml_writer.write_event(Event::End(BytesEnd::new("segment")))?;

            xml_writer.write_event(Event::End(BytesEnd::new("unit")))?;
        }
        xml_writer.write_event(Event::End(BytesEnd::new("file")))?;
    }

    xml_writer.write_event(Event::End(BytesEnd::new("xliff")))?;
    Ok(())
}

fn write_xliff1<W: Write>(
    xml_writer: &mut Writer<W>,
    units: &[XliffUnit],
    source_locale: &str,
    target_locale: Option<&str>,
) -> Result<(), Error> {
    let mut root = BytesStart::new("xliff");
    root.push_attribute(("version", XliffVersion::V1_2.as_str()));
    root.push_attribute(("xmlns", XliffVersion::V1_2.namespace()));
    xml_writer.write_event(Event::Start(root))?;

    let mut file = BytesStart::new("file");
    file.push_attribute(("source-language", source_locale));
    if let Some(target) = target_locale {
        file.push_attribute(("target-language", target));
    }
    file.push_attribute(("datatype", FILE_DATATYPE));
    file.push_attribute(("original", FILE_ORIGINAL));
    xml_writer.write_event(Event::Start(file))?;

    if units.is_empty() {
        xml_writer.write_event(Event::Empty(BytesStart::new("body")))?;
    } else {
        xml_writer.write_event(Event::Start(BytesStart::new("body")))?;
        for unit in units {
            let mut elem = BytesStart::new("trans-unit");
            elem.push_attribute(("id", unit.id.as_str()));
            elem.push_attribute((
                "datatype",
                unit.datatype.as_deref().unwrap_or(DEFAULT_UNIT_DATATYPE),
            ));
            xml_writer.write_event(Event::Start(elem))?;

            write_content(
                xml_writer,
                "source",
                &Content::from_text(&unit.source),
                XliffVersion::V1_2,
            )?;
            if let Some(target) = unit_target(unit, target_locale) {
                write_content(
                    xml_writer,
                    "target",
                    &Content::from_text(target),
                    XliffVersion::V1_2,
                )?;
            }
            if let Some(note) = unit.note.as_deref().filter(|n| !n.is_empty()) {
                write_content(
                    xml_writer,
                    "note",
                    &Content::Text(note.to_string()),
                    XliffVersion::V1_2,
                )?;
            }

            xml_writer.write_event(Event::End(BytesEnd::new("trans-unit")))?;
        }
        xml_writer.write_event(Event::End(BytesEnd::new("body")))?;
    }

    xml_writer.write_event(Event::End(BytesEnd::new("file")))?;
    xml_writer.write_event(Event::End(BytesEnd::new("xliff")))?;
    Ok(())
}

fn unit_target<'a>(unit: &'a XliffUnit, target_locale: Option<&str>) -> Option<&'a str> {
    target_locale?;
    unit.target.as_deref().filter(|t| !t.is_empty())
}

/// Writes one element holding `content`. Empty text collapses to `<tag/>`.
///
/// Mixed content is rendered on a single line so the indenting writer does not
/// inject whitespace between text runs and placeholders.
fn write_content<W: Write>(
    xml_writer: &mut Writer<W>,
    tag: &str,
    content: &Content,
    version: XliffVersion,
) -> Result<(), Error> {
    match content {
        Content::Text(text) if text.is_empty() => {
            xml_writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        Content::Text(text) => {
            xml_writer.write_event(Event::Start(BytesStart::new(tag)))?;
            xml_writer.write_event(Event::Text(BytesText::new(text)))?;
            xml_writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        Content::Segments(runs) => {
            let inline = render_runs(runs, version)?;
            xml_writer.write_event(Event::Start(BytesStart::new(tag)))?;
            xml_writer.write_event(Event::Text(BytesText::from_escaped(inline)))?;
            xml_writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
    }
    Ok(())
}

fn render_runs(runs: &[Run], version: XliffVersion) -> Result<String, Error> {
    let mut inline = Writer::new(Vec::new());
    for run in runs {
        match run {
            Run::Text(text) => {
                inline.write_event(Event::Text(BytesText::new(text)))?;
            }
            Run::Placeholder { id, literal } => {
                let id = id.to_string();
                let elem = match version {
                    XliffVersion::V2_0 => {
                        let mut ph = BytesStart::new("ph");
                        ph.push_attribute(("id", id.as_str()));
                        ph.push_attribute(("equiv", INTERPOLATION_EQUIV));
                        ph.push_attribute(("disp", literal.as_str()));
                        ph
                    }
                    XliffVersion::V1_2 => {
                        let mut x = BytesStart::new("x");
                        x.push_attribute(("id", id.as_str()));
                        x.push_attribute(("equiv-text", literal.as_str()));
                        x
                    }
                };
                inline.write_event(Event::Empty(elem))?;
            }
        }
    }
    String::from_utf8(inline.into_inner()).map_err(|e| Error::DataMismatch(e.to_string()))
}

/// Reads up to and including the root element. `None` if the root is not `<xliff>`.
fn read_document<R: BufRead>(reader: R) -> Result<Option<XliffDocument>, Error> {
    let mut xml_reader = Reader::from_reader(reader);
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"xliff" => {
                let mut doc = document_from_root(e)?;
                read_units(&mut xml_reader, &mut doc)?;
                tracing::debug!(
                    version = %doc.version,
                    units = doc.entries.len(),
                    "parsed XLIFF document"
                );
                return Ok(Some(doc));
            }
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"xliff" => {
                return document_from_root(e).map(Some);
            }
            Ok(Event::Start(_)) | Ok(Event::Empty(_)) | Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }
}

fn document_from_root(root: &BytesStart<'_>) -> Result<XliffDocument, Error> {
    let version = attribute(root, b"version")?.unwrap_or_default();
    Ok(XliffDocument {
        version: XliffVersion::from_version_attribute(&version)?,
        source_language: attribute(root, b"srcLang")?.unwrap_or_default(),
        target_language: attribute(root, b"trgLang")?,
        entries: Vec::new(),
    })
}

/// Collects units until the end of the root element.
fn read_units<R: BufRead>(
    xml_reader: &mut Reader<R>,
    doc: &mut XliffDocument,
) -> Result<(), Error> {
    let mut buf = Vec::new();
    let mut file_depth = 0usize;
    let mut body_depth = 0usize;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match (doc.version, e.local_name().as_ref()) {
                (_, b"file") => {
                    file_depth += 1;
                    if doc.version == XliffVersion::V1_2 {
                        apply_file_languages(e, doc)?;
                    }
                }
                (XliffVersion::V1_2, b"body") if file_depth > 0 => body_depth += 1,
                (XliffVersion::V2_0, b"unit") if file_depth > 0 => {
                    if let Some(entry) = parse_unit(xml_reader, e)? {
                        doc.entries.push(entry);
                    }
                }
                (XliffVersion::V1_2, b"trans-unit") if body_depth > 0 => {
                    let entry = parse_trans_unit(xml_reader, e)?;
                    doc.entries.push(entry);
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match (doc.version, e.local_name().as_ref()) {
                (XliffVersion::V1_2, b"file") => apply_file_languages(e, doc)?,
                (XliffVersion::V1_2, b"trans-unit") if body_depth > 0 => {
                    doc.entries.push(trans_unit_header(e)?);
                }
                // An empty 2.0 unit has no segment and is skipped.
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"file" => file_depth = file_depth.saturating_sub(1),
                b"body" => body_depth = body_depth.saturating_sub(1),
                b"xliff" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    Ok(())
}

fn apply_file_languages(file: &BytesStart<'_>, doc: &mut XliffDocument) -> Result<(), Error> {
    if doc.source_language.is_empty()
        && let Some(source) = attribute(file, b"source-language")?
    {
        doc.source_language = source;
    }
    if doc.target_language.is_none() {
        doc.target_language = attribute(file, b"target-language")?;
    }
    Ok(())
}

/// Parses a 2.0 `unit`. Units without a `segment` yield `None`.
fn parse_unit<R: BufRead>(
    xml_reader: &mut Reader<R>,
    start: &BytesStart<'_>,
) -> Result<Option<TranslationEntry>, Error> {
    let mut entry = TranslationEntry {
        id: attribute(start, b"id")?.unwrap_or_default(),
        ..TranslationEntry::default()
    };
    let mut has_segment = false;
    let mut target = String::new();
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"segment" => {
                    has_segment = true;
                    let (source, segment_target) = parse_segment(xml_reader)?;
                    entry.source.push_str(&source);
                    target.push_str(&segment_target);
                }
                b"note" => {
                    let category = attribute(e, b"category")?;
                    let text = read_inline(xml_reader, "note")?;
                    apply_note(&mut entry, category.as_deref(), text);
                }
                b"notes" => {}
                // Skips ignorable whitespace and any other subtree.
                _ => {
                    read_inline(xml_reader, "unit")?;
                }
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"segment" => {
                has_segment = true;
            }
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"unit" => break,
            Ok(Event::Eof) => return Err(unexpected_eof("unit")),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    if !has_segment {
        return Ok(None);
    }
    entry.target = (!target.is_empty()).then_some(target);
    Ok(Some(entry))
}

/// Returns the `(source, target)` text of a 2.0 `segment`.
fn parse_segment<R: BufRead>(xml_reader: &mut Reader<R>) -> Result<(String, String), Error> {
    let mut source = String::new();
    let mut target = String::new();
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"source" => source = read_inline(xml_reader, "source")?,
                b"target" => target = read_inline(xml_reader, "target")?,
                _ => {
                    read_inline(xml_reader, "segment")?;
                }
            },
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => return Err(unexpected_eof("segment")),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    Ok((source, target))
}

/// Entry with the attributes of a 1.2 `trans-unit` and no text yet.
fn trans_unit_header(start: &BytesStart<'_>) -> Result<TranslationEntry, Error> {
    Ok(TranslationEntry {
        id: attribute(start, b"id")?.unwrap_or_default(),
        datatype: attribute(start, b"datatype")?
            .filter(|datatype| !datatype.is_empty() && datatype != DEFAULT_UNIT_DATATYPE),
        ..TranslationEntry::default()
    })
}

fn parse_trans_unit<R: BufRead>(
    xml_reader: &mut Reader<R>,
    start: &BytesStart<'_>,
) -> Result<TranslationEntry, Error> {
    let mut entry = trans_unit_header(start)?;
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"source" => entry.source = read_inline(xml_reader, "source")?,
                b"target" => {
                    let target = read_inline(xml_reader, "target")?;
                    entry.target = (!target.is_empty()).then_some(target);
                }
                b"note" => {
                    let from = attribute(e, b"from")?;
                    let text = read_inline(xml_reader, "note")?;
                    apply_note(&mut entry, from.as_deref(), text);
                }
                b"context" => {
                    let kind = attribute(e, b"context-type")?;
                    let text = read_inline(xml_reader, "context")?;
                    apply_context(&mut entry, kind.as_deref(), text);
                }
                // context-group is a plain container
                b"context-group" => {}
                _ => {
                    read_inline(xml_reader, "trans-unit")?;
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"trans-unit" => break,
            Ok(Event::Eof) => return Err(unexpected_eof("trans-unit")),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    Ok(entry)
}

/// Routes a note by its 2.0 `category` / 1.2 `from` attribute.
fn apply_note(entry: &mut TranslationEntry, category: Option<&str>, text: String) {
    if text.is_empty() {
        return;
    }
    match category {
        Some("meaning") => {
            entry.meaning.get_or_insert(text);
        }
        Some("location") => {
            let (file, line) = match text.rsplit_once(':') {
                Some((file, line)) => match line.trim().parse::<u32>() {
                    Ok(line) => (file.to_string(), Some(line)),
                    Err(_) => (text.clone(), None),
                },
                None => (text.clone(), None),
            };
            if entry.source_file.is_none() {
                entry.source_file = Some(file);
                entry.line_number = line;
            }
        }
        _ => {
            entry.description.get_or_insert(text);
        }
    }
}

fn apply_context(entry: &mut TranslationEntry, context_type: Option<&str>, text: String) {
    match context_type {
        Some("sourcefile") if entry.source_file.is_none() && !text.is_empty() => {
            entry.source_file = Some(text);
        }
        Some("linenumber") if entry.line_number.is_none() => {
            entry.line_number = text.parse().ok();
        }
        _ => {}
    }
}

/// Reads the mixed content of the current element up to its end tag, writing
/// placeholder elements back as their display text. The result is trimmed.
fn read_inline<R: BufRead>(xml_reader: &mut Reader<R>, element: &str) -> Result<String, Error> {
    Ok(read_mixed(xml_reader, element)?.trim().to_string())
}

fn read_mixed<R: BufRead>(xml_reader: &mut Reader<R>, element: &str) -> Result<String, Error> {
    let mut buf = Vec::new();
    let mut text = String::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Text(e)) => text.push_str(&e.unescape()?),
            Ok(Event::CData(e)) => text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::Empty(ref e)) => {
                if is_placeholder(e)
                    && let Some(display) = placeholder_display(e)?
                {
                    text.push_str(&display);
                }
            }
            Ok(Event::Start(ref e)) => {
                let display = if is_placeholder(e) {
                    placeholder_display(e)?
                } else {
                    None
                };
                let inner = read_mixed(xml_reader, element)?;
                text.push_str(display.as_deref().unwrap_or(&inner));
            }
            Ok(Event::End(_)) => break,
            Ok(Event::Eof) => return Err(unexpected_eof(element)),
            Ok(_) => {}
            Err(e) => return Err(Error::XmlParse(e)),
        }
        buf.clear();
    }

    Ok(text)
}

fn is_placeholder(e: &BytesStart<'_>) -> bool {
    matches!(e.local_name().as_ref(), b"ph" | b"x")
}

/// `disp` (2.0), then `equiv-text` (1.2), then `equiv`.
const PLACEHOLDER_DISPLAY: [&[u8]; 3] = [b"disp", b"equiv-text", b"equiv"];

fn placeholder_display(e: &BytesStart<'_>) -> Result<Option<String>, Error> {
    for name in PLACEHOLDER_DISPLAY {
        if let Some(value) = attribute(e, name)?.filter(|v| !v.is_empty()) {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_xliff2_units() {
        let xml = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <xliff version="2.0" xmlns="urn:oasis:names:tc:xliff:document:2.0" srcLang="en" trgLang="es">
              <file id="ngi18n" original="ng.template">
                <unit id="app.title">
                  <notes>
                    <note category="description">Main heading</note>
                    <note category="meaning">title</note>
                    <note category="location">src/app/app.html:12</note>
                  </notes>
                  <segment>
                    <source>My App</source>
                    <target>Mi Aplicación</target>
                  </segment>
                </unit>
                <unit id="app.footer">
                  <segment>
                    <source>Footer</source>
                  </segment>
                </unit>
              </file>
            </xliff>
        "#};
        let doc = XliffDocument::from_str(xml).unwrap();
        assert_eq!(doc.version, XliffVersion::V2_0);
        assert_eq!(doc.source_language, "en");
        assert_eq!(doc.target_language.as_deref(), Some("es"));
        assert_eq!(doc.entries.len(), 2);

        let title = &doc.entries[0];
        assert_eq!(title.id, "app.title");
        assert_eq!(title.source, "My App");
        assert_eq!(title.target.as_deref(), Some("Mi Aplicación"));
        assert_eq!(title.description.as_deref(), Some("Main heading"));
        assert_eq!(title.meaning.as_deref(), Some("title"));
        assert_eq!(title.source_file.as_deref(), Some("src/app/app.html"));
        assert_eq!(title.line_number, Some(12));

        assert_eq!(doc.entries[1].target, None);
    }

    #[test]
    fn test_parse_xliff2_placeholders_in_position() {
        let xml = r#"<xliff version="2.0"><file><unit id="greet"><segment>
            <source>Hello <ph id="0" equiv="INTERPOLATION" disp="{{name}}"/>, you have <ph id="1" equiv="INTERPOLATION" disp="{{count}}"/> messages</source>
            <target><ph id="0" equiv="INTERPOLATION" disp="{{name}}"/>, tienes <ph id="1" equiv="INTERPOLATION" disp="{{count}}"/> mensajes</target>
        </segment></unit></file></xliff>"#;
        let entries = parse_xliff(xml).unwrap();
        assert_eq!(entries[0].source, "Hello {{name}}, you have {{count}} messages");
        assert_eq!(
            entries[0].target.as_deref(),
            Some("{{name}}, tienes {{count}} mensajes")
        );
    }

    #[test]
    fn test_ph_display_fallbacks() {
        let xml = r#"<xliff version="2.0"><file><unit id="k"><segment>
            <source>A <ph id="0" equiv="INTERPOLATION_1"/> B <ph id="1">inner</ph></source>
        </segment></unit></file></xliff>"#;
        let entries = parse_xliff(xml).unwrap();
        assert_eq!(entries[0].source, "A INTERPOLATION_1 B inner");
    }

    #[test]
    fn test_parse_xliff1_trans_units() {
        let xml = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
              <file source-language="en" target-language="fr" datatype="plaintext" original="ng.template">
                <body>
                  <trans-unit id="welcome" datatype="html">
                    <source>Welcome <x id="0" equiv-text="{{ user }}"/>!</source>
                    <target>Bienvenue <x id="0" equiv-text="{{ user }}"/> !</target>
                    <context-group purpose="location">
                      <context context-type="sourcefile">src/app/home.html</context>
                      <context context-type="linenumber">4</context>
                    </context-group>
                    <note priority="1" from="description">Greeting banner</note>
                    <note priority="1" from="meaning">home</note>
                  </trans-unit>
                  <trans-unit id="legacy" datatype="x-icu">
                    <source>Legacy</source>
                  </trans-unit>
                </body>
              </file>
            </xliff>
        "#};
        let doc = XliffDocument::from_str(xml).unwrap();
        assert_eq!(doc.version, XliffVersion::V1_2);
        assert_eq!(doc.source_language, "en");
        assert_eq!(doc.target_language.as_deref(), Some("fr"));

        let welcome = &doc.entries[0];
        assert_eq!(welcome.source, "Welcome {{ user }}!");
        assert_eq!(welcome.target.as_deref(), Some("Bienvenue {{ user }} !"));
        assert_eq!(welcome.description.as_deref(), Some("Greeting banner"));
        assert_eq!(welcome.meaning.as_deref(), Some("home"));
        assert_eq!(welcome.source_file.as_deref(), Some("src/app/home.html"));
        assert_eq!(welcome.line_number, Some(4));
        assert_eq!(welcome.datatype, None);

        assert_eq!(doc.entries[1].datatype.as_deref(), Some("x-icu"));
    }

    #[test]
    fn test_single_unit_and_missing_containers() {
        let single = r#"<xliff version="1.2"><file><body><trans-unit id="only"><source>One</source></trans-unit></body></file></xliff>"#;
        assert_eq!(parse_xliff(single).unwrap().len(), 1);

        assert!(parse_xliff(r#"<xliff version="2.0"/>"#).unwrap().is_empty());
        assert!(parse_xliff(r#"<xliff version="2.0"></xliff>"#).unwrap().is_empty());
        assert!(parse_xliff(r#"<xliff version="1.2"><file source-language="en"/></xliff>"#)
            .unwrap()
            .is_empty());
        assert!(
            parse_xliff(r#"<xliff version="1.2"><file><trans-unit id="outside"><source>x</source></trans-unit></file></xliff>"#)
                .unwrap()
                .is_empty()
        );
        assert!(parse_xliff("<resources/>").unwrap().is_empty());
    }

    #[test]
    fn test_unit_without_segment_is_skipped() {
        let xml = r#"<xliff version="2.0"><file><unit id="a"/><unit id="b"><notes><note>n</note></notes></unit></file></xliff>"#;
        assert!(parse_xliff(xml).unwrap().is_empty());
    }

    #[test]
    fn test_units_in_groups_are_collected() {
        let xml = r#"<xliff version="2.0"><file><group id="g"><unit id="a"><segment><source>A</source></segment></unit></group></file></xliff>"#;
        let entries = parse_xliff(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn test_unsupported_version() {
        let err = parse_xliff(r#"<xliff version="1.1"><file/></xliff>"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert!(err.to_string().contains("1.1"));

        assert!(parse_xliff("<xliff><file/></xliff>").is_err());
    }

    #[test]
    fn test_malformed_xml() {
        let xml = r#"<xliff version="2.0"><file><unit id="a"><segment><source>A</target></segment></unit></file></xliff>"#;
        assert!(matches!(parse_xliff(xml), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_non_xliff_root_is_an_error_for_documents() {
        assert!(matches!(
            XliffDocument::from_str("<resources/>"),
            Err(Error::InvalidResource(_))
        ));
    }

    #[test]
    fn test_content_from_text() {
        assert_eq!(Content::from_text("Plain"), Content::Text("Plain".to_string()));
        assert_eq!(
            Content::from_text("Hi {{ name }}!"),
            Content::Segments(vec![
                Run::Text("Hi ".to_string()),
                Run::Placeholder {
                    id: 0,
                    literal: "{{ name }}".to_string()
                },
                Run::Text("!".to_string()),
            ])
        );
        assert_eq!(
            Content::from_text("{{a}}{{b}}"),
            Content::Segments(vec![
                Run::Placeholder {
                    id: 0,
                    literal: "{{a}}".to_string()
                },
                Run::Placeholder {
                    id: 1,
                    literal: "{{b}}".to_string()
                },
            ])
        );
        assert_eq!(Content::from_text("x {{a}} y").to_plain_text(), "x {{a}} y");
    }

    #[test]
    fn test_generate_xliff2_exact_layout() {
        let units = vec![
            XliffUnit::new("app.title", "My App").with_target("Mi App"),
            XliffUnit::new("greet", "Hello {{name}}!").with_note("Greeting"),
        ];
        let xml = generate_xliff(&units, "en", Some("es"), XliffVersion::V2_0).unwrap();
        let expected = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <xliff version="2.0" xmlns="urn:oasis:names:tc:xliff:document:2.0" srcLang="en" trgLang="es">
              <file id="ngi18n" original="ng.template">
                <unit id="app.title">
                  <segment>
                    <source>My App</source>
                    <target>Mi App</target>
                  </segment>
                </unit>
                <unit id="greet">
                  <notes>
                    <note>Greeting</note>
                  </notes>
                  <segment>
                    <source>Hello <ph id="0" equiv="INTERPOLATION" disp="{{name}}"/>!</source>
                  </segment>
                </unit>
              </file>
            </xliff>
        "#};
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_generate_xliff1_exact_layout() {
        let mut unit = XliffUnit::new("welcome", "Hi {{user}}").with_target("Salut {{user}}");
        unit.datatype = Some("x-icu".to_string());
        let xml = generate_xliff(&[unit], "en", Some("fr"), XliffVersion::V1_2).unwrap();
        let expected = indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
              <file source-language="en" target-language="fr" datatype="plaintext" original="ng.template">
                <body>
                  <trans-unit id="welcome" datatype="x-icu">
                    <source>Hi <x id="0" equiv-text="{{user}}"/></source>
                    <target>Salut <x id="0" equiv-text="{{user}}"/></target>
                  </trans-unit>
                </body>
              </file>
            </xliff>
        "#};
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_target_requires_target_locale() {
        let units = vec![XliffUnit::new("k", "Source").with_target("Cible")];
        let xml = generate_xliff(&units, "en", None, XliffVersion::V2_0).unwrap();
        assert!(!xml.contains("<target>"));
        assert!(!xml.contains("trgLang"));

        let empty_target = vec![XliffUnit::new("k", "Source").with_target("")];
        let xml = generate_xliff(&empty_target, "en", Some("fr"), XliffVersion::V1_2).unwrap();
        assert!(!xml.contains("<target"));
    }

    #[test]
    fn test_empty_elements_are_elided() {
        let xml = generate_xliff(&[], "en", None, XliffVersion::V1_2).unwrap();
        assert!(xml.contains("<body/>"));
        let xml = generate_xliff(&[], "en", None, XliffVersion::V2_0).unwrap();
        assert!(xml.contains("<file id=\"ngi18n\" original=\"ng.template\"/>"));
        let xml =
            generate_xliff(&[XliffUnit::new("blank", "")], "en", None, XliffVersion::V2_0).unwrap();
        assert!(xml.contains("<source/>"));
    }

    #[test]
    fn test_placeholders_roundtrip_both_versions() {
        let units = vec![
            XliffUnit::new("a", "{{count}} items for {{ user.name }} & co")
                .with_target("{{count}} éléments"),
        ];
        for version in [XliffVersion::V1_2, XliffVersion::V2_0] {
            let xml = generate_xliff(&units, "en", Some("fr"), version).unwrap();
            let entries = parse_xliff(&xml).unwrap();
            assert_eq!(entries[0].source, units[0].source, "{}", version);
            assert_eq!(entries[0].target, units[0].target, "{}", version);
        }
    }

    #[test]
    fn test_document_roundtrip_keeps_datatype_and_description() {
        let doc = XliffDocument {
            version: XliffVersion::V1_2,
            source_language: "en".to_string(),
            target_language: Some("de".to_string()),
            entries: vec![TranslationEntry {
                id: "k".to_string(),
                source: "Save".to_string(),
                target: Some("Speichern".to_string()),
                description: Some("Button".to_string()),
                datatype: Some("x-custom".to_string()),
                ..TranslationEntry::default()
            }],
        };
        let xml = Parser::to_string(&doc).unwrap();
        let reparsed = XliffDocument::from_str(&xml).unwrap();
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_version_from_str() {
        assert_eq!("xliff".parse::<XliffVersion>().unwrap(), XliffVersion::V1_2);
        assert_eq!("xliff2".parse::<XliffVersion>().unwrap(), XliffVersion::V2_0);
        assert_eq!("2.0".parse::<XliffVersion>().unwrap(), XliffVersion::V2_0);
        assert!("xlf3".parse::<XliffVersion>().is_err());
        assert_eq!(
            serde_json::to_string(&XliffVersion::V1_2).unwrap(),
            "\"xliff\""
        );
    }
}
