/*!
 * XLIFF 1.2 reading and writing.
 *
 * Parsing walks the quick-xml event stream once and collects every
 * `trans-unit` found under a `body` element. Writing produces a declaration
 * prefixed, 4-space indented document with the fixed platform header.
 */

use std::collections::HashMap;
use std::fmt::Display;

use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::ConversionError;
use crate::language_utils::{self, LanguageTagStyle};
use crate::translation_unit::{LanguageDocument, MaxWidth, TranslationUnit};

pub const XLIFF_VERSION: &str = "1.2";
pub const ORIGINAL: &str = "Salesforce";
pub const SOURCE_LANGUAGE: &str = "en_US";
pub const TRANSLATION_TYPE: &str = "metadata";
pub const DATATYPE: &str = "xml";

/// Document name used when the `file` element has no `target-language`
pub const DEFAULT_DOCUMENT_NAME: &str = "translations";

/// Which text child of a trans-unit is being collected
#[derive(Debug, Clone, Copy, PartialEq)]
enum UnitField {
    Source,
    Target,
    Note,
}

impl UnitField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"source" => Some(Self::Source),
            b"target" => Some(Self::Target),
            b"note" => Some(Self::Note),
            _ => None,
        }
    }
}

// Fields of the trans-unit currently open in the event stream
#[derive(Debug, Default)]
struct PendingUnit {
    id: String,
    max_width: Option<MaxWidth>,
    size_unit: String,
    source: Option<String>,
    target: Option<String>,
    note: Option<String>,
}

impl PendingUnit {
    fn from_attributes(attributes: &HashMap<String, String>) -> Self {
        let size_unit = attributes
            .get("size-unit")
            .or_else(|| attributes.get("size_unit"))
            .cloned()
            .unwrap_or_default();

        Self {
            id: attributes.get("id").cloned().unwrap_or_default(),
            max_width: attributes.get("maxwidth").and_then(|raw| {
                let width = MaxWidth::coerce(raw);
                if width.is_none() && !raw.trim().is_empty() {
                    debug!("Ignoring non-numeric maxwidth '{}'", raw);
                }
                width
            }),
            size_unit,
            ..Self::default()
        }
    }

    fn field_mut(&mut self, field: UnitField) -> &mut Option<String> {
        match field {
            UnitField::Source => &mut self.source,
            UnitField::Target => &mut self.target,
            UnitField::Note => &mut self.note,
        }
    }

    fn finish(self) -> TranslationUnit {
        TranslationUnit {
            id: self.id,
            max_width: self.max_width,
            max_width_text: None,
            size_unit: self.size_unit,
            source: self.source.unwrap_or_default(),
            target: self.target,
            note: self.note,
        }
    }
}

/// Reads and writes XLIFF documents
#[derive(Debug, Clone, Copy, Default)]
pub struct XliffCodec {
    tag_style: LanguageTagStyle,
}

impl XliffCodec {
    pub fn new(tag_style: LanguageTagStyle) -> Self {
        Self { tag_style }
    }

    /// Parse an XLIFF document into a language document.
    ///
    /// `source_name` only serves error messages.
    pub fn parse(&self, xml: &str, source_name: &str) -> Result<LanguageDocument, ConversionError> {
        let parse_error = |reason: String| ConversionError::Parse {
            source_name: source_name.to_string(),
            reason,
        };

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut seen_file = false;
        let mut language_tag: Option<String> = None;
        let mut units: Vec<TranslationUnit> = Vec::new();
        let mut pending: Option<PendingUnit> = None;
        let mut pending_depth = 0usize;
        let mut active_field: Option<(UnitField, usize)> = None;

        loop {
            let position = reader.buffer_position();
            let event = reader
                .read_event()
                .map_err(|e| parse_error(format!("{} (near byte {})", e, position)))?;

            match event {
                Event::Start(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    let had_pending = pending.is_some();
                    self.open_element(&e, &name, &stack, &mut seen_file, &mut language_tag, &mut pending)
                        .map_err(&parse_error)?;

                    if !had_pending && pending.is_some() {
                        pending_depth = stack.len() + 1;
                    } else if had_pending && active_field.is_none() && stack.len() == pending_depth {
                        if let (Some(field), Some(unit)) = (UnitField::from_name(&name), pending.as_mut()) {
                            unit.field_mut(field).get_or_insert_with(String::new);
                            active_field = Some((field, stack.len() + 1));
                        }
                    }
                    stack.push(name);
                }
                Event::Empty(e) => {
                    let name = e.local_name().as_ref().to_vec();
                    let had_pending = pending.is_some();
                    self.open_element(&e, &name, &stack, &mut seen_file, &mut language_tag, &mut pending)
                        .map_err(&parse_error)?;

                    if !had_pending {
                        // <trans-unit/> carries attributes only
                        if let Some(unit) = pending.take() {
                            units.push(unit.finish());
                        }
                    } else if active_field.is_none() && stack.len() == pending_depth {
                        if let (Some(field), Some(unit)) = (UnitField::from_name(&name), pending.as_mut()) {
                            unit.field_mut(field).get_or_insert_with(String::new);
                        }
                    }
                }
                Event::End(_) => {
                    let depth = stack.len();
                    if stack.pop().is_none() {
                        return Err(parse_error(format!("unexpected closing tag near byte {}", position)));
                    }

                    if matches!(active_field, Some((_, field_depth)) if field_depth == depth) {
                        active_field = None;
                    }
                    if pending.is_some() && depth == pending_depth {
                        if let Some(unit) = pending.take() {
                            units.push(unit.finish());
                        }
                    }
                }
                Event::Text(t) => {
                    if let (Some((field, _)), Some(unit)) = (active_field, pending.as_mut()) {
                        let text = t.unescape().map_err(|e| parse_error(e.to_string()))?;
                        unit.field_mut(field).get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Event::CData(c) => {
                    if let (Some((field, _)), Some(unit)) = (active_field, pending.as_mut()) {
                        let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                        unit.field_mut(field).get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(parse_error(format!(
                "unexpected end of document, <{}> is not closed",
                String::from_utf8_lossy(open)
            )));
        }
        if !seen_file {
            return Err(parse_error("missing <file> element".to_string()));
        }

        Ok(LanguageDocument {
            language_tag: language_tag.unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string()),
            units,
        })
    }

    // Track the first <file> and start trans-units found under a <body>
    fn open_element(
        &self,
        element: &BytesStart,
        name: &[u8],
        stack: &[Vec<u8>],
        seen_file: &mut bool,
        language_tag: &mut Option<String>,
        pending: &mut Option<PendingUnit>,
    ) -> Result<(), String> {
        match name {
            b"file" if !*seen_file => {
                *seen_file = true;
                let attributes = attributes_of(element)?;
                *language_tag = attributes.get("target-language").cloned();
            }
            b"trans-unit" if pending.is_none() && stack.iter().any(|open| open == b"body") => {
                let attributes = attributes_of(element)?;
                *pending = Some(PendingUnit::from_attributes(&attributes));
            }
            _ => {}
        }
        Ok(())
    }

    /// Target language written into the `file` element for a document
    pub fn target_language(&self, document: &LanguageDocument) -> String {
        language_utils::normalize_language_tag(&document.language_tag, self.tag_style)
    }

    /// Serialize a language document as XLIFF text.
    ///
    /// Empty or absent targets are written as the missing-target marker and
    /// notes are only written when non-empty.
    pub fn serialize(&self, document: &LanguageDocument) -> Result<String, ConversionError> {
        let target_name = language_utils::suggested_xliff_filename(&document.language_tag, self.tag_style);
        let fail = |e: &dyn Display| ConversionError::Write {
            target: target_name.clone(),
            reason: e.to_string(),
        };

        let target_language = self.target_language(document);
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| fail(&e))?;

        let root = BytesStart::new("xliff").with_attributes([("version", XLIFF_VERSION)]);
        writer.write_event(Event::Start(root)).map_err(|e| fail(&e))?;

        let file = BytesStart::new("file").with_attributes([
            ("original", ORIGINAL),
            ("source-language", SOURCE_LANGUAGE),
            ("target-language", target_language.as_str()),
            ("translation-type", TRANSLATION_TYPE),
            ("datatype", DATATYPE),
        ]);
        writer.write_event(Event::Start(file)).map_err(|e| fail(&e))?;
        writer
            .write_event(Event::Start(BytesStart::new("body")))
            .map_err(|e| fail(&e))?;

        for unit in &document.units {
            let max_width = unit.max_width_string();
            let trans_unit = BytesStart::new("trans-unit").with_attributes([
                ("id", unit.id.as_str()),
                ("maxwidth", max_width.as_str()),
                ("size_unit", unit.size_unit.as_str()),
            ]);
            writer.write_event(Event::Start(trans_unit)).map_err(|e| fail(&e))?;

            write_text_element(&mut writer, "source", &unit.source).map_err(|e| fail(&e))?;
            write_text_element(&mut writer, "target", unit.target_or_marker()).map_err(|e| fail(&e))?;
            if let Some(note) = unit.note_text() {
                write_text_element(&mut writer, "note", note).map_err(|e| fail(&e))?;
            }

            writer
                .write_event(Event::End(BytesEnd::new("trans-unit")))
                .map_err(|e| fail(&e))?;
        }

        for closing in ["body", "file", "xliff"] {
            writer
                .write_event(Event::End(BytesEnd::new(closing)))
                .map_err(|e| fail(&e))?;
        }

        let mut xml = String::from_utf8(writer.into_inner()).map_err(|e| fail(&e))?;
        xml.push('\n');
        Ok(xml)
    }
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), String> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| e.to_string())?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(|e| e.to_string())?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| e.to_string())
}

/// Attributes of an element keyed by local name, values unescaped
fn attributes_of(element: &BytesStart) -> Result<HashMap<String, String>, String> {
    let mut attributes = HashMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}
