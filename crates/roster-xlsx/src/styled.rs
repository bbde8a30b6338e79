//! Styled output: the source package with rewritten cell values.
//!
//! Only the worksheet XML of sheets that have edits (and the shared string
//! table, when new strings are needed) is rewritten. Inside a worksheet only
//! the edited `<c>` elements change; rows, column widths, merges and every
//! other element are streamed through untouched.

use std::collections::HashMap;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::error::{Result, XlsxError};
use crate::package::Workbook;
use crate::reference::CellRef;
use crate::shared_strings::SharedStringAppender;
use crate::sheet_xml::{CellCursor, attr_value, local_name, needs_space_preserve};
use crate::transform::SheetTransform;

/// Builds the styled output package.
pub(crate) fn write_styled(workbook: &Workbook, sheets: &[SheetTransform]) -> Result<Vec<u8>> {
    let mut appender = SharedStringAppender::new(workbook.shared_strings());
    let mut replacements = HashMap::new();

    for sheet in sheets {
        let edits = sheet.edits();
        if edits.is_empty() {
            continue;
        }
        let info = workbook.sheet(&sheet.name)?;
        let patched = patch_worksheet(workbook.sheet_xml(info)?, &edits, &mut appender)?;
        debug!(sheet = %sheet.name, edited_cells = edits.len(), "worksheet patched");
        replacements.insert(info.part.clone(), patched);
    }

    if appender.is_dirty() {
        let part = workbook
            .shared_strings_part()
            .ok_or_else(|| XlsxError::MissingPart("xl/sharedStrings.xml".to_string()))?;
        let original = workbook
            .part(part)
            .ok_or_else(|| XlsxError::MissingPart(part.to_string()))?;
        debug!(appended = appender.appended_count(), "shared strings extended");
        replacements.insert(part.to_string(), appender.apply(original)?);
    }

    workbook.write_with(&replacements)
}

/// Rewrites the `<c>` elements listed in `edits`; everything else is copied.
pub(crate) fn patch_worksheet(
    original: &[u8],
    edits: &HashMap<CellRef, &str>,
    appender: &mut SharedStringAppender,
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(original);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + edits.len() * 16));
    let mut cursor = CellCursor::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"row" => {
                cursor.enter_row(&e)?;
                writer.write_event(Event::Start(e.into_owned()))?;
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"row" => {
                cursor.enter_row(&e)?;
                writer.write_event(Event::Empty(e.into_owned()))?;
            }
            Event::Start(e) if local_name(e.name().as_ref()) == b"c" => {
                let cell = e.into_owned();
                let reference = cursor.cell(&cell)?;
                match edits.get(&reference) {
                    Some(value) => {
                        skip_element(&mut reader)?;
                        write_cell(&mut writer, &cell, value, appender)?;
                    }
                    None => writer.write_event(Event::Start(cell))?,
                }
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"c" => {
                cursor.cell(&e)?;
                writer.write_event(Event::Empty(e.into_owned()))?;
            }
            Event::Eof => break,
            event => writer.write_event(event.into_owned())?,
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

/// Consumes events up to and including the end of the current element.
fn skip_element<R: std::io::BufRead>(reader: &mut Reader<R>) -> Result<()> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XlsxError::Invalid(
                    "unexpected end of worksheet inside a cell".to_string(),
                ));
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Writes `original` with a new text value, keeping every attribute except
/// `t` and the cell's storage form (shared vs inline string).
fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    original: &BytesStart<'_>,
    value: &str,
    appender: &mut SharedStringAppender,
) -> Result<()> {
    let qualified = String::from_utf8(original.name().as_ref().to_vec())?;
    let prefix = qualified
        .rsplit_once(':')
        .map(|(prefix, _)| format!("{prefix}:"))
        .unwrap_or_default();
    let shared = attr_value(original, b"t")?.as_deref() == Some("s");

    let mut cell = BytesStart::new(qualified.clone());
    for attr in original.attributes() {
        let attr = attr?;
        if local_name(attr.key.as_ref()) != b"t" {
            cell.push_attribute(attr);
        }
    }

    if value.is_empty() {
        writer.write_event(Event::Empty(cell))?;
        return Ok(());
    }

    if shared {
        cell.push_attribute(("t", "s"));
        let index = appender.index_for(value).to_string();
        let v = format!("{prefix}v");
        writer.write_event(Event::Start(cell))?;
        writer.write_event(Event::Start(BytesStart::new(v.as_str())))?;
        writer.write_event(Event::Text(BytesText::new(&index)))?;
        writer.write_event(Event::End(BytesEnd::new(v.as_str())))?;
    } else {
        cell.push_attribute(("t", "inlineStr"));
        let is = format!("{prefix}is");
        let t = format!("{prefix}t");
        let mut text = BytesStart::new(t.as_str());
        if needs_space_preserve(value) {
            text.push_attribute(("xml:space", "preserve"));
        }
        writer.write_event(Event::Start(cell))?;
        writer.write_event(Event::Start(BytesStart::new(is.as_str())))?;
        writer.write_event(Event::Start(text))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(t.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new(is.as_str())))?;
    }
    writer.write_event(Event::End(BytesEnd::new(qualified)))?;
    Ok(())
}
