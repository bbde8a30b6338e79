//! Worksheet read model.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use roster_model::CellValue;

use crate::error::Result;
use crate::reference::{CellRange, CellRef};
use crate::shared_strings::SharedStrings;
use crate::sheet_xml::{CellCursor, attr_value, local_name};

/// How a cell stores its value in the sheet XML (`t` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellStorage {
    /// `t="s"`: index into the shared string table.
    SharedString,
    /// `t="inlineStr"`: text inside `<is>`.
    InlineString,
    /// `t="str"`: formula string result.
    FormulaString,
    Bool,
    Error,
    /// No `t` or `t="n"`.
    #[default]
    Number,
}

impl CellStorage {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => Self::SharedString,
            Some("inlineStr") => Self::InlineString,
            Some("str") => Self::FormulaString,
            Some("b") => Self::Bool,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub reference: CellRef,
    /// Index into `cellXfs`; 0 when the cell has no `s` attribute.
    pub style: u32,
    pub storage: CellStorage,
    pub value: CellValue,
}

/// `<col min max width>`; `min`/`max` are one-based column numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    pub name: String,
    /// Cells in document order (row-major).
    pub cells: Vec<Cell>,
    pub merges: Vec<CellRange>,
    pub column_widths: Vec<ColumnWidth>,
    /// Zero-based row index to height in points.
    pub row_heights: BTreeMap<u32, f64>,
}

impl Worksheet {
    pub fn cell(&self, reference: CellRef) -> Option<&Cell> {
        self.cells.iter().find(|cell| cell.reference == reference)
    }

    /// Looks up a cell by A1 reference.
    pub fn cell_a1(&self, a1: &str) -> Option<&Cell> {
        CellRef::parse(a1).ok().and_then(|reference| self.cell(reference))
    }

    /// The merged range `reference` belongs to as a non-anchor cell.
    pub fn merge_member_of(&self, reference: CellRef) -> Option<&CellRange> {
        self.merges.iter().find(|range| range.is_member(reference))
    }

    /// Cells holding a value, i.e. the ones a transform inspects.
    pub fn populated_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| !cell.value.is_empty())
    }

    pub(crate) fn parse(name: &str, xml: &[u8], shared_strings: &SharedStrings) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();

        let mut sheet = Worksheet {
            name: name.to_string(),
            ..Worksheet::default()
        };
        let mut cursor = CellCursor::default();
        let mut cell: Option<CellBuilder> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match local_name(e.name().as_ref()) {
                    b"row" => sheet.enter_row(&mut cursor, &e)?,
                    b"c" => cell = Some(CellBuilder::start(&mut cursor, &e)?),
                    other => {
                        if let Some(builder) = cell.as_mut() {
                            builder.open(other);
                        }
                    }
                },
                Event::Empty(e) => match local_name(e.name().as_ref()) {
                    b"row" => sheet.enter_row(&mut cursor, &e)?,
                    b"c" => {
                        let builder = CellBuilder::start(&mut cursor, &e)?;
                        sheet.cells.push(builder.finish(shared_strings));
                    }
                    b"mergeCell" => {
                        if let Some(range) = attr_value(&e, b"ref")? {
                            sheet.merges.push(CellRange::parse(&range)?);
                        }
                    }
                    b"col" => sheet.push_column(&e)?,
                    b"f" => {
                        if let Some(builder) = cell.as_mut() {
                            builder.formula.get_or_insert_with(String::new);
                        }
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if let Some(builder) = cell.as_mut() {
                        builder.text(&e.unescape()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(builder) = cell.as_mut() {
                        builder.text(&String::from_utf8(e.into_inner().into_owned())?);
                    }
                }
                Event::End(e) => match local_name(e.name().as_ref()) {
                    b"c" => {
                        if let Some(builder) = cell.take() {
                            sheet.cells.push(builder.finish(shared_strings));
                        }
                    }
                    other => {
                        if let Some(builder) = cell.as_mut() {
                            builder.close(other);
                        }
                    }
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(sheet)
    }

    fn enter_row(&mut self, cursor: &mut CellCursor, row: &BytesStart<'_>) -> Result<()> {
        let index = cursor.enter_row(row)?;
        let custom = attr_value(row, b"customHeight")?.is_some_and(|v| v == "1" || v == "true");
        if custom && let Some(height) = attr_value(row, b"ht")?.and_then(|v| v.parse().ok()) {
            self.row_heights.insert(index, height);
        }
        Ok(())
    }

    fn push_column(&mut self, col: &BytesStart<'_>) -> Result<()> {
        let min = attr_value(col, b"min")?.and_then(|v| v.parse().ok());
        let max = attr_value(col, b"max")?.and_then(|v| v.parse().ok());
        let width = attr_value(col, b"width")?.and_then(|v| v.parse().ok());
        if let (Some(min), Some(max), Some(width)) = (min, max, width) {
            self.column_widths.push(ColumnWidth { min, max, width });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

#[derive(Debug)]
struct CellBuilder {
    reference: CellRef,
    style: u32,
    storage: CellStorage,
    raw_value: Option<String>,
    formula: Option<String>,
    inline: Option<String>,
    target: TextTarget,
    phonetic_depth: usize,
}

impl CellBuilder {
    fn start(cursor: &mut CellCursor, c: &BytesStart<'_>) -> Result<Self> {
        let reference = cursor.cell(c)?;
        let style = attr_value(c, b"s")?
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        let storage = CellStorage::from_attr(attr_value(c, b"t")?.as_deref());
        Ok(Self {
            reference,
            style,
            storage,
            raw_value: None,
            formula: None,
            inline: None,
            target: TextTarget::None,
            phonetic_depth: 0,
        })
    }

    fn open(&mut self, name: &[u8]) {
        match name {
            b"v" => {
                self.raw_value.get_or_insert_with(String::new);
                self.target = TextTarget::Value;
            }
            b"f" => {
                self.formula.get_or_insert_with(String::new);
                self.target = TextTarget::Formula;
            }
            b"is" => {
                self.inline.get_or_insert_with(String::new);
            }
            b"rPh" => self.phonetic_depth += 1,
            b"t" if self.inline.is_some() && self.phonetic_depth == 0 => {
                self.target = TextTarget::Inline;
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"v" | b"f" | b"t" => self.target = TextTarget::None,
            b"rPh" => self.phonetic_depth = self.phonetic_depth.saturating_sub(1),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let slot = match self.target {
            TextTarget::None => return,
            TextTarget::Value => self.raw_value.as_mut(),
            TextTarget::Formula => self.formula.as_mut(),
            TextTarget::Inline => self.inline.as_mut(),
        };
        if let Some(slot) = slot {
            slot.push_str(text);
        }
    }

    fn finish(self, shared_strings: &SharedStrings) -> Cell {
        let literal = self.literal(shared_strings);
        let value = match self.formula {
            Some(formula) => CellValue::Formula {
                formula,
                cached: (!literal.is_empty()).then(|| Box::new(literal)),
            },
            None => literal,
        };
        Cell {
            reference: self.reference,
            style: self.style,
            storage: self.storage,
            value,
        }
    }

    fn literal(&self, shared_strings: &SharedStrings) -> CellValue {
        if self.storage == CellStorage::InlineString {
            return match &self.inline {
                Some(text) => CellValue::Text(text.clone()),
                None => CellValue::Empty,
            };
        }
        let Some(raw) = self.raw_value.as_deref() else {
            return CellValue::Empty;
        };
        match self.storage {
            CellStorage::SharedString => raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.text(index))
                .map_or(CellValue::Empty, |text| CellValue::Text(text.to_string())),
            CellStorage::FormulaString => CellValue::Text(raw.to_string()),
            CellStorage::Bool => CellValue::Bool(matches!(raw.trim(), "1" | "true")),
            CellStorage::Error => CellValue::Error(raw.to_string()),
            CellStorage::Number | CellStorage::InlineString => raw
                .trim()
                .parse()
                .map_or_else(|_| CellValue::Text(raw.to_string()), CellValue::Number),
        }
    }
}
