//! Read-only view of `xl/styles.xml`.
//!
//! Only what is needed to describe a cell's look is resolved: number format,
//! font, fill and border line styles. The styled writer never rewrites this
//! part; cells keep their `s` index and therefore their exact formatting.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::Result;
use crate::sheet_xml::{attr_value, local_name};

/// A colour reference as written in the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Color {
    /// `AARRGGBB` hex value.
    Rgb(String),
    Theme(u32),
    Indexed(u32),
    Auto,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontStyle {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillStyle {
    pub pattern: Option<String>,
    pub fg_color: Option<Color>,
    pub bg_color: Option<Color>,
}

impl FillStyle {
    /// The colour a reader sees for a solid fill.
    pub fn solid_color(&self) -> Option<&Color> {
        match self.pattern.as_deref() {
            Some("solid") => self.fg_color.as_ref(),
            _ => None,
        }
    }
}

/// Line style of each border side (`thin`, `medium`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorderStyle {
    pub left: Option<String>,
    pub right: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
}

/// Fully resolved formatting of one `cellXfs` entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub num_fmt_id: u32,
    /// Custom format code; `None` for built-in formats.
    pub num_fmt_code: Option<String>,
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CellXf {
    num_fmt_id: u32,
    font_id: usize,
    fill_id: usize,
    border_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug, Clone, Default)]
pub struct Styles {
    num_fmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    cell_xfs: Vec<CellXf>,
}

impl Styles {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut styles = Self::default();
        let mut section = Section::None;
        // Open elements above the current event; sections sit at depth 1.
        let mut depth = 0usize;
        let mut font: Option<FontStyle> = None;
        let mut fill: Option<FillStyle> = None;
        let mut border: Option<BorderStyle> = None;

        loop {
            let event = reader.read_event_into(&mut buf)?;
            let (element, is_empty) = match &event {
                Event::Start(e) => (Some(e), false),
                Event::Empty(e) => (Some(e), true),
                _ => (None, false),
            };

            if let Some(e) = element {
                let qname = e.name();
                let name = local_name(qname.as_ref());
                if depth == 1 {
                    section = match name {
                        b"numFmts" => Section::NumFmts,
                        b"fonts" => Section::Fonts,
                        b"fills" => Section::Fills,
                        b"borders" => Section::Borders,
                        b"cellXfs" => Section::CellXfs,
                        _ => Section::None,
                    };
                }
                match (section, name) {
                    (Section::NumFmts, b"numFmt") => {
                        if let (Some(id), Some(code)) =
                            (attr_u32(e, b"numFmtId")?, attr_value(e, b"formatCode")?)
                        {
                            styles.num_fmts.insert(id, code);
                        }
                    }
                    (Section::Fonts, b"font") if is_empty => styles.fonts.push(FontStyle::default()),
                    (Section::Fonts, b"font") => font = Some(FontStyle::default()),
                    (Section::Fonts, property) => {
                        if let Some(font) = font.as_mut() {
                            apply_font_property(font, property, e)?;
                        }
                    }
                    (Section::Fills, b"fill") if is_empty => styles.fills.push(FillStyle::default()),
                    (Section::Fills, b"fill") => fill = Some(FillStyle::default()),
                    (Section::Fills, property) => {
                        if let Some(fill) = fill.as_mut() {
                            apply_fill_property(fill, property, e)?;
                        }
                    }
                    (Section::Borders, b"border") if is_empty => {
                        styles.borders.push(BorderStyle::default());
                    }
                    (Section::Borders, b"border") => border = Some(BorderStyle::default()),
                    (Section::Borders, side) if depth == 3 => {
                        if let Some(border) = border.as_mut() {
                            apply_border_side(border, side, e)?;
                        }
                    }
                    (Section::CellXfs, b"xf") => {
                        styles.cell_xfs.push(CellXf {
                            num_fmt_id: attr_u32(e, b"numFmtId")?.unwrap_or(0),
                            font_id: attr_u32(e, b"fontId")?.unwrap_or(0) as usize,
                            fill_id: attr_u32(e, b"fillId")?.unwrap_or(0) as usize,
                            border_id: attr_u32(e, b"borderId")?.unwrap_or(0) as usize,
                        });
                    }
                    _ => {}
                }
            }

            match event {
                Event::Start(_) => depth += 1,
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    match (section, local_name(e.name().as_ref())) {
                        (Section::Fonts, b"font") => styles.fonts.extend(font.take()),
                        (Section::Fills, b"fill") => styles.fills.extend(fill.take()),
                        (Section::Borders, b"border") => styles.borders.extend(border.take()),
                        _ => {}
                    }
                    if depth == 1 {
                        section = Section::None;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    /// Number of `cellXfs` entries; valid `s` indices are below this.
    pub fn cell_xf_count(&self) -> usize {
        self.cell_xfs.len()
    }

    /// Resolves the style a cell with `s = index` is displayed with.
    pub fn style(&self, index: u32) -> Option<CellStyle> {
        let xf = self.cell_xfs.get(index as usize)?;
        Some(CellStyle {
            num_fmt_id: xf.num_fmt_id,
            num_fmt_code: self.num_fmts.get(&xf.num_fmt_id).cloned(),
            font: self.fonts.get(xf.font_id).cloned().unwrap_or_default(),
            fill: self.fills.get(xf.fill_id).cloned().unwrap_or_default(),
            border: self.borders.get(xf.border_id).cloned().unwrap_or_default(),
        })
    }
}

fn apply_font_property(font: &mut FontStyle, property: &[u8], e: &BytesStart<'_>) -> Result<()> {
    match property {
        b"b" => font.bold = flag(e)?,
        b"i" => font.italic = flag(e)?,
        b"u" => {
            font.underline = attr_value(e, b"val")?.is_none_or(|val| val != "none");
        }
        b"sz" => font.size = attr_value(e, b"val")?.and_then(|val| val.parse().ok()),
        b"name" => font.name = attr_value(e, b"val")?,
        b"color" => font.color = parse_color(e)?,
        _ => {}
    }
    Ok(())
}

fn apply_fill_property(fill: &mut FillStyle, property: &[u8], e: &BytesStart<'_>) -> Result<()> {
    match property {
        b"patternFill" => fill.pattern = attr_value(e, b"patternType")?,
        b"fgColor" => fill.fg_color = parse_color(e)?,
        b"bgColor" => fill.bg_color = parse_color(e)?,
        _ => {}
    }
    Ok(())
}

fn apply_border_side(border: &mut BorderStyle, side: &[u8], e: &BytesStart<'_>) -> Result<()> {
    let slot = match side {
        b"left" | b"start" => &mut border.left,
        b"right" | b"end" => &mut border.right,
        b"top" => &mut border.top,
        b"bottom" => &mut border.bottom,
        _ => return Ok(()),
    };
    *slot = attr_value(e, b"style")?;
    Ok(())
}

/// Boolean font flags: `<b/>` is on, `<b val="0"/>` is off.
fn flag(e: &BytesStart<'_>) -> Result<bool> {
    Ok(attr_value(e, b"val")?.is_none_or(|val| !matches!(val.as_str(), "0" | "false")))
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<u32>> {
    Ok(attr_value(e, key)?.and_then(|val| val.trim().parse().ok()))
}

fn parse_color(e: &BytesStart<'_>) -> Result<Option<Color>> {
    if let Some(rgb) = attr_value(e, b"rgb")? {
        return Ok(Some(Color::Rgb(rgb.to_ascii_uppercase())));
    }
    if let Some(theme) = attr_u32(e, b"theme")? {
        return Ok(Some(Color::Theme(theme)));
    }
    if let Some(indexed) = attr_u32(e, b"indexed")? {
        return Ok(Some(Color::Indexed(indexed)));
    }
    if attr_value(e, b"auto")?.is_some() {
        return Ok(Some(Color::Auto));
    }
    Ok(None)
}
