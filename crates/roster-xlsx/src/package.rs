//! `.xlsx` package access.
//!
//! A [`Workbook`] keeps every ZIP part as raw bytes in archive order, so the
//! styled writer can copy untouched parts byte-for-byte and only replace the
//! ones it rewrites.

use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Result, XlsxError};
use crate::shared_strings::SharedStrings;
use crate::sheet_xml::{attr_value, local_name};
use crate::styles::{CellStyle, Styles};
use crate::worksheet::Worksheet;

/// OLE compound document signature used by legacy `.xls` files.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: [u8; 2] = [b'P', b'K'];

const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";
const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_WORKSHEET: &str = "/worksheet";
const REL_SHARED_STRINGS: &str = "/sharedStrings";
const REL_STYLES: &str = "/styles";

/// A worksheet entry from `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub sheet_id: Option<u32>,
    /// Package part holding the worksheet XML, e.g. `xl/worksheets/sheet1.xml`.
    pub part: String,
    /// `state` attribute (`hidden`, `veryHidden`); `None` when visible.
    pub state: Option<String>,
}

#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

/// A loaded `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct Workbook {
    parts: Vec<Part>,
    index: HashMap<String, usize>,
    sheets: Vec<SheetInfo>,
    shared_strings: SharedStrings,
    shared_strings_part: Option<String>,
    styles: Styles,
}

impl Workbook {
    /// Reads a workbook from a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "reading workbook");
        Self::from_bytes(&bytes)
    }

    /// Reads a workbook from the bytes of an `.xlsx` file.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(&OLE_MAGIC) {
            return Err(XlsxError::UnsupportedFormat(
                "legacy .xls workbooks are not supported; save the file as .xlsx".to_string(),
            ));
        }
        if !bytes.starts_with(&ZIP_MAGIC) {
            return Err(XlsxError::UnsupportedFormat(
                "input is not an .xlsx (ZIP) package".to_string(),
            ));
        }

        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut data)?;
            parts.push(Part { name, data });
        }
        let index = parts
            .iter()
            .enumerate()
            .map(|(position, part)| (part.name.clone(), position))
            .collect();

        let mut workbook = Self {
            parts,
            index,
            sheets: Vec::new(),
            shared_strings: SharedStrings::default(),
            shared_strings_part: None,
            styles: Styles::default(),
        };
        workbook.load_structure()?;
        Ok(workbook)
    }

    fn load_structure(&mut self) -> Result<()> {
        let workbook_part = self.workbook_part()?;
        let workbook_xml = self
            .part(&workbook_part)
            .ok_or_else(|| XlsxError::MissingPart(workbook_part.clone()))?;
        let entries = parse_workbook_sheets(workbook_xml)?;
        let relationships = match self.part(&rels_part_name(&workbook_part)) {
            Some(rels) => parse_relationships(rels)?,
            None => Vec::new(),
        };

        let mut sheets = Vec::with_capacity(entries.len());
        for (name, sheet_id, rel_id, state) in entries {
            let part = relationships
                .iter()
                .find(|rel| rel.id == rel_id && !rel.external && rel.rel_type.ends_with(REL_WORKSHEET))
                .map(|rel| resolve_target(&workbook_part, &rel.target))
                .ok_or_else(|| {
                    XlsxError::Invalid(format!("no worksheet relationship for sheet '{name}'"))
                })?;
            sheets.push(SheetInfo {
                name,
                sheet_id,
                part,
                state,
            });
        }

        let related = |suffix: &str, fallback: &str| {
            relationships
                .iter()
                .find(|rel| !rel.external && rel.rel_type.ends_with(suffix))
                .map(|rel| resolve_target(&workbook_part, &rel.target))
                .or_else(|| Some(fallback.to_string()))
                .filter(|part| self.index.contains_key(part))
        };
        let shared_strings_part = related(REL_SHARED_STRINGS, "xl/sharedStrings.xml");
        let styles_part = related(REL_STYLES, "xl/styles.xml");

        let shared_strings = match shared_strings_part.as_deref().and_then(|p| self.part(p)) {
            Some(xml) => SharedStrings::parse(xml)?,
            None => SharedStrings::default(),
        };
        let styles = match styles_part.as_deref().and_then(|p| self.part(p)) {
            Some(xml) => Styles::parse(xml)?,
            None => Styles::default(),
        };

        debug!(
            sheets = sheets.len(),
            shared_strings = shared_strings.len(),
            cell_styles = styles.cell_xf_count(),
            "workbook structure loaded"
        );
        self.sheets = sheets;
        self.shared_strings = shared_strings;
        self.shared_strings_part = shared_strings_part;
        self.styles = styles;
        Ok(())
    }

    fn workbook_part(&self) -> Result<String> {
        if let Some(rels) = self.part("_rels/.rels") {
            let found = parse_relationships(rels)?
                .into_iter()
                .find(|rel| !rel.external && rel.rel_type.ends_with(REL_OFFICE_DOCUMENT))
                .map(|rel| resolve_target("", &rel.target));
            if let Some(part) = found {
                return Ok(part);
            }
        }
        if self.index.contains_key(DEFAULT_WORKBOOK_PART) {
            Ok(DEFAULT_WORKBOOK_PART.to_string())
        } else {
            Err(XlsxError::MissingPart(DEFAULT_WORKBOOK_PART.to_string()))
        }
    }

    /// Sheet names in workbook (tab) order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    /// Looks up a sheet by its exact name.
    pub fn sheet(&self, name: &str) -> Result<&SheetInfo> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| XlsxError::SheetNotFound {
                name: name.to_string(),
                available: self.sheets.iter().map(|s| s.name.clone()).collect(),
            })
    }

    /// Parses a worksheet into its read model.
    pub fn worksheet(&self, name: &str) -> Result<Worksheet> {
        let info = self.sheet(name)?;
        let xml = self.sheet_xml(info)?;
        Worksheet::parse(&info.name, xml, &self.shared_strings)
    }

    pub(crate) fn sheet_xml(&self, info: &SheetInfo) -> Result<&[u8]> {
        self.part(&info.part)
            .ok_or_else(|| XlsxError::MissingPart(info.part.clone()))
    }

    /// Resolves the formatting of style index `index` (`s` attribute).
    pub fn style(&self, index: u32) -> Option<CellStyle> {
        self.styles.style(index)
    }

    pub fn styles(&self) -> &Styles {
        &self.styles
    }

    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    pub(crate) fn shared_strings_part(&self) -> Option<&str> {
        self.shared_strings_part.as_deref()
    }

    /// Raw bytes of a package part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&position| self.parts[position].data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|part| part.name.as_str())
    }

    /// Writes the package with some parts replaced; every other part is
    /// copied unchanged, in the original order.
    pub(crate) fn write_with(&self, replacements: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
        for part in &self.parts {
            let data = replacements.get(&part.name).unwrap_or(&part.data);
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

type SheetEntry = (String, Option<u32>, String, Option<String>);

fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<SheetEntry>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == b"sheet" => {
                let name = attr_value(&e, b"name")?
                    .ok_or_else(|| XlsxError::Invalid("sheet without a name".to_string()))?;
                let rel_id = attr_value(&e, b"id")?.ok_or_else(|| {
                    XlsxError::Invalid(format!("sheet '{name}' has no relationship id"))
                })?;
                let sheet_id = attr_value(&e, b"sheetId")?.and_then(|id| id.parse().ok());
                let state = attr_value(&e, b"state")?.filter(|state| state != "visible");
                sheets.push((name, sheet_id, rel_id, state));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

fn parse_relationships(xml: &[u8]) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let (Some(id), Some(target)) = (attr_value(&e, b"Id")?, attr_value(&e, b"Target")?)
                else {
                    continue;
                };
                relationships.push(Relationship {
                    id,
                    rel_type: attr_value(&e, b"Type")?.unwrap_or_default(),
                    target,
                    external: attr_value(&e, b"TargetMode")?
                        .is_some_and(|mode| mode.eq_ignore_ascii_case("External")),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`.
fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolves a relationship target against the directory of `base_part`.
fn resolve_target(base_part: &str, target: &str) -> String {
    let target = target.split_once('#').map_or(target, |(base, _)| base);
    let (target, absolute) = match target.strip_prefix('/') {
        Some(rest) => (rest, true),
        None => (target, false),
    };
    let mut components: Vec<&str> = if absolute {
        Vec::new()
    } else {
        base_part
            .rsplit_once('/')
            .map(|(dir, _)| dir.split('/').filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(segment),
        }
    }
    components.join("/")
}
