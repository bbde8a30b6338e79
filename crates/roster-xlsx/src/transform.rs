//! Workbook transformation: map every populated cell of the selected sheets
//! and produce styled and/or plain output.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, info_span};

use roster_map::{CellMapper, CodeMatcher, MatcherProvider};
use roster_model::{
    CellCategory, CellValue, FileTransformStats, SheetTransformStats, TransformOptions,
};

use crate::error::Result;
use crate::package::{SheetInfo, Workbook};
use crate::plain::write_plain;
use crate::reference::CellRef;
use crate::styled::write_styled;
use crate::worksheet::Worksheet;

/// Which output files to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Source formatting kept; only values change.
    Styled,
    /// Values only, default formatting.
    Plain,
    #[default]
    Both,
}

impl OutputMode {
    pub fn wants_styled(self) -> bool {
        matches!(self, Self::Styled | Self::Both)
    }

    pub fn wants_plain(self) -> bool {
        matches!(self, Self::Plain | Self::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Styled => "styled",
            Self::Plain => "plain",
            Self::Both => "both",
        }
    }
}

/// Sheets to process and outputs to produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformRequest {
    /// Sheet names; empty means every sheet.
    pub sheets: Vec<String>,
    pub mode: OutputMode,
}

impl TransformRequest {
    pub fn all_sheets() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sheets<I, S>(mut self, sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sheets = sheets.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }
}

/// One populated cell of a processed sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedCell {
    pub reference: CellRef,
    pub style: u32,
    pub original: CellValue,
    pub transformed: CellValue,
    /// `None` for non-anchor cells of a merged range, which are never
    /// mapped or counted.
    pub category: Option<CellCategory>,
}

impl TransformedCell {
    pub fn is_changed(&self) -> bool {
        self.original != self.transformed
    }
}

/// Result of transforming one worksheet.
#[derive(Debug, Clone)]
pub struct SheetTransform {
    pub name: String,
    pub cells: Vec<TransformedCell>,
    pub stats: SheetTransformStats,
    pub worksheet: Worksheet,
}

impl SheetTransform {
    pub fn cell(&self, a1: &str) -> Option<&TransformedCell> {
        let reference = CellRef::parse(a1).ok()?;
        self.cells.iter().find(|cell| cell.reference == reference)
    }

    /// Text cells whose value changed, with their new text.
    pub(crate) fn edits(&self) -> HashMap<CellRef, &str> {
        self.cells
            .iter()
            .filter(|cell| cell.is_changed())
            .filter_map(|cell| match &cell.transformed {
                CellValue::Text(text) => Some((cell.reference, text.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Everything a transform produced.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Source package with rewritten values.
    pub styled: Option<Vec<u8>>,
    /// Values-only workbook.
    pub plain: Option<Vec<u8>>,
    pub stats: FileTransformStats,
    /// Per-sheet detail, in workbook order.
    pub sheets: Vec<SheetTransform>,
}

impl TransformOutput {
    /// Writes `<stem>_mapped.xlsx` and/or `<stem>_mapped_plain.xlsx` into `dir`.
    pub fn write_to(&self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        if let Some(bytes) = &self.styled {
            let path = dir.join(format!("{stem}_mapped.xlsx"));
            fs::write(&path, bytes)?;
            written.push(path);
        }
        if let Some(bytes) = &self.plain {
            let path = dir.join(format!("{stem}_mapped_plain.xlsx"));
            fs::write(&path, bytes)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Applies one station's matcher to a workbook.
///
/// The transformer owns no mutable state; the matcher is shared read-only.
#[derive(Debug, Clone)]
pub struct WorkbookTransformer<'m> {
    matcher: &'m CodeMatcher,
    options: TransformOptions,
}

impl<'m> WorkbookTransformer<'m> {
    pub fn new(matcher: &'m CodeMatcher, options: TransformOptions) -> Self {
        Self { matcher, options }
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Transforms the requested sheets.
    ///
    /// Every requested name is checked before any sheet is processed, so an
    /// unknown sheet produces an error and no output at all.
    pub fn transform(&self, workbook: &Workbook, request: &TransformRequest) -> Result<TransformOutput> {
        let selected = select_sheets(workbook, &request.sheets)?;
        let span = info_span!(
            "transform",
            station = %self.matcher.station_code(),
            sheets = selected.len(),
            mode = request.mode.as_str(),
        );
        let _guard = span.enter();
        let start = Instant::now();

        let mut sheets = Vec::with_capacity(selected.len());
        for info in selected {
            sheets.push(self.transform_sheet(workbook, &info.name)?);
        }

        let styled = if request.mode.wants_styled() {
            Some(write_styled(workbook, &sheets)?)
        } else {
            None
        };
        let plain = if request.mode.wants_plain() {
            Some(write_plain(&sheets)?)
        } else {
            None
        };

        let stats = FileTransformStats::from_sheets(sheets.iter().map(|s| s.stats.clone()).collect());
        info!(
            sheets = stats.sheet_count(),
            total_cells = stats.totals.total_cells,
            mapped_cells = stats.totals.mapped_cells,
            unchanged_cells = stats.totals.unchanged_cells,
            empty_cells = stats.totals.empty_cells,
            untouched_cells = stats.totals.untouched_cells,
            duration_ms = start.elapsed().as_millis(),
            "transform complete"
        );

        Ok(TransformOutput {
            styled,
            plain,
            stats,
            sheets,
        })
    }

    /// Maps every populated cell of one sheet.
    pub fn transform_sheet(&self, workbook: &Workbook, name: &str) -> Result<SheetTransform> {
        let span = info_span!("sheet", sheet = %name);
        let _guard = span.enter();
        let start = Instant::now();

        let worksheet = workbook.worksheet(name)?;
        let mapper = CellMapper::new(self.matcher, &self.options);
        let mut stats = SheetTransformStats::new(name);
        let mut cells = Vec::new();

        for cell in worksheet.populated_cells() {
            if worksheet.merge_member_of(cell.reference).is_some() {
                cells.push(TransformedCell {
                    reference: cell.reference,
                    style: cell.style,
                    original: cell.value.clone(),
                    transformed: cell.value.clone(),
                    category: None,
                });
                continue;
            }
            let result = mapper.map_value(&cell.value);
            stats.record(result.category);
            cells.push(TransformedCell {
                reference: cell.reference,
                style: cell.style,
                original: result.original,
                transformed: result.transformed,
                category: Some(result.category),
            });
        }

        debug!(
            total_cells = stats.counts.total_cells,
            mapped_cells = stats.counts.mapped_cells,
            merges = worksheet.merges.len(),
            duration_ms = start.elapsed().as_millis(),
            "sheet transformed"
        );

        Ok(SheetTransform {
            name: worksheet.name.clone(),
            cells,
            stats,
            worksheet,
        })
    }
}

/// Resolves the matcher for `station` through `provider` and transforms.
pub fn transform_station(
    workbook: &Workbook,
    station: &str,
    provider: &dyn MatcherProvider,
    request: &TransformRequest,
    options: TransformOptions,
) -> Result<TransformOutput> {
    // Sheet names are checked before the mapping is loaded.
    select_sheets(workbook, &request.sheets)?;
    let matcher = provider.matcher_for(station)?;
    WorkbookTransformer::new(&matcher, options).transform(workbook, request)
}

/// Validates requested sheet names and returns them in workbook order.
pub fn select_sheets<'w>(workbook: &'w Workbook, requested: &[String]) -> Result<Vec<&'w SheetInfo>> {
    if requested.is_empty() {
        return Ok(workbook.sheets().iter().collect());
    }
    for name in requested {
        workbook.sheet(name)?;
    }
    Ok(workbook
        .sheets()
        .iter()
        .filter(|sheet| requested.iter().any(|name| *name == sheet.name))
        .collect())
}
