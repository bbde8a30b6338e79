//! Mapping statistics per sheet and per file.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Outcome of transforming one cell (or one token inside a cell).
///
/// For text, the variants are ordered by significance: a cell whose tokens
/// disagree is reported under the most significant token category
/// (`Mapped` > `Empty` > `Unchanged`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellCategory {
    /// Non-text, formula or blank cell passed through without tokenizing.
    Untouched,
    /// Text resolved to itself, or an unmapped token kept verbatim.
    Unchanged,
    /// Explicit deletion rule, or an unmapped token dropped.
    Empty,
    /// At least one token replaced by a different non-empty value.
    Mapped,
}

impl CellCategory {
    /// Combines two token categories, keeping the more significant one.
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Untouched => "untouched",
            Self::Unchanged => "unchanged",
            Self::Empty => "empty",
            Self::Mapped => "mapped",
        }
    }
}

/// Cell counters shared by sheet and file statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformCounts {
    pub total_cells: usize,
    pub mapped_cells: usize,
    pub unchanged_cells: usize,
    pub empty_cells: usize,
    pub untouched_cells: usize,
}

impl TransformCounts {
    pub fn record(&mut self, category: CellCategory) {
        self.total_cells += 1;
        match category {
            CellCategory::Mapped => self.mapped_cells += 1,
            CellCategory::Unchanged => self.unchanged_cells += 1,
            CellCategory::Empty => self.empty_cells += 1,
            CellCategory::Untouched => self.untouched_cells += 1,
        }
    }

    /// Number of text cells that went through the mapper.
    pub fn text_cells(&self) -> usize {
        self.mapped_cells + self.unchanged_cells + self.empty_cells
    }
}

impl AddAssign for TransformCounts {
    fn add_assign(&mut self, other: Self) {
        self.total_cells += other.total_cells;
        self.mapped_cells += other.mapped_cells;
        self.unchanged_cells += other.unchanged_cells;
        self.empty_cells += other.empty_cells;
        self.untouched_cells += other.untouched_cells;
    }
}

/// Statistics for one processed worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTransformStats {
    pub sheet_name: String,
    #[serde(flatten)]
    pub counts: TransformCounts,
}

impl SheetTransformStats {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            counts: TransformCounts::default(),
        }
    }

    pub fn record(&mut self, category: CellCategory) {
        self.counts.record(category);
    }
}

/// Statistics for one transformed file: every processed sheet in workbook
/// order plus their sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransformStats {
    pub sheets: Vec<SheetTransformStats>,
    pub totals: TransformCounts,
}

impl FileTransformStats {
    pub fn from_sheets(sheets: Vec<SheetTransformStats>) -> Self {
        let mut totals = TransformCounts::default();
        for sheet in &sheets {
            totals += sheet.counts;
        }
        Self { sheets, totals }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetTransformStats> {
        self.sheets.iter().find(|sheet| sheet.sheet_name == name)
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}
