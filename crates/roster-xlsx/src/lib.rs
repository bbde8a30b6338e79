//! Style-preserving roster workbook transformation.
//!
//! Reads an `.xlsx` package, maps the text of every populated cell through a
//! station's [`roster_map::CodeMatcher`] and writes:
//!
//! - a styled workbook: the source package with only cell values rewritten,
//!   so fills, fonts, borders, number formats, merges, column widths and row
//!   heights are exactly those of the source
//! - a plain workbook: values only, one sheet per processed sheet

pub mod error;
pub mod package;
mod plain;
pub mod reference;
pub mod shared_strings;
mod sheet_xml;
mod styled;
pub mod styles;
pub mod transform;
pub mod worksheet;

pub use error::{Result, XlsxError};
pub use package::{SheetInfo, Workbook};
pub use reference::{CellRange, CellRef};
pub use shared_strings::{SharedString, SharedStrings};
pub use styles::{BorderStyle, CellStyle, Color, FillStyle, FontStyle, Styles};
pub use transform::{
    OutputMode, SheetTransform, TransformOutput, TransformRequest, TransformedCell,
    WorkbookTransformer, select_sheets, transform_station,
};
pub use worksheet::{Cell, CellStorage, ColumnWidth, Worksheet};
