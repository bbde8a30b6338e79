//! Mapping import from an Excel workbook: first sheet, column A is the code,
//! column B the replacement.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};

use roster_map::{MappingError, is_header};
use roster_model::MappingTable;
use roster_xlsx::Workbook;

/// Extensions routed to [`import_workbook`] instead of the CSV/JSON readers.
const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        WORKBOOK_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

/// Reads the first sheet's A/B columns into a table.
///
/// Rows follow the CSV rules: a header row is skipped, a blank code is
/// skipped and a blank replacement maps to empty.
pub fn import_workbook(path: &Path, station: &str) -> Result<MappingTable> {
    let workbook = Workbook::open(path)
        .with_context(|| format!("read mapping workbook {}", path.display()))?;
    let first = workbook
        .sheets()
        .first()
        .ok_or_else(|| anyhow!("mapping workbook {} has no sheets", path.display()))?;
    let worksheet = workbook.worksheet(&first.name)?;

    let mut rows: BTreeMap<u32, [String; 2]> = BTreeMap::new();
    for cell in worksheet.populated_cells() {
        let slot = match cell.reference.col {
            0 => 0,
            1 => 1,
            _ => continue,
        };
        rows.entry(cell.reference.row).or_default()[slot] = cell.value.display_text();
    }

    let mut table = MappingTable::new(station);
    for (position, [code, replacement]) in rows.into_values().enumerate() {
        if position == 0 && is_header(&code) {
            debug!(header = %code, "skipping workbook header row");
            continue;
        }
        table.insert(code.trim(), replacement.trim());
    }
    if table.is_empty() {
        return Err(MappingError::EmptyImport {
            path: path.to_path_buf(),
        }
        .into());
    }
    info!(
        path = %path.display(),
        sheet = %first.name,
        station,
        entries = table.entry_count(),
        "imported workbook mappings"
    );
    Ok(table)
}
