//! Importing mapping tables from CSV or JSON files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use tracing::{debug, info};

use roster_model::MappingTable;

use crate::error::{MappingError, Result};
use crate::repository::parse_document;

/// First-column values that mark a header row.
const HEADER_NAMES: &[&str] = &[
    "from", "from_code", "code", "ma", "mã", "mã gốc", "key", "source",
];

/// Import a mapping table, choosing the reader by file extension.
///
/// `.json` files use the repository document format (or a flat object);
/// everything else is read as CSV.
pub fn import_file(path: &Path, station: &str) -> Result<MappingTable> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        import_json(path, station)
    } else {
        import_csv(path, station)
    }
}

/// Import a two-column CSV: code, replacement.
///
/// A header row is skipped when its first cell looks like a column name.
/// A missing second column means an empty replacement. Row order is kept
/// and a later duplicate code wins.
pub fn import_csv(path: &Path, station: &str) -> Result<MappingTable> {
    let file = File::open(path)?;
    let table = read_csv(file, station)?;
    if table.is_empty() {
        return Err(MappingError::EmptyImport {
            path: path.to_path_buf(),
        });
    }
    info!(
        path = %path.display(),
        station,
        entries = table.entry_count(),
        "imported CSV mappings"
    );
    Ok(table)
}

/// Read CSV mapping rows from any reader.
pub fn read_csv<R: Read>(reader: R, station: &str) -> Result<MappingTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(reader);

    let mut table = MappingTable::new(station);
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let Some(code) = record.get(0) else {
            continue;
        };
        let code = code.trim_start_matches('\u{feff}');
        if row == 0 && is_header(code) {
            debug!(header = code, "skipping CSV header row");
            continue;
        }
        let replacement = record.get(1).map(str::trim).unwrap_or_default();
        table.insert(code.trim(), replacement);
    }
    Ok(table)
}

/// Import a JSON mapping file.
pub fn import_json(path: &Path, station: &str) -> Result<MappingTable> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let (_, pairs) = parse_document(path, value)?;
    let table = MappingTable::from_pairs(station, pairs);
    if table.is_empty() {
        return Err(MappingError::EmptyImport {
            path: path.to_path_buf(),
        });
    }
    info!(
        path = %path.display(),
        station,
        entries = table.entry_count(),
        "imported JSON mappings"
    );
    Ok(table)
}

/// True when `first_cell` is a column name rather than a code.
pub fn is_header(first_cell: &str) -> bool {
    let lowered = first_cell.trim().to_lowercase();
    HEADER_NAMES.contains(&lowered.as_str())
}
