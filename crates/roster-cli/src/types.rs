use std::path::PathBuf;

use roster_map::MatchKind;
use roster_model::{CellCategory, FileTransformStats};
use roster_xlsx::OutputMode;

#[derive(Debug)]
pub struct MapResult {
    pub input: PathBuf,
    pub station: String,
    pub mode: OutputMode,
    pub outputs: Vec<PathBuf>,
    pub stats: FileTransformStats,
}

#[derive(Debug)]
pub struct SheetSummary {
    pub name: String,
    pub populated_cells: usize,
    pub merges: usize,
    pub hidden: bool,
}

/// How one lookup input resolved.
#[derive(Debug)]
pub struct LookupRow {
    pub input: String,
    /// Rule that matched the whole input, if any.
    pub rule: Option<(MatchKind, String)>,
    pub output: String,
    pub category: CellCategory,
}
