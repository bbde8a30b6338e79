pub mod cell;
pub mod error;
pub mod mapping;
pub mod options;
pub mod stats;

pub use cell::CellValue;
pub use error::{ModelError, Result};
pub use mapping::{GLOBAL_STATION, MappingEntry, MappingKey, MappingTable, normalize_code};
pub use options::{Separators, TransformOptions, UnmappedPolicy};
pub use stats::{CellCategory, FileTransformStats, SheetTransformStats, TransformCounts};
