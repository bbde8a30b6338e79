//! Roster code mapping.
//!
//! Resolves shift codes in roster cells against a per-station mapping table:
//!
//! - [`CodeMatcher`]: exact and pattern rules, longest key first
//! - [`CellTokenizer`]: splits a cell on one separator kind, keeping spacing
//! - [`CellMapper`]: maps a whole cell under an [`roster_model::UnmappedPolicy`]
//! - [`MappingRepository`]: versioned JSON tables on disk
//! - [`import_file`]: CSV/JSON import

pub mod cell;
pub mod error;
pub mod import;
pub mod matcher;
pub mod provider;
pub mod repository;
pub mod tokenizer;

pub use cell::{CellMapper, TextOutcome, TransformResult};
pub use error::{MappingError, Result};
pub use import::{import_csv, import_file, import_json, is_header, read_csv};
pub use matcher::{CodeMatcher, MatchKind, RuleMatch};
pub use provider::{MatcherProvider, StaticTables};
pub use repository::{MappingMeta, MappingRepository, StationSummary, normalize_station};
pub use tokenizer::{CellTokenizer, Token, TokenizedCell, detect_separator};
