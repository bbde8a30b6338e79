//! Supplying a matcher for a station.

use std::collections::BTreeMap;

use tracing::debug;

use roster_model::{GLOBAL_STATION, MappingTable};

use crate::error::Result;
use crate::matcher::CodeMatcher;
use crate::repository::{MappingRepository, normalize_station};

/// Source of the effective mapping table for a station.
///
/// Lookup order is the station's own table, then the `global` table, then an
/// empty table. A missing table is never an error.
pub trait MatcherProvider {
    /// Returns the effective table for `station`.
    fn table_for(&self, station: &str) -> Result<MappingTable>;

    /// Builds a matcher from the effective table.
    fn matcher_for(&self, station: &str) -> Result<CodeMatcher> {
        let table = self.table_for(station)?;
        CodeMatcher::new(&table)
    }
}

impl MatcherProvider for MappingRepository {
    fn table_for(&self, station: &str) -> Result<MappingTable> {
        self.load_effective(station)
    }
}

/// In-memory tables keyed by station, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTables {
    tables: BTreeMap<String, MappingTable>,
}

impl StaticTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table under its own station code, replacing any previous one.
    pub fn with_table(mut self, table: MappingTable) -> Result<Self> {
        self.insert(table)?;
        Ok(self)
    }

    pub fn insert(&mut self, table: MappingTable) -> Result<()> {
        let station = normalize_station(table.station_code())?;
        self.tables.insert(station, table);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl MatcherProvider for StaticTables {
    fn table_for(&self, station: &str) -> Result<MappingTable> {
        let station = normalize_station(station)?;
        if let Some(table) = self.tables.get(&station) {
            return Ok(table.clone());
        }
        let mut table = MappingTable::new(station.clone());
        if let Some(global) = self.tables.get(GLOBAL_STATION) {
            debug!(station = %station, "using global mappings");
            table.merge(global);
        }
        Ok(table)
    }
}
