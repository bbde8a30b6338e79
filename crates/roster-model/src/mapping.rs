//! Station mapping tables.
//!
//! A [`MappingTable`] is the immutable snapshot of one station's
//! code-to-replacement rules. Keys keep their original casing for display but
//! are unique by their normalized (trimmed, upper-cased) form.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Station whose table is used when a station has no table of its own.
pub const GLOBAL_STATION: &str = "global";

/// Normalizes a code for case-insensitive comparison.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// How a mapping key is matched against tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingKey {
    /// Matches a token whose normalized form equals the normalized key.
    Exact(String),
    /// Matches tokens through a regular expression or `*` wildcard.
    Pattern(String),
}

impl MappingKey {
    /// Classifies a raw key.
    ///
    /// Keys starting with `^`, ending with `$` or containing `*` are patterns;
    /// everything else is an exact code.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with('^') || trimmed.ends_with('$') || trimmed.contains('*') {
            Self::Pattern(trimmed.to_string())
        } else {
            Self::Exact(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(key) | Self::Pattern(key) => key,
        }
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Self::Pattern(_))
    }
}

/// One code-to-replacement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Source code as written by the table author.
    pub code: String,
    /// Replacement text; empty means "delete the code".
    pub replacement: String,
}

impl MappingEntry {
    pub fn key(&self) -> MappingKey {
        MappingKey::classify(&self.code)
    }
}

/// A station's mapping table.
///
/// Entries keep registration order. Inserting a code whose normalized form is
/// already present replaces the earlier entry in place, so the later rule wins
/// while the position stays deterministic.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    station_code: String,
    version: Option<String>,
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl MappingTable {
    pub fn new(station_code: impl Into<String>) -> Self {
        Self {
            station_code: station_code.into(),
            ..Self::default()
        }
    }

    /// Builds a table from `(code, replacement)` pairs in order.
    pub fn from_pairs<I, K, V>(station_code: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new(station_code);
        for (code, replacement) in pairs {
            table.insert(code, replacement);
        }
        table
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn station_code(&self) -> &str {
        &self.station_code
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds or replaces a rule. Blank codes are ignored.
    pub fn insert(&mut self, code: impl Into<String>, replacement: impl Into<String>) {
        let code = code.into();
        let normalized = normalize_code(&code);
        if normalized.is_empty() {
            return;
        }
        let entry = MappingEntry {
            code: code.trim().to_string(),
            replacement: replacement.into(),
        };
        match self.index.get(&normalized) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.index.insert(normalized, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Looks up the replacement stored for `code` (case-insensitive, exact keys only).
    pub fn get(&self, code: &str) -> Option<&str> {
        self.index
            .get(&normalize_code(code))
            .map(|&position| self.entries[position].replacement.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.index.contains_key(&normalize_code(code))
    }

    /// Applies every rule of `other` on top of this table.
    pub fn merge(&mut self, other: &MappingTable) {
        for entry in &other.entries {
            self.insert(entry.code.clone(), entry.replacement.clone());
        }
    }

    /// Returns the rules as a sorted map keyed by the stored code.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.code.clone(), entry.replacement.clone()))
            .collect()
    }
}

impl PartialEq for MappingTable {
    fn eq(&self, other: &Self) -> bool {
        self.station_code == other.station_code
            && self.version == other.version
            && self.entries == other.entries
    }
}

impl Eq for MappingTable {}
