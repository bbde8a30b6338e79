//! Mapping Repository for persisting station mapping tables.
//!
//! This module provides a file-system based repository for storing and
//! retrieving versioned station mapping tables. Every save writes a full
//! snapshot; a transform only ever sees one complete, immutable table.
//!
//! # Storage Format
//!
//! Each station owns a directory:
//! `{base_dir}/{STATION}/{version}.json` for every saved version and
//! `{base_dir}/{STATION}/latest.json` for the current one.
//!
//! ```json
//! {
//!   "_meta": { "version": "20250101_120000", "station": "HAN", ... },
//!   "mappings": { "B1": "NP", "OT": "" }
//! }
//! ```
//!
//! A legacy flat `{ "B1": "NP" }` object is accepted on load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use roster_model::{GLOBAL_STATION, MappingTable};

use crate::error::{MappingError, Result};

const LATEST_FILE: &str = "latest.json";

/// Metadata stored with every mapping version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingMeta {
    pub version: String,
    pub station: String,
    /// Local timestamp (ISO 8601).
    pub created_at: String,
    pub created_by: Option<String>,
    pub entry_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingDocument {
    #[serde(rename = "_meta")]
    meta: MappingMeta,
    mappings: BTreeMap<String, String>,
}

/// Summary of a station's current table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationSummary {
    pub station: String,
    pub version: Option<String>,
    pub entry_count: usize,
    pub created_at: Option<String>,
}

/// Repository for storing and retrieving station mapping tables.
#[derive(Debug, Clone)]
pub struct MappingRepository {
    /// Base directory for storing mapping files.
    base_dir: PathBuf,
}

impl MappingRepository {
    /// Create a new mapping repository at the given directory.
    ///
    /// The directory will be created if it doesn't exist.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Get the base directory of this repository.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Save a table as a new version and make it the latest.
    ///
    /// With `replace == false` the table is applied on top of the current
    /// latest table (later rules win) and the merged result is stored.
    pub fn save(
        &self,
        table: &MappingTable,
        replace: bool,
        created_by: Option<&str>,
    ) -> Result<MappingMeta> {
        let station = normalize_station(table.station_code())?;
        let station_dir = self.base_dir.join(&station);
        fs::create_dir_all(&station_dir)?;

        let mut effective = MappingTable::new(station.clone());
        if !replace && let Some(existing) = self.load(&station, None)? {
            effective.merge(&existing);
        }
        effective.merge(table);

        let now = Local::now();
        let version = unique_version(&station_dir, &now.format("%Y%m%d_%H%M%S").to_string());
        let document = MappingDocument {
            meta: MappingMeta {
                version: version.clone(),
                station: station.clone(),
                created_at: now.to_rfc3339(),
                created_by: created_by.map(str::to_string),
                entry_count: effective.entry_count(),
            },
            mappings: effective.to_map(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(station_dir.join(format!("{version}.json")), &json)?;
        fs::write(station_dir.join(LATEST_FILE), &json)?;

        info!(
            station = %station,
            version = %version,
            entry_count = document.meta.entry_count,
            replace,
            "mapping saved"
        );
        Ok(document.meta)
    }

    /// Load a station's table; `version == None` loads the latest.
    ///
    /// Returns `None` if the station has no latest table. A missing explicit
    /// version is an error.
    pub fn load(&self, station: &str, version: Option<&str>) -> Result<Option<MappingTable>> {
        let station = normalize_station(station)?;
        let station_dir = self.base_dir.join(&station);
        let path = match version {
            Some(version) => {
                let path = station_dir.join(format!("{version}.json"));
                if !path.is_file() {
                    return Err(MappingError::VersionNotFound {
                        station,
                        version: version.to_string(),
                    });
                }
                path
            }
            None => station_dir.join(LATEST_FILE),
        };
        if !path.is_file() {
            return Ok(None);
        }
        let (meta, mappings) = read_document(&path)?;
        let mut table = MappingTable::from_pairs(station, mappings);
        if let Some(meta) = meta {
            table = table.with_version(meta.version);
        }
        Ok(Some(table))
    }

    /// Load the table a transform should use for `station`.
    ///
    /// Falls back to the `global` table, then to an empty table.
    pub fn load_effective(&self, station: &str) -> Result<MappingTable> {
        if let Some(table) = self.load(station, None)? {
            return Ok(table);
        }
        let normalized = normalize_station(station)?;
        if normalized != GLOBAL_STATION {
            warn!(station = %normalized, "station mappings not found, using global");
            if let Some(global) = self.load(GLOBAL_STATION, None)? {
                let mut table = MappingTable::new(normalized);
                table.merge(&global);
                return Ok(match global.version() {
                    Some(version) => table.with_version(version),
                    None => table,
                });
            }
        }
        warn!(station = %normalized, "no mappings found");
        Ok(MappingTable::new(normalized))
    }

    /// List every station that has a latest table, sorted by station code.
    pub fn list_stations(&self) -> Result<Vec<StationSummary>> {
        let mut stations = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            let latest = path.join(LATEST_FILE);
            if !path.is_dir() || !latest.is_file() {
                continue;
            }
            let station = entry.file_name().to_string_lossy().into_owned();
            match read_document(&latest) {
                Ok((meta, mappings)) => stations.push(StationSummary {
                    station,
                    version: meta.as_ref().map(|m| m.version.clone()),
                    entry_count: mappings.len(),
                    created_at: meta.map(|m| m.created_at),
                }),
                Err(error) => {
                    warn!(path = %latest.display(), %error, "skipping unreadable mapping");
                }
            }
        }
        stations.sort_by(|a, b| a.station.cmp(&b.station));
        Ok(stations)
    }

    /// List stored versions of a station, newest first.
    pub fn list_versions(&self, station: &str) -> Result<Vec<MappingMeta>> {
        let station = normalize_station(station)?;
        let station_dir = self.base_dir.join(&station);
        if !station_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&station_dir)? {
            let path = entry?.path();
            let is_json = path.extension().is_some_and(|ext| ext == "json");
            let is_latest = path.file_name().is_some_and(|name| name == LATEST_FILE);
            if !path.is_file() || !is_json || is_latest {
                continue;
            }
            let Ok((meta, mappings)) = read_document(&path) else {
                continue;
            };
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            versions.push(meta.unwrap_or_else(|| MappingMeta {
                version: stem,
                station: station.clone(),
                created_at: String::new(),
                created_by: None,
                entry_count: mappings.len(),
            }));
        }
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    /// Check if a station has a latest table.
    pub fn exists(&self, station: &str) -> bool {
        normalize_station(station)
            .map(|station| self.base_dir.join(station).join(LATEST_FILE).is_file())
            .unwrap_or(false)
    }

    /// Delete one version, or the whole station when `version` is `None`.
    pub fn delete(&self, station: &str, version: Option<&str>) -> Result<bool> {
        let station = normalize_station(station)?;
        let station_dir = self.base_dir.join(&station);
        match version {
            Some(version) => {
                let path = station_dir.join(format!("{version}.json"));
                if !path.is_file() {
                    return Ok(false);
                }
                fs::remove_file(&path)?;
                info!(station = %station, version, "mapping version deleted");
                Ok(true)
            }
            None => {
                if !station_dir.is_dir() {
                    return Ok(false);
                }
                fs::remove_dir_all(&station_dir)?;
                warn!(station = %station, "all mappings deleted");
                Ok(true)
            }
        }
    }
}

/// Normalize a station code for use as a directory name.
///
/// `global` stays lower-case; other stations are upper-cased.
pub fn normalize_station(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(MappingError::InvalidStation(raw.to_string()));
    }
    if trimmed.eq_ignore_ascii_case(GLOBAL_STATION) {
        Ok(GLOBAL_STATION.to_string())
    } else {
        Ok(trimmed.to_uppercase())
    }
}

fn unique_version(station_dir: &Path, base: &str) -> String {
    let mut candidate = base.to_string();
    let mut counter = 1;
    while station_dir.join(format!("{candidate}.json")).exists() {
        candidate = format!("{base}_{counter}");
        counter += 1;
    }
    candidate
}

type Document = (Option<MappingMeta>, Vec<(String, String)>);

fn read_document(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    parse_document(path, value)
}

/// Parse a mapping document, accepting both the `_meta`/`mappings` layout
/// and a legacy flat object.
pub(crate) fn parse_document(path: &Path, value: Value) -> Result<Document> {
    let malformed = |message: &str| MappingError::Malformed {
        path: path.to_path_buf(),
        message: message.to_string(),
    };
    let Value::Object(mut object) = value else {
        return Err(malformed("expected a JSON object"));
    };
    let meta = match object.remove("_meta") {
        Some(meta) => Some(serde_json::from_value::<MappingMeta>(meta)?),
        None => None,
    };
    let mappings = match object.remove("mappings") {
        Some(Value::Object(mappings)) => mappings,
        Some(_) => return Err(malformed("\"mappings\" must be an object")),
        // Flat layout; `_`-prefixed keys are annotations.
        None if meta.is_none() => object
            .into_iter()
            .filter(|(code, _)| !code.starts_with('_'))
            .collect(),
        None => return Err(malformed("missing \"mappings\"")),
    };
    let mut pairs = Vec::with_capacity(mappings.len());
    for (code, replacement) in mappings {
        let replacement = match replacement {
            Value::String(text) => text,
            Value::Null => String::new(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(malformed(&format!("value for '{code}' is not a string")));
            }
        };
        pairs.push((code, replacement));
    }
    Ok((meta, pairs))
}
