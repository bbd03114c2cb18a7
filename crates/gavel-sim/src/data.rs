// Catalog and team data loading (JSON).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use gavel_core::auction::catalog::RawLotRecord;
use gavel_core::auction::participant::TeamDescriptor;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Set key -> athletes, ordered by key so iteration is stable.
pub type CatalogRecords = BTreeMap<String, Vec<RawLotRecord>>;

// ---------------------------------------------------------------------------
// Reader-based parsing
// ---------------------------------------------------------------------------

fn catalog_from_reader<R: Read>(rdr: R) -> Result<CatalogRecords, serde_json::Error> {
    serde_json::from_reader(rdr)
}

fn teams_from_reader<R: Read>(rdr: R) -> Result<Vec<TeamDescriptor>, serde_json::Error> {
    serde_json::from_reader(rdr)
}

// ---------------------------------------------------------------------------
// File-based loading
// ---------------------------------------------------------------------------

/// Load grouped athlete records from a JSON object of set key -> array.
pub fn load_catalog_records(path: &Path) -> Result<CatalogRecords, DataError> {
    let file = open(path)?;
    catalog_from_reader(file).map_err(|e| DataError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load team descriptors from a JSON array.
pub fn load_teams(path: &Path) -> Result<Vec<TeamDescriptor>, DataError> {
    let file = open(path)?;
    teams_from_reader(file).map_err(|e| DataError::Json {
        path: path.display().to_string(),
        source: e,
    })
}

fn open(path: &Path) -> Result<std::io::BufReader<std::fs::File>, DataError> {
    std::fs::File::open(path)
        .map(std::io::BufReader::new)
        .map_err(|e| DataError::Io {
            path: path.display().to_string(),
            source: e,
        })
}
