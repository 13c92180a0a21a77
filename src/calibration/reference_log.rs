//! Reader for the calibration reference log.
//!
//! The log is a header-less CSV file with one record per calibration photograph:
//!
//! ```text
//! DSC_0001.NEF,2020-07-15 14:56:32
//! DSC_0002.NEF,2020-07-15 14:58:10
//! ```
//!
//! The first field is the photograph's file name, the second the GPS time of the
//! photographed waypoint at second precision.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use hifitime::Epoch;
use serde::Deserialize;
use tracing::warn;

use crate::georef_errors::GeorefError;
use crate::time::parse_reference_timestamp;

#[derive(Debug, Deserialize)]
struct LogRecord {
    photo: String,
    reference_time: String,
}

/// Reference GPS times keyed by photo identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationLog {
    entries: BTreeMap<String, Epoch>,
}

impl CalibrationLog {
    /// Parse a reference log from any reader.
    ///
    /// A repeated identifier keeps its last entry.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GeorefError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = BTreeMap::new();
        for record in csv_reader.deserialize::<LogRecord>() {
            let record = record.map_err(|e| GeorefError::CalibrationLogParse(e.to_string()))?;
            let reference_time = parse_reference_timestamp(&record.reference_time).map_err(|e| {
                GeorefError::CalibrationLogParse(format!("{},{}: {e}", record.photo, record.reference_time))
            })?;

            if entries.insert(record.photo.clone(), reference_time).is_some() {
                warn!(
                    "Reference log lists {} more than once, keeping the last entry",
                    record.photo
                );
            }
        }

        Ok(CalibrationLog { entries })
    }

    pub fn from_path(path: &Utf8Path) -> Result<Self, GeorefError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn get(&self, identifier: &str) -> Option<Epoch> {
        self.entries.get(identifier).copied()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
