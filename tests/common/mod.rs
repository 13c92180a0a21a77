#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use georef::metadata::{MetadataReader, MetadataWriter};
use georef::time::millis;
use georef::track::TrackParser;
use georef::{Coordinate, GeorefError, TrackSample};
use hifitime::Epoch;

/// Start of the test survey.
pub fn t0() -> Epoch {
    Epoch::from_gregorian_utc(2020, 7, 15, 14, 0, 0, 0)
}

pub fn at(ms: i64) -> Epoch {
    t0() + millis(ms)
}

/// Capture times served from memory.
#[derive(Default)]
pub struct FakeReader {
    pub times: HashMap<Utf8PathBuf, Epoch>,
}

impl FakeReader {
    pub fn with(mut self, path: &str, time: Epoch) -> Self {
        self.times.insert(Utf8PathBuf::from(path), time);
        self
    }
}

impl MetadataReader for FakeReader {
    fn read_capture_time(&self, path: &Utf8Path) -> Result<Epoch, GeorefError> {
        self.times
            .get(path)
            .copied()
            .ok_or_else(|| GeorefError::MetadataReadFailure {
                path: path.to_path_buf(),
                reason: "CreateDate tag absent".into(),
            })
    }
}

/// Records every location write; paths listed in `failing` are rejected.
#[derive(Default)]
pub struct RecordingWriter {
    pub written: RefCell<Vec<(Utf8PathBuf, Coordinate)>>,
    pub failing: Vec<Utf8PathBuf>,
}

impl MetadataWriter for RecordingWriter {
    fn write_location(&self, path: &Utf8Path, coordinate: &Coordinate) -> Result<(), GeorefError> {
        if self.failing.iter().any(|p| p == path) {
            return Err(GeorefError::MetadataWriteFailure {
                path: path.to_path_buf(),
                reason: "read-only file".into(),
            });
        }
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), *coordinate));
        Ok(())
    }
}

/// Track parser returning fixed samples whatever the path.
pub struct StaticTrack(pub Vec<TrackSample>);

impl TrackParser for StaticTrack {
    fn parse_track(&self, _path: &Utf8Path) -> Result<Vec<TrackSample>, GeorefError> {
        Ok(self.0.clone())
    }
}

/// A unique scratch file path in the system temporary directory.
pub fn scratch_path(name: &str) -> Utf8PathBuf {
    let path = std::env::temp_dir().join(format!("georef-{}-{name}", std::process::id()));
    Utf8PathBuf::from_path_buf(path).expect("temporary directory is not UTF-8")
}

pub fn paths(names: &[&str]) -> Vec<Utf8PathBuf> {
    names.iter().map(Utf8PathBuf::from).collect()
}
