//! # GPS track samples
//!
//! Raw fixes of the GPS receiver and the collaborator interface producing them.
//!
//! ## Overview
//! -----------------
//! * [`TrackSample`] – one fix: time, longitude, latitude, elevation.
//! * [`TrackParser`] – anything able to turn a track-log file into samples;
//!   [`gpx_reader::GpxReader`] is the implementation shipped with the crate.
//! * [`normalize_track`] – orders parsed samples by time and drops duplicated
//!   timestamps so that [`resampler::resample_track`] receives strictly increasing input.
//!
//! ## Units
//! -----------------
//! * longitude / latitude: decimal degrees (WGS84)
//! * elevation: meters
pub mod gpx_reader;
pub mod resampler;

use std::cmp::Ordering;

use camino::Utf8Path;
use hifitime::Epoch;
use tracing::warn;

use crate::georef_errors::GeorefError;

/// A position written into a photograph's location tags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
}

/// One GPS fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub time: Epoch,
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
}

impl TrackSample {
    pub fn new(time: Epoch, longitude: f64, latitude: f64, elevation: f64) -> Self {
        TrackSample {
            time,
            longitude,
            latitude,
            elevation,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            longitude: self.longitude,
            latitude: self.latitude,
            elevation: self.elevation,
        }
    }
}

/// Turns a track-log file into an ordered list of GPS fixes.
pub trait TrackParser {
    fn parse_track(&self, path: &Utf8Path) -> Result<Vec<TrackSample>, GeorefError>;
}

impl<T: TrackParser + ?Sized> TrackParser for &T {
    fn parse_track(&self, path: &Utf8Path) -> Result<Vec<TrackSample>, GeorefError> {
        (**self).parse_track(path)
    }
}

/// Sort samples by time and keep only the first sample of each timestamp.
///
/// The sort is stable, so "first" means first in file order. Every dropped sample
/// is reported with a warning.
pub fn normalize_track(mut samples: Vec<TrackSample>) -> Vec<TrackSample> {
    samples.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

    samples.dedup_by(|later, kept| {
        let duplicate = later.time == kept.time;
        if duplicate {
            warn!(
                "Dropping GPS fix ({}, {}) sharing the timestamp {} with an earlier fix",
                later.longitude, later.latitude, later.time
            );
        }
        duplicate
    });

    samples
}
