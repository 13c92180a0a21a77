//! # Photo to track matching
//!
//! Places destination photographs on the dense track.
//!
//! For every photograph:
//! 1. the raw camera time is corrected with the [`ClockOffset`]: `corrected = raw − offset`;
//! 2. a corrected time strictly outside the track's covered interval leaves the photograph
//!    unmatched (taken before the track started or after it ended);
//! 3. otherwise the grid sample nearest to the corrected time is selected, the earlier one
//!    on ties. Camera resolution and grid step are normally equal, so the corrected time
//!    usually falls exactly on a grid point.
//!
//! Photographs are keyed by identifier in a [`PhotoSet`]. Matching drains the candidate set
//! and moves each photograph into either the matched or the unmatched set, so an
//! identifier is matched at most once and the result does not depend on insertion order.
use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use tracing::debug;

use crate::calibration::ClockOffset;
use crate::georef_errors::GeorefError;
use crate::photo_files::photo_identifier;
use crate::track::resampler::DenseTrack;
use crate::track::{Coordinate, TrackSample};

/// A destination photograph flowing through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub identifier: String,
    pub path: Utf8PathBuf,
    pub camera_time: Epoch,
    pub corrected_time: Option<Epoch>,
    pub matched: Option<TrackSample>,
}

impl PhotoRecord {
    /// New record identified by the file name of `path`.
    pub fn new(path: &Utf8Path, camera_time: Epoch) -> Result<Self, GeorefError> {
        Ok(PhotoRecord {
            identifier: photo_identifier(path)?,
            path: path.to_path_buf(),
            camera_time,
            corrected_time: None,
            matched: None,
        })
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.matched.as_ref().map(TrackSample::coordinate)
    }
}

/// Photographs keyed by identifier.
pub type PhotoSet = BTreeMap<String, PhotoRecord>;

/// Result of [`match_photos`]: the two sets partition the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub matched: PhotoSet,
    /// Photographs whose corrected time falls outside the track.
    pub unmatched: PhotoSet,
}

/// Correct the capture times of `photos` and match them against `track`.
pub fn match_photos(photos: PhotoSet, offset: &ClockOffset, track: &DenseTrack) -> MatchOutcome {
    let mut candidates = photos;
    let mut outcome = MatchOutcome::default();

    while let Some((identifier, mut photo)) = candidates.pop_first() {
        let corrected = offset.correct(photo.camera_time);
        photo.corrected_time = Some(corrected);

        match track.nearest(corrected) {
            Some(sample) => {
                if sample.time != corrected {
                    debug!(
                        "{identifier}: no grid point at {corrected}, using nearest at {}",
                        sample.time
                    );
                }
                photo.matched = Some(*sample);
                outcome.matched.insert(identifier, photo);
            }
            None => {
                debug!("{identifier}: {corrected} is outside the GPS track");
                outcome.unmatched.insert(identifier, photo);
            }
        }
    }

    outcome
}
