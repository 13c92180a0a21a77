//! # Georeferencing pipeline
//!
//! [`Georeferencer`] sequences the whole run:
//!
//! 1. read the capture time of every calibration and destination photograph through the
//!    [`MetadataReader`] (unreadable photographs are skipped and reported);
//! 2. pair calibration photographs with the reference log and estimate the
//!    [`ClockOffset`];
//! 3. parse the GPS track with the [`TrackParser`], normalise it and resample it;
//! 4. match the destination photographs on the dense track;
//! 5. export the coordinate table of the matched photographs;
//! 6. write the location tags of every matched photograph through the [`MetadataWriter`].
//!
//! Photographs are keyed by file name. A photograph whose name was already loaded is
//! skipped, and so is a destination photograph that served for calibration: neither
//! reaches the matcher.
//!
//! Steps 2 and 3 are fatal on failure ([`GeorefError::InsufficientCalibrationData`],
//! [`GeorefError::DegenerateTrack`]) and stop the run before any file is written.
//! Per-photograph failures of steps 1 and 6 are collected in the [`RunSummary`].
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, warn};

use crate::calibration::reference_log::CalibrationLog;
use crate::calibration::{estimate_clock_offset, pair_calibration_samples, ClockOffset};
use crate::georef_errors::GeorefError;
use crate::matching::{match_photos, MatchOutcome, PhotoRecord, PhotoSet};
use crate::metadata::{MetadataReader, MetadataWriter};
use crate::params::GeorefParams;
use crate::photo_files::discover_images;
use crate::time::format_timestamp;
use crate::track::resampler::resample_track;
use crate::track::{normalize_track, TrackParser};

const TABLE_HEADER: [&str; 5] = ["timestamp", "longitude", "latitude", "elevation", "photo"];

/// Input and output locations of a directory-based run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Directory holding the calibration photographs.
    pub calibration_dir: Utf8PathBuf,
    /// `<photo>,<GPS time>` reference log of the calibration photographs.
    pub reference_log: Utf8PathBuf,
    /// Directory holding the photographs to georeference.
    pub destination_dir: Utf8PathBuf,
    pub track_file: Utf8PathBuf,
    /// Coordinate table written for the matched photographs.
    pub table_out: Utf8PathBuf,
}

/// A photograph the run could not process.
#[derive(Debug, PartialEq)]
pub struct PhotoFailure {
    pub path: Utf8PathBuf,
    pub error: GeorefError,
}

/// Outcome of a completed run.
#[derive(Debug)]
pub struct RunSummary {
    pub clock_offset: ClockOffset,
    pub calibration_pairs: usize,
    pub dense_track_len: usize,
    pub matched: Vec<String>,
    /// Photographs taken outside the time span of the track.
    pub unmatched: Vec<String>,
    pub read_failures: Vec<PhotoFailure>,
    /// Photographs excluded before matching: repeated identifiers and calibration photographs.
    pub skipped: Vec<PhotoFailure>,
    pub write_failures: Vec<PhotoFailure>,
    pub written: usize,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.unmatched.is_empty()
            && self.read_failures.is_empty()
            && self.skipped.is_empty()
            && self.write_failures.is_empty()
    }

    /// Report the summary through `tracing`, one warning per failed photograph.
    pub fn log(&self) {
        for failure in self
            .read_failures
            .iter()
            .chain(&self.skipped)
            .chain(&self.write_failures)
        {
            warn!("{}", failure.error);
        }
        if !self.unmatched.is_empty() {
            warn!(
                "{} photos outside the GPS track: {}",
                self.unmatched.len(),
                self.unmatched.join(", ")
            );
        }
        info!("{self}");
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "clock offset {} from {} calibration photos | {} matched, {} written, \
             {} outside the track, {} unreadable, {} skipped, {} write failures",
            self.clock_offset.offset(),
            self.calibration_pairs,
            self.matched.len(),
            self.written,
            self.unmatched.len(),
            self.read_failures.len(),
            self.skipped.len(),
            self.write_failures.len()
        )
    }
}

/// Intermediate state after matching, before anything is written.
#[derive(Debug)]
pub struct MatchedRun {
    pub clock_offset: ClockOffset,
    pub calibration_pairs: usize,
    pub dense_track_len: usize,
    pub outcome: MatchOutcome,
    pub read_failures: Vec<PhotoFailure>,
    pub skipped: Vec<PhotoFailure>,
}

#[derive(Debug, Serialize)]
struct TableRow<'a> {
    timestamp: String,
    longitude: f64,
    latitude: f64,
    elevation: f64,
    photo: &'a str,
}

/// Write the coordinate table of the matched photographs, ordered by identifier.
///
/// The header is always written, even without any matched photograph.
///
/// Return
/// ------
/// * the number of data rows written
pub fn write_coordinate_table<Wr: Write>(matched: &PhotoSet, out: Wr) -> Result<usize, GeorefError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(TABLE_HEADER)?;

    let mut rows = 0;
    for photo in matched.values() {
        let Some(sample) = photo.matched else {
            continue;
        };
        writer.serialize(TableRow {
            timestamp: format_timestamp(sample.time),
            longitude: sample.longitude,
            latitude: sample.latitude,
            elevation: sample.elevation,
            photo: &photo.identifier,
        })?;
        rows += 1;
    }

    writer.flush()?;
    Ok(rows)
}

/// Key records by identifier, keeping the first record of each identifier.
///
/// Every later record sharing an identifier is reported in `skipped`.
fn index_photos(records: Vec<PhotoRecord>, skipped: &mut Vec<PhotoFailure>) -> PhotoSet {
    let mut photos = PhotoSet::new();
    for record in records {
        match photos.entry(record.identifier.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(kept) => {
                warn!(
                    "Skipping {}: {} is already loaded from {}",
                    record.path,
                    record.identifier,
                    kept.get().path
                );
                skipped.push(PhotoFailure {
                    path: record.path.clone(),
                    error: GeorefError::DuplicateIdentifier {
                        path: record.path,
                        identifier: record.identifier,
                    },
                });
            }
        }
    }
    photos
}

pub struct Georeferencer<R, W, T> {
    reader: R,
    writer: W,
    track_parser: T,
    params: GeorefParams,
}

impl<R, W, T> Georeferencer<R, W, T>
where
    R: MetadataReader,
    W: MetadataWriter,
    T: TrackParser,
{
    pub fn new(reader: R, writer: W, track_parser: T, params: GeorefParams) -> Self {
        Georeferencer {
            reader,
            writer,
            track_parser,
            params,
        }
    }

    pub fn params(&self) -> &GeorefParams {
        &self.params
    }

    /// Discover the photographs of both directories, load the reference log and run.
    pub fn run(&self, paths: &RunPaths) -> Result<RunSummary, GeorefError> {
        let calibration_photos = discover_images(&paths.calibration_dir, &self.params.suffixes)?;
        let destination_photos = discover_images(&paths.destination_dir, &self.params.suffixes)?;
        info!(
            "Found {} calibration and {} destination photos",
            calibration_photos.len(),
            destination_photos.len()
        );
        let reference_log = CalibrationLog::from_path(&paths.reference_log)?;

        self.run_photos(
            &calibration_photos,
            &reference_log,
            &destination_photos,
            &paths.track_file,
            &paths.table_out,
        )
    }

    /// Full run on explicit photograph lists.
    pub fn run_photos(
        &self,
        calibration_photos: &[Utf8PathBuf],
        reference_log: &CalibrationLog,
        destination_photos: &[Utf8PathBuf],
        track_file: &Utf8Path,
        table_out: &Utf8Path,
    ) -> Result<RunSummary, GeorefError> {
        let run = self.match_run(calibration_photos, reference_log, destination_photos, track_file)?;

        let table = BufWriter::new(File::create(table_out)?);
        let rows = write_coordinate_table(&run.outcome.matched, table)?;
        info!("Wrote {rows} coordinates to {table_out}");

        let (written, write_failures) = self.write_locations(&run.outcome.matched);

        let summary = RunSummary {
            clock_offset: run.clock_offset,
            calibration_pairs: run.calibration_pairs,
            dense_track_len: run.dense_track_len,
            matched: run.outcome.matched.keys().cloned().collect(),
            unmatched: run.outcome.unmatched.keys().cloned().collect(),
            read_failures: run.read_failures,
            skipped: run.skipped,
            write_failures,
            written,
        };
        summary.log();
        Ok(summary)
    }

    /// Steps 1 to 4: read capture times, estimate the offset, resample the track and match.
    ///
    /// Nothing is written to disk.
    pub fn match_run(
        &self,
        calibration_photos: &[Utf8PathBuf],
        reference_log: &CalibrationLog,
        destination_photos: &[Utf8PathBuf],
        track_file: &Utf8Path,
    ) -> Result<MatchedRun, GeorefError> {
        let mut read_failures = Vec::new();
        let mut skipped = Vec::new();

        info!("Getting camera timing metadata");
        let calibration_times =
            self.read_capture_times(calibration_photos, "calibration", &mut read_failures);
        let destination_times =
            self.read_capture_times(destination_photos, "destination", &mut read_failures);

        info!("Calculating clock difference");
        let camera_times: BTreeMap<String, Epoch> = index_photos(calibration_times, &mut skipped)
            .into_iter()
            .map(|(identifier, photo)| (identifier, photo.camera_time))
            .collect();
        let samples = pair_calibration_samples(&camera_times, reference_log);
        let clock_offset = estimate_clock_offset(&samples, self.params.quantization_step)?;
        info!("Camera clock offset: {clock_offset}");

        info!("Loading GPS track {track_file}");
        let track = normalize_track(self.track_parser.parse_track(track_file)?);
        let dense = resample_track(&track, self.params.resample_interval)?;

        let mut photos = index_photos(destination_times, &mut skipped);
        let calibration_ids: BTreeSet<&str> = samples.iter().map(|s| s.identifier.as_str()).collect();
        photos.retain(|identifier, photo| {
            if !calibration_ids.contains(identifier.as_str()) {
                return true;
            }
            warn!("Skipping {}: used for the clock calibration", photo.path);
            skipped.push(PhotoFailure {
                path: photo.path.clone(),
                error: GeorefError::CalibrationPhoto {
                    path: photo.path.clone(),
                    identifier: identifier.clone(),
                },
            });
            false
        });

        let outcome = match_photos(photos, &clock_offset, &dense);
        info!(
            "Matched {} photos, {} outside the track",
            outcome.matched.len(),
            outcome.unmatched.len()
        );

        Ok(MatchedRun {
            clock_offset,
            calibration_pairs: samples.len(),
            dense_track_len: dense.len(),
            outcome,
            read_failures,
            skipped,
        })
    }

    fn progress_bar(&self, len: usize, label: &str) -> ProgressBar {
        if !self.params.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{msg:<12} {bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(label.to_string());
        pb
    }

    fn read_capture_times(
        &self,
        paths: &[Utf8PathBuf],
        label: &str,
        failures: &mut Vec<PhotoFailure>,
    ) -> Vec<PhotoRecord> {
        let pb = self.progress_bar(paths.len(), label);
        let mut records = Vec::with_capacity(paths.len());

        for path in paths {
            let record = self
                .reader
                .read_capture_time(path)
                .and_then(|time| PhotoRecord::new(path, time));
            match record {
                Ok(record) => records.push(record),
                Err(error) => {
                    warn!("Skipping {path}: {error}");
                    failures.push(PhotoFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        records
    }

    fn write_locations(&self, matched: &PhotoSet) -> (usize, Vec<PhotoFailure>) {
        info!("Georeferencing images");
        let pb = self.progress_bar(matched.len(), "georeference");
        let mut written = 0;
        let mut failures = Vec::new();

        for photo in matched.values() {
            let Some(coordinate) = photo.coordinate() else {
                continue;
            };
            match self.writer.write_location(&photo.path, &coordinate) {
                Ok(()) => written += 1,
                Err(error) => failures.push(PhotoFailure {
                    path: photo.path.clone(),
                    error,
                }),
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        (written, failures)
    }
}
