//! # georef
//!
//! Georeference photographs against a GPS track recorded by an independent receiver.
//!
//! The camera clock drifts away from GPS time, so capture times are first corrected by a
//! clock offset estimated from calibration photographs of waypoints with known GPS time.
//! The GPS fixes are resampled on a uniform time grid, and every corrected capture time
//! is placed on that grid to obtain the photograph's coordinate.
//!
//! ## Modules
//! -----------------
//! * [`calibration`] – clock offset estimation and the calibration reference log.
//! * [`track`] – GPS fixes, GPX reading and resampling on a uniform grid.
//! * [`matching`] – correction of capture times and matching on the dense track.
//! * [`metadata`] – metadata reader/writer interfaces and the `exiftool` implementation.
//! * [`pipeline`] – the complete run and its summary.
//! * [`params`] – run parameters.
//! * [`photo_files`] – image discovery.
//! * [`time`] – timestamp parsing and formatting.
pub mod calibration;
pub mod georef_errors;
pub mod matching;
pub mod metadata;
pub mod params;
pub mod photo_files;
pub mod pipeline;
pub mod time;
pub mod track;

pub use calibration::{estimate_clock_offset, CalibrationSample, ClockOffset};
pub use georef_errors::GeorefError;
pub use matching::{match_photos, PhotoRecord, PhotoSet};
pub use params::GeorefParams;
pub use pipeline::{Georeferencer, RunPaths, RunSummary};
pub use track::resampler::{resample_track, DenseTrack};
pub use track::{Coordinate, TrackSample};
