//! `exiftool`-backed metadata reader and writer.
//!
//! The program is spawned with an argument vector, never through a shell, so file
//! names are passed verbatim whatever characters they contain.
//!
//! Reading
//! -----------------
//! `exiftool -s3 -SubSecCreateDate -CreateDate <file>` prints the values of the
//! requested tags, one per line, in request order. The first line parsing as a
//! camera timestamp (`YYYY:MM:DD HH:MM:SS[.f]`, optionally followed by a zone that is
//! ignored) wins, so the sub-second composite tag is preferred over the plain
//! `CreateDate`.
//!
//! Writing
//! -----------------
//! Longitude, latitude and altitude are written to the EXIF GPS tags together with
//! fixed hemisphere references (east and north unless configured otherwise), and the
//! original file is overwritten.
use std::process::{Command, Output};

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use tracing::debug;

use super::{MetadataReader, MetadataWriter};
use crate::georef_errors::GeorefError;
use crate::time::parse_camera_timestamp;
use crate::track::Coordinate;

const CAPTURE_TIME_TAGS: [&str; 2] = ["-SubSecCreateDate", "-CreateDate"];

/// Hemisphere references written next to the coordinates.
///
/// They are a deployment setting, not derived from the coordinate signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HemisphereRefs {
    pub longitude: String,
    pub latitude: String,
}

impl Default for HemisphereRefs {
    fn default() -> Self {
        HemisphereRefs {
            longitude: "East".into(),
            latitude: "North".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExifTool {
    program: Utf8PathBuf,
    hemispheres: HemisphereRefs,
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl ExifTool {
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        ExifTool {
            program: program.into(),
            hemispheres: HemisphereRefs::default(),
        }
    }

    pub fn with_hemispheres(mut self, hemispheres: HemisphereRefs) -> Self {
        self.hemispheres = hemispheres;
        self
    }

    fn run(&self, args: &[String], path: &Utf8Path) -> std::io::Result<Output> {
        Command::new(self.program.as_std_path())
            .args(args)
            .arg(path.as_std_path())
            .output()
    }

    fn write_args(&self, coordinate: &Coordinate) -> Vec<String> {
        vec![
            format!("-EXIF:GPSLongitude={}", coordinate.longitude),
            format!("-EXIF:GPSLatitude={}", coordinate.latitude),
            format!("-EXIF:GPSAltitude={}", coordinate.elevation),
            format!("-GPSLongitudeRef={}", self.hemispheres.longitude),
            format!("-GPSLatitudeRef={}", self.hemispheres.latitude),
            "-overwrite_original".into(),
        ]
    }
}

/// First capture time found in the `-s3` output of exiftool.
fn capture_time_from_output(stdout: &str) -> Option<Epoch> {
    stdout.lines().find_map(|line| match parse_camera_timestamp(line) {
        Ok(time) => Some(time),
        Err(e) => {
            debug!("Ignoring capture time tag: {e}");
            None
        }
    })
}

fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exiftool exited with {}", output.status)
    } else {
        stderr.to_string()
    }
}

impl MetadataReader for ExifTool {
    fn read_capture_time(&self, path: &Utf8Path) -> Result<Epoch, GeorefError> {
        let read_failure = |reason: String| GeorefError::MetadataReadFailure {
            path: path.to_path_buf(),
            reason,
        };

        let mut args = vec!["-s3".to_string()];
        args.extend(CAPTURE_TIME_TAGS.iter().map(|tag| tag.to_string()));

        let output = self.run(&args, path).map_err(|e| read_failure(e.to_string()))?;
        if !output.status.success() {
            return Err(read_failure(failure_reason(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let time = capture_time_from_output(&stdout)
            .ok_or_else(|| read_failure("no capture time tag found".into()))?;
        debug!("{path}: captured at {time}");
        Ok(time)
    }
}

impl MetadataWriter for ExifTool {
    fn write_location(&self, path: &Utf8Path, coordinate: &Coordinate) -> Result<(), GeorefError> {
        let write_failure = |reason: String| GeorefError::MetadataWriteFailure {
            path: path.to_path_buf(),
            reason,
        };

        let output = self
            .run(&self.write_args(coordinate), path)
            .map_err(|e| write_failure(e.to_string()))?;
        if !output.status.success() {
            return Err(write_failure(failure_reason(&output)));
        }
        Ok(())
    }
}
