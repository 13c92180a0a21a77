//! # Photograph metadata collaborators
//!
//! The pipeline never touches image files itself: it asks a [`MetadataReader`] for
//! capture times and hands coordinates to a [`MetadataWriter`]. Both calibration and
//! destination photographs go through the same reader, so they are parsed with the
//! same precision.
//!
//! [`exiftool::ExifTool`] implements both traits on top of the `exiftool` program.
pub mod exiftool;

use camino::Utf8Path;
use hifitime::Epoch;

use crate::georef_errors::GeorefError;
use crate::track::Coordinate;

/// Extracts the capture time of a photograph.
pub trait MetadataReader {
    /// Return
    /// ------
    /// * the capture time at sub-second precision, or
    ///   [`GeorefError::MetadataReadFailure`] when the tag is absent or unreadable
    fn read_capture_time(&self, path: &Utf8Path) -> Result<Epoch, GeorefError>;
}

/// Overwrites the location tags of a photograph in place.
pub trait MetadataWriter {
    fn write_location(&self, path: &Utf8Path, coordinate: &Coordinate) -> Result<(), GeorefError>;
}

impl<T: MetadataReader + ?Sized> MetadataReader for &T {
    fn read_capture_time(&self, path: &Utf8Path) -> Result<Epoch, GeorefError> {
        (**self).read_capture_time(path)
    }
}

impl<T: MetadataWriter + ?Sized> MetadataWriter for &T {
    fn write_location(&self, path: &Utf8Path, coordinate: &Coordinate) -> Result<(), GeorefError> {
        (**self).write_location(path, coordinate)
    }
}
