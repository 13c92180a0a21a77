use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeorefError {
    #[error("No calibration pairs available: the clock offset cannot be estimated")]
    InsufficientCalibrationData,

    #[error("Degenerate GPS track: {0}")]
    DegenerateTrack(String),

    #[error("Unable to read the capture time of {path}: {reason}")]
    MetadataReadFailure { path: Utf8PathBuf, reason: String },

    #[error("Unable to write the location tags of {path}: {reason}")]
    MetadataWriteFailure { path: Utf8PathBuf, reason: String },

    #[error("{path} shares the identifier {identifier} with a photograph already loaded")]
    DuplicateIdentifier {
        path: Utf8PathBuf,
        identifier: String,
    },

    #[error("{path} is the calibration photograph {identifier}, it is not georeferenced")]
    CalibrationPhoto {
        path: Utf8PathBuf,
        identifier: String,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid calibration log record: {0}")]
    CalibrationLogParse(String),

    #[error("Error during the GPS track parsing: {0}")]
    TrackParse(String),

    #[error("Invalid georeferencing parameter: {0}")]
    InvalidParameter(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),
}

impl PartialEq for GeorefError {
    fn eq(&self, other: &Self) -> bool {
        use GeorefError::*;
        match (self, other) {
            (InsufficientCalibrationData, InsufficientCalibrationData) => true,
            (DegenerateTrack(a), DegenerateTrack(b)) => a == b,
            (
                MetadataReadFailure {
                    path: pa,
                    reason: ra,
                },
                MetadataReadFailure {
                    path: pb,
                    reason: rb,
                },
            ) => pa == pb && ra == rb,
            (
                MetadataWriteFailure {
                    path: pa,
                    reason: ra,
                },
                MetadataWriteFailure {
                    path: pb,
                    reason: rb,
                },
            ) => pa == pb && ra == rb,
            (
                DuplicateIdentifier {
                    path: pa,
                    identifier: ia,
                },
                DuplicateIdentifier {
                    path: pb,
                    identifier: ib,
                },
            ) => pa == pb && ia == ib,
            (
                CalibrationPhoto {
                    path: pa,
                    identifier: ia,
                },
                CalibrationPhoto {
                    path: pb,
                    identifier: ib,
                },
            ) => pa == pb && ia == ib,
            (InvalidTimestamp(a), InvalidTimestamp(b)) => a == b,
            (CalibrationLogParse(a), CalibrationLogParse(b)) => a == b,
            (TrackParse(a), TrackParse(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            // Not comparable: same variant means equal
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}

impl GeorefError {
    /// True for the errors that abort a whole run rather than a single photograph.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            GeorefError::MetadataReadFailure { .. }
                | GeorefError::MetadataWriteFailure { .. }
                | GeorefError::DuplicateIdentifier { .. }
                | GeorefError::CalibrationPhoto { .. }
        )
    }
}
