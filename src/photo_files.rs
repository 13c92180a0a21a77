//! Image file recognition and discovery.
//!
//! A file is an image when the text after its last `.` is the configured raw suffix
//! or one of the derived-format suffixes. Matching is case-sensitive, and a file
//! without any `.` is never an image.
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::georef_errors::GeorefError;

/// Recognised image suffixes, without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSuffixes {
    pub raw: String,
    pub derived: Vec<String>,
}

impl Default for ImageSuffixes {
    fn default() -> Self {
        ImageSuffixes {
            raw: "NEF".into(),
            derived: ["jpg", "JPG", "jpeg", "tiff", "tif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ImageSuffixes {
    pub fn is_image(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, suffix)) => suffix == self.raw || self.derived.iter().any(|d| d == suffix),
            None => false,
        }
    }
}

/// List the image files of a directory, sorted by file name.
///
/// Sub-directories are not traversed.
pub fn discover_images(
    directory: &Utf8Path,
    suffixes: &ImageSuffixes,
) -> Result<Vec<Utf8PathBuf>, GeorefError> {
    let mut images = Vec::new();

    for entry in directory.read_dir_utf8()? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if suffixes.is_image(entry.file_name()) {
            images.push(entry.into_path());
        } else {
            debug!("Ignoring {}: not an image", entry.path());
        }
    }

    images.sort();
    Ok(images)
}

/// Identifier of a photograph: its file name.
pub fn photo_identifier(path: &Utf8Path) -> Result<String, GeorefError> {
    path.file_name()
        .map(str::to_string)
        .ok_or_else(|| GeorefError::Utf8PathError(format!("{path} has no file name")))
}

#[cfg(test)]
mod photo_files_test {
    use super::*;

    #[test]
    fn test_is_image() {
        let suffixes = ImageSuffixes::default();
        assert!(suffixes.is_image("DSC_0001.NEF"));
        assert!(suffixes.is_image("DSC_0001.tif"));
        assert!(suffixes.is_image("archive.2020.JPG"));
        assert!(!suffixes.is_image("DSC_0001.nef"));
        assert!(!suffixes.is_image("DSC_0001.TIF"));
        assert!(!suffixes.is_image("gps_times.csv"));
        assert!(!suffixes.is_image("README"));
    }

    #[test]
    fn test_discover_images() {
        let dir = std::env::temp_dir().join(format!("georef-discover-{}", std::process::id()));
        let dir = Utf8PathBuf::from_path_buf(dir).unwrap();
        std::fs::create_dir_all(dir.join("nested.tif")).unwrap();
        for name in ["b.tif", "a.NEF", "notes.txt", "noext"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let images = discover_images(&dir, &ImageSuffixes::default()).unwrap();
        assert_eq!(images, vec![dir.join("a.NEF"), dir.join("b.tif")]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_photo_identifier() {
        assert_eq!(
            photo_identifier(Utf8Path::new("TIF/DSC_0001.tif")).unwrap(),
            "DSC_0001.tif"
        );
        assert!(photo_identifier(Utf8Path::new("/")).is_err());
    }
}
