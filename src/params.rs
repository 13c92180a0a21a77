//! # Georeferencing run parameters
//!
//! [`GeorefParams`] gathers the numerical and file-selection settings of a run.
//! Defaults reproduce the survey setup the tool was written for: a camera reporting
//! capture times to the tenth of a second, a track resampled at 10 Hz, Nikon raw
//! files plus their exported derivatives.
//!
//! Parameters are either taken as-is with [`GeorefParams::default`] or customised
//! through [`GeorefParams::builder`], whose `build` step validates them.
use std::fmt;

use hifitime::Duration;

use crate::georef_errors::GeorefError;
use crate::photo_files::ImageSuffixes;
use crate::time::millis;

/// Settings of a georeferencing run.
///
/// Fields
/// -----------------
/// * `quantization_step`: minimum reportable resolution of the camera clock; the
///   clock offset is rounded to a multiple of it. Default: 100 ms.
/// * `resample_interval`: spacing Δ of the dense track grid. Default: 100 ms.
/// * `suffixes`: file suffixes recognised as images.
/// * `show_progress`: draw a progress bar while reading and writing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeorefParams {
    pub quantization_step: Duration,
    pub resample_interval: Duration,
    pub suffixes: ImageSuffixes,
    pub show_progress: bool,
}

impl Default for GeorefParams {
    fn default() -> Self {
        GeorefParams {
            quantization_step: millis(100),
            resample_interval: millis(100),
            suffixes: ImageSuffixes::default(),
            show_progress: false,
        }
    }
}

impl GeorefParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a [`GeorefParamsBuilder`] from the default values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use georef::params::GeorefParams;
    /// use georef::time::millis;
    ///
    /// let params = GeorefParams::builder()
    ///     .quantization_step(millis(10))
    ///     .resample_interval(millis(10))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(params.resample_interval, millis(10));
    /// ```
    pub fn builder() -> GeorefParamsBuilder {
        GeorefParamsBuilder::new()
    }
}

/// Builder for [`GeorefParams`], with validation.
#[derive(Debug, Clone)]
pub struct GeorefParamsBuilder {
    params: GeorefParams,
}

impl Default for GeorefParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeorefParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: GeorefParams::default(),
        }
    }

    pub fn quantization_step(mut self, v: Duration) -> Self {
        self.params.quantization_step = v;
        self
    }
    pub fn resample_interval(mut self, v: Duration) -> Self {
        self.params.resample_interval = v;
        self
    }
    pub fn raw_suffix(mut self, v: impl Into<String>) -> Self {
        self.params.suffixes.raw = v.into();
        self
    }
    pub fn derived_suffixes<I, S>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.suffixes.derived = v.into_iter().map(Into::into).collect();
        self
    }
    pub fn show_progress(mut self, v: bool) -> Self {
        self.params.show_progress = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Errors
    /// -----------------
    /// * [`GeorefError::InvalidParameter`] when a duration is not strictly positive or a
    ///   suffix is empty or contains a dot.
    pub fn build(self) -> Result<GeorefParams, GeorefError> {
        let p = &self.params;

        if p.quantization_step <= Duration::ZERO {
            return Err(GeorefError::InvalidParameter(
                "quantization_step must be > 0".into(),
            ));
        }
        if p.resample_interval <= Duration::ZERO {
            return Err(GeorefError::InvalidParameter(
                "resample_interval must be > 0".into(),
            ));
        }

        let bad_suffix = std::iter::once(&p.suffixes.raw)
            .chain(p.suffixes.derived.iter())
            .find(|s| s.is_empty() || s.contains('.'));
        if let Some(suffix) = bad_suffix {
            return Err(GeorefError::InvalidParameter(format!(
                "image suffix '{suffix}' must be non-empty and without '.'"
            )));
        }

        Ok(self.params)
    }
}

impl fmt::Display for GeorefParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Georeferencing parameters")?;
        writeln!(f, "  quantization_step = {}", self.quantization_step)?;
        writeln!(f, "  resample_interval = {}", self.resample_interval)?;
        writeln!(f, "  raw_suffix        = {}", self.suffixes.raw)?;
        writeln!(f, "  derived_suffixes  = {}", self.suffixes.derived.join(", "))?;
        write!(f, "  show_progress     = {}", self.show_progress)
    }
}

#[cfg(test)]
mod params_test {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = GeorefParams::default();
        assert_eq!(params.quantization_step, millis(100));
        assert_eq!(params.resample_interval, millis(100));
        assert_eq!(params.suffixes.raw, "NEF");
        assert_eq!(GeorefParams::builder().build().unwrap(), params);
    }

    #[test]
    fn test_builder_rejects_invalid_values() {
        assert!(matches!(
            GeorefParams::builder().quantization_step(millis(0)).build(),
            Err(GeorefError::InvalidParameter(_))
        ));
        assert!(matches!(
            GeorefParams::builder().resample_interval(millis(-5)).build(),
            Err(GeorefError::InvalidParameter(_))
        ));
        assert!(matches!(
            GeorefParams::builder().raw_suffix(".NEF").build(),
            Err(GeorefError::InvalidParameter(_))
        ));
        assert!(matches!(
            GeorefParams::builder().derived_suffixes(["tif", ""]).build(),
            Err(GeorefError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_display() {
        let text = GeorefParams::default().to_string();
        assert!(text.contains("raw_suffix        = NEF"));
        assert!(text.contains("jpg, JPG, jpeg, tiff, tif"));
    }
}
