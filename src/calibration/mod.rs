//! # Camera clock calibration
//!
//! The camera and the GPS receiver keep independent clocks. Before a survey the camera
//! photographs a few waypoints whose GPS time is noted in a reference log; each such
//! photograph yields a [`CalibrationSample`]. [`estimate_clock_offset`] reduces those
//! samples to one [`ClockOffset`] which is then subtracted from every destination
//! capture time.
//!
//! ## Estimation
//! -----------------
//! * `d_i = camera_time_i − reference_time_i` for every sample,
//! * the offset is the arithmetic mean of the `d_i` (outlier calibration photographs
//!   are assumed absent; no robust statistic is used),
//! * the mean is quantized to the camera's reporting resolution (`step`), rounding
//!   to the **nearest** multiple of the step. Exact halves round away from zero.
//!
//! The quantization works on the exact rational mean `Σ d_i / n` in integer
//! nanoseconds, so no floating point rounding leaks into the offset.
//!
//! ## See also
//! ------------
//! * [`reference_log::CalibrationLog`] – reader for the `<photo>,<GPS time>` log.
//! * [`pair_calibration_samples`] – joins camera times with the reference log.
pub mod reference_log;

use std::collections::BTreeMap;
use std::fmt;

use hifitime::{Duration, Epoch};
use tracing::{debug, warn};

use crate::georef_errors::GeorefError;
use reference_log::CalibrationLog;

/// One calibration photograph: the camera's capture time and the GPS time of the
/// waypoint it shows.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSample {
    pub identifier: String,
    pub camera_time: Epoch,
    pub reference_time: Epoch,
}

impl CalibrationSample {
    pub fn new(identifier: impl Into<String>, camera_time: Epoch, reference_time: Epoch) -> Self {
        CalibrationSample {
            identifier: identifier.into(),
            camera_time,
            reference_time,
        }
    }

    /// Signed camera-minus-reference difference of this sample.
    pub fn difference(&self) -> Duration {
        self.camera_time - self.reference_time
    }
}

/// Systematic drift between the camera clock and the GPS clock.
///
/// A positive offset means the camera is ahead of the GPS receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockOffset {
    offset: Duration,
    step: Duration,
}

impl ClockOffset {
    pub fn new(offset: Duration, step: Duration) -> Self {
        ClockOffset { offset, step }
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Quantization step the offset was rounded to.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Map a raw camera capture time onto the GPS clock.
    pub fn correct(&self, camera_time: Epoch) -> Epoch {
        camera_time - self.offset
    }
}

impl fmt::Display for ClockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (step {})", self.offset, self.step)
    }
}

/// Integer division rounding to the nearest quotient, exact halves away from zero.
///
/// `denom` must be strictly positive.
fn div_round_half_away(numer: i128, denom: i128) -> i128 {
    if numer < 0 {
        return -div_round_half_away(-numer, denom);
    }
    let quotient = numer / denom;
    let remainder = numer % denom;
    if 2 * remainder >= denom {
        quotient + 1
    } else {
        quotient
    }
}

/// Estimate the camera clock offset from calibration samples.
///
/// Arguments
/// ---------
/// * `samples`: the paired calibration photographs
/// * `step`: the camera's minimum reportable time resolution (e.g. 100 ms)
///
/// Return
/// ------
/// * the mean camera-minus-reference difference rounded to the nearest multiple of `step`
///
/// Errors
/// ------
/// * [`GeorefError::InsufficientCalibrationData`] when `samples` is empty
/// * [`GeorefError::InvalidParameter`] when `step` is not strictly positive
pub fn estimate_clock_offset(
    samples: &[CalibrationSample],
    step: Duration,
) -> Result<ClockOffset, GeorefError> {
    let step_ns = step.total_nanoseconds();
    if step_ns <= 0 {
        return Err(GeorefError::InvalidParameter(format!(
            "quantization step must be > 0, got {step}"
        )));
    }
    if samples.is_empty() {
        return Err(GeorefError::InsufficientCalibrationData);
    }

    let sum_ns: i128 = samples
        .iter()
        .map(|sample| sample.difference().total_nanoseconds())
        .sum();
    let n = samples.len() as i128;

    let steps = div_round_half_away(sum_ns, n * step_ns);
    let offset = Duration::from_total_nanoseconds(steps * step_ns);

    debug!(
        samples = samples.len(),
        raw_mean_ns = (sum_ns / n) as i64,
        "clock offset quantized to {offset}"
    );

    Ok(ClockOffset::new(offset, step))
}

/// Join camera capture times with the reference log on the photo identifier.
///
/// Photographs missing from either side cannot be paired and are left out with a
/// warning. The returned samples are ordered by identifier.
pub fn pair_calibration_samples(
    camera_times: &BTreeMap<String, Epoch>,
    reference_log: &CalibrationLog,
) -> Vec<CalibrationSample> {
    let mut samples = Vec::with_capacity(camera_times.len());

    for (identifier, camera_time) in camera_times {
        match reference_log.get(identifier) {
            Some(reference_time) => samples.push(CalibrationSample::new(
                identifier.clone(),
                *camera_time,
                reference_time,
            )),
            None => warn!("Calibration photo {identifier} has no entry in the reference log"),
        }
    }

    for identifier in reference_log.identifiers() {
        if !camera_times.contains_key(identifier) {
            warn!("Reference log entry {identifier} has no readable calibration photo");
        }
    }

    samples
}
