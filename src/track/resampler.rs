//! # Track resampling
//!
//! Rebuilds a uniformly sampled track from sparse, irregular GPS fixes.
//!
//! Grid
//! -----------------
//! `t_0` is the first fix, `t_k = t_0 + k·Δ`, and the grid stops at the last `t_k`
//! not later than the last fix. Grid times are computed from `t_0` for every `k`
//! (integer nanoseconds), so spacing is exactly `Δ`.
//!
//! Interpolation
//! -----------------
//! For a grid time between fixes `s` and `s+1`, longitude, latitude and elevation
//! are each interpolated linearly in time:
//!
//! ```text
//! v = v_s + (v_{s+1} − v_s) · (t − t_s) / (t_{s+1} − t_s)
//! ```
//!
//! This is a flat local approximation, adequate because `Δ` is small compared to
//! the curvature of the track; it is not a great-circle interpolation. A grid time
//! equal to a fix time returns that fix unchanged.
use hifitime::{Duration, Epoch};
use itertools::Itertools;
use tracing::info;

use super::TrackSample;
use crate::georef_errors::GeorefError;

/// A track sampled every `step`, covering the time span of its source fixes.
///
/// Always holds at least one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTrack {
    step: Duration,
    samples: Vec<TrackSample>,
}

impl DenseTrack {
    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn samples(&self) -> &[TrackSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> &TrackSample {
        &self.samples[0]
    }

    pub fn last(&self) -> &TrackSample {
        &self.samples[self.samples.len() - 1]
    }

    /// True when `time` lies within `[first, last]`.
    pub fn covers(&self, time: Epoch) -> bool {
        time >= self.first().time && time <= self.last().time
    }

    /// Grid sample closest to `time`, the earlier one on ties.
    ///
    /// Return
    /// ------
    /// * `None` when `time` is outside the covered interval
    pub fn nearest(&self, time: Epoch) -> Option<&TrackSample> {
        if !self.covers(time) {
            return None;
        }

        let elapsed = (time - self.first().time).total_nanoseconds();
        let step = self.step.total_nanoseconds();

        let mut index = elapsed / step;
        if 2 * (elapsed % step) > step {
            index += 1;
        }
        let index = (index as usize).min(self.samples.len() - 1);

        Some(&self.samples[index])
    }
}

fn interpolate(before: &TrackSample, after: &TrackSample, time: Epoch) -> TrackSample {
    let span = (after.time - before.time).total_nanoseconds() as f64;
    let fraction = (time - before.time).total_nanoseconds() as f64 / span;
    let lerp = |a: f64, b: f64| a + (b - a) * fraction;

    TrackSample {
        time,
        longitude: lerp(before.longitude, after.longitude),
        latitude: lerp(before.latitude, after.latitude),
        elevation: lerp(before.elevation, after.elevation),
    }
}

fn check_track(samples: &[TrackSample]) -> Result<(), GeorefError> {
    if samples.len() < 2 {
        return Err(GeorefError::DegenerateTrack(format!(
            "at least 2 samples are required, got {}",
            samples.len()
        )));
    }

    for (i, (a, b)) in samples.iter().tuple_windows().enumerate() {
        if b.time == a.time {
            return Err(GeorefError::DegenerateTrack(format!(
                "samples {i} and {} share the timestamp {}",
                i + 1,
                a.time
            )));
        }
        if b.time < a.time {
            return Err(GeorefError::DegenerateTrack(format!(
                "timestamps decrease between samples {i} and {}",
                i + 1
            )));
        }
    }

    Ok(())
}

/// Resample GPS fixes onto a uniform time grid.
///
/// Arguments
/// ---------
/// * `samples`: fixes with strictly increasing timestamps
/// * `step`: the grid interval Δ
///
/// Return
/// ------
/// * the [`DenseTrack`] covering `[samples[0].time, samples[n-1].time]`
///
/// Errors
/// ------
/// * [`GeorefError::DegenerateTrack`] with fewer than 2 samples or non increasing timestamps
/// * [`GeorefError::InvalidParameter`] when `step` is not strictly positive
pub fn resample_track(samples: &[TrackSample], step: Duration) -> Result<DenseTrack, GeorefError> {
    let step_ns = step.total_nanoseconds();
    if step_ns <= 0 {
        return Err(GeorefError::InvalidParameter(format!(
            "resampling interval must be > 0, got {step}"
        )));
    }
    check_track(samples)?;

    let first = samples[0].time;
    let last = samples[samples.len() - 1].time;
    let grid_len = (last - first).total_nanoseconds() / step_ns + 1;

    let mut dense = Vec::with_capacity(grid_len as usize);
    let mut s = 0;
    for k in 0..grid_len {
        let t = first + Duration::from_total_nanoseconds(k * step_ns);
        while samples[s + 1].time < t {
            s += 1;
        }

        let before = &samples[s];
        let after = &samples[s + 1];
        let sample = if t == before.time {
            *before
        } else if t == after.time {
            *after
        } else {
            interpolate(before, after, t)
        };
        dense.push(sample);
    }

    info!(
        "Resampled {} GPS fixes into {} points every {step}",
        samples.len(),
        dense.len()
    );

    Ok(DenseTrack {
        step,
        samples: dense,
    })
}
