//! GPX 1.1 track reader.
//!
//! Every `<trkpt>` of every `<trkseg>` of every `<trk>` becomes a [`TrackSample`].
//! Waypoints, routes, metadata and extensions are ignored. A point without a
//! `<time>` child cannot be placed on the track and is skipped with a warning.
//!
//! A point without an `<ele>` child keeps its position. Its elevation is
//! interpolated linearly in time between the nearest earlier and later points
//! carrying one, or copied from the only side available at the ends of the track.
use std::cmp::Ordering;

use camino::Utf8Path;
use hifitime::Epoch;
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{TrackParser, TrackSample};
use crate::georef_errors::GeorefError;
use crate::time::parse_gpx_timestamp;

#[derive(Debug, Deserialize)]
struct Gpx {
    #[serde(rename = "trk", default)]
    tracks: Vec<Trk>,
}

#[derive(Debug, Deserialize)]
struct Trk {
    #[serde(rename = "trkseg", default)]
    segments: Vec<TrkSeg>,
}

#[derive(Debug, Deserialize)]
struct TrkSeg {
    #[serde(rename = "trkpt", default)]
    points: Vec<TrkPt>,
}

#[derive(Debug, Deserialize)]
struct TrkPt {
    #[serde(rename = "@lat")]
    lat: f64,
    #[serde(rename = "@lon")]
    lon: f64,
    ele: Option<f64>,
    time: Option<String>,
}

/// [`TrackParser`] for GPX files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxReader;

impl GpxReader {
    /// Parse the content of a GPX document.
    ///
    /// Samples are returned in document order.
    pub fn parse_str(&self, xml: &str) -> Result<Vec<TrackSample>, GeorefError> {
        let gpx: Gpx = from_str(xml).map_err(|e| GeorefError::TrackParse(e.to_string()))?;

        let mut fixes = Vec::new();
        let mut skipped = 0usize;

        let points = gpx
            .tracks
            .into_iter()
            .flat_map(|trk| trk.segments)
            .flat_map(|seg| seg.points);

        for point in points {
            let Some(time) = point.time.as_deref() else {
                skipped += 1;
                continue;
            };
            let time = parse_gpx_timestamp(time)?;
            fixes.push((TrackSample::new(time, point.lon, point.lat, 0.0), point.ele));
        }

        if skipped > 0 {
            warn!("Skipped {skipped} GPX track points without time");
        }

        let samples = fill_elevations(fixes)?;
        debug!("Read {} GPX track points", samples.len());

        Ok(samples)
    }
}

/// Resolve the elevation of every fix, interpolating the missing ones in time.
fn fill_elevations(fixes: Vec<(TrackSample, Option<f64>)>) -> Result<Vec<TrackSample>, GeorefError> {
    let mut known: Vec<(Epoch, f64)> = fixes
        .iter()
        .filter_map(|(sample, ele)| ele.map(|ele| (sample.time, ele)))
        .collect();
    known.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let missing = fixes.len() - known.len();
    if missing == 0 {
        return Ok(fixes
            .into_iter()
            .map(|(sample, ele)| TrackSample {
                elevation: ele.unwrap_or(sample.elevation),
                ..sample
            })
            .collect());
    }
    if known.is_empty() {
        return Err(GeorefError::TrackParse(
            "no track point carries an elevation".into(),
        ));
    }
    warn!("Interpolated the elevation of {missing} GPX track points without <ele>");

    let samples = fixes
        .into_iter()
        .map(|(sample, ele)| {
            let elevation = ele.unwrap_or_else(|| {
                let after = known.partition_point(|(t, _)| *t <= sample.time);
                match (after.checked_sub(1).map(|i| known[i]), known.get(after)) {
                    (Some((t0, e0)), Some(&(t1, e1))) => {
                        let fraction = (sample.time - t0).total_nanoseconds() as f64
                            / (t1 - t0).total_nanoseconds() as f64;
                        e0 + (e1 - e0) * fraction
                    }
                    (Some((_, e)), None) | (None, Some(&(_, e))) => e,
                    (None, None) => sample.elevation,
                }
            });
            TrackSample { elevation, ..sample }
        })
        .collect();

    Ok(samples)
}

impl TrackParser for GpxReader {
    fn parse_track(&self, path: &Utf8Path) -> Result<Vec<TrackSample>, GeorefError> {
        let xml = std::fs::read_to_string(path)?;
        self.parse_str(&xml)
            .map_err(|e| match e {
                GeorefError::TrackParse(reason) => GeorefError::TrackParse(format!("{path}: {reason}")),
                other => other,
            })
    }
}
