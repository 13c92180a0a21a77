//! # Timestamp parsing and formatting
//!
//! Every timestamp handled by the crate is a [`hifitime::Epoch`] in the UTC time scale.
//! This module converts the three textual layouts met at the boundaries of a run:
//!
//! | Source | Layout | Parser |
//! |---|---|---|
//! | Camera metadata | `YYYY:MM:DD HH:MM:SS[.f][Z\|±HH:MM]` (1–9 fractional digits) | [`parse_camera_timestamp`] |
//! | Calibration reference log | `YYYY-MM-DD HH:MM:SS` | [`parse_reference_timestamp`] |
//! | GPX `<time>` element | `YYYY-MM-DDTHH:MM:SS[.f][Z\|±HH:MM]` | [`parse_gpx_timestamp`] |
//!
//! The camera clock carries no time zone: its value is read as if it were UTC and the
//! clock offset estimated during calibration absorbs any zone difference. A zone
//! designator appended by the camera (`OffsetTime`) is accepted and ignored, so that
//! tags with and without it read the same clock.
use hifitime::{Duration, Epoch};
use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{char, one_of},
    combinator::{all_consuming, map, map_res, opt},
    sequence::preceded,
    IResult, Parser,
};

use crate::georef_errors::GeorefError;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

type CivilDate = (i32, u8, u8);
type CivilTime = (u8, u8, u8, u32);

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn year(input: &str) -> IResult<&str, i32> {
    map_res(take_while_m_n(4, 4, is_digit), |s: &str| s.parse::<i32>()).parse(input)
}

fn two_digits(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, is_digit), |s: &str| s.parse::<u8>()).parse(input)
}

/// Fractional seconds (`.f` up to nanosecond precision) as a number of nanoseconds.
fn fraction_nanos(input: &str) -> IResult<&str, u32> {
    map_res(
        preceded(char('.'), take_while_m_n(1, 9, is_digit)),
        |s: &str| {
            s.parse::<u32>()
                .map(|value| value * 10u32.pow((9 - s.len()) as u32))
        },
    )
    .parse(input)
}

fn date_with(input: &str, separator: char) -> IResult<&str, CivilDate> {
    let (input, (y, _, m, _, d)) = (
        year,
        char(separator),
        two_digits,
        char(separator),
        two_digits,
    )
        .parse(input)?;
    Ok((input, (y, m, d)))
}

fn camera_date(input: &str) -> IResult<&str, CivilDate> {
    date_with(input, ':')
}

fn iso_date(input: &str) -> IResult<&str, CivilDate> {
    date_with(input, '-')
}

fn whole_seconds(input: &str) -> IResult<&str, (u8, u8, u8)> {
    let (input, (h, _, mi, _, s)) =
        (two_digits, char(':'), two_digits, char(':'), two_digits).parse(input)?;
    Ok((input, (h, mi, s)))
}

fn time_of_day(input: &str) -> IResult<&str, CivilTime> {
    let (input, (h, _, mi, _, s, nanos)) = (
        two_digits,
        char(':'),
        two_digits,
        char(':'),
        two_digits,
        opt(fraction_nanos),
    )
        .parse(input)?;
    Ok((input, (h, mi, s, nanos.unwrap_or(0))))
}

/// UTC offset of a RFC 3339 timestamp, in seconds east of Greenwich.
fn utc_offset(input: &str) -> IResult<&str, i64> {
    alt((
        map(char('Z'), |_| 0),
        map(
            (one_of("+-"), two_digits, char(':'), two_digits),
            |(sign, hours, _, minutes)| {
                let seconds = hours as i64 * 3600 + minutes as i64 * 60;
                if sign == '-' {
                    -seconds
                } else {
                    seconds
                }
            },
        ),
    ))
    .parse(input)
}

fn to_epoch(raw: &str, date: CivilDate, time: CivilTime) -> Result<Epoch, GeorefError> {
    let (y, m, d) = date;
    let (h, mi, s, nanos) = time;
    // unset EXIF dates read 0000:00:00
    if m == 0 || d == 0 {
        return Err(GeorefError::InvalidTimestamp(format!(
            "{raw}: month and day start at 1"
        )));
    }
    Epoch::maybe_from_gregorian_utc(y, m, d, h, mi, s, nanos)
        .map_err(|e| GeorefError::InvalidTimestamp(format!("{raw}: {e}")))
}

fn invalid(raw: &str, layout: &str) -> GeorefError {
    GeorefError::InvalidTimestamp(format!("'{raw}' does not match the layout {layout}"))
}

/// Parse a camera capture time as reported by the metadata reader.
///
/// Argument
/// --------
/// * `raw`: a timestamp in the format `YYYY:MM:DD HH:MM:SS.ffffff`; the fractional
///   part is optional and may hold 1 to 9 digits, a trailing `Z` or `±HH:MM` is ignored
///
/// Return
/// ------
/// * the capture time as an UTC [`Epoch`], or [`GeorefError::InvalidTimestamp`]
pub fn parse_camera_timestamp(raw: &str) -> Result<Epoch, GeorefError> {
    let raw = raw.trim();
    let (_, (date, _, time, _)) =
        all_consuming((camera_date, char(' '), time_of_day, opt(utc_offset)))
            .parse(raw)
            .map_err(|_| invalid(raw, "YYYY:MM:DD HH:MM:SS[.f][Z|±HH:MM]"))?;
    to_epoch(raw, date, time)
}

/// Parse a reference timestamp of the calibration log (`YYYY-MM-DD HH:MM:SS`, second precision).
pub fn parse_reference_timestamp(raw: &str) -> Result<Epoch, GeorefError> {
    let raw = raw.trim();
    let (_, (date, _, (h, mi, s))) = all_consuming((iso_date, char(' '), whole_seconds))
        .parse(raw)
        .map_err(|_| invalid(raw, "YYYY-MM-DD HH:MM:SS"))?;
    to_epoch(raw, date, (h, mi, s, 0))
}

/// Parse the `<time>` element of a GPX track point.
///
/// GPX stores RFC 3339 timestamps. A missing zone designator is read as UTC,
/// an explicit offset is removed so that the returned epoch is always UTC.
pub fn parse_gpx_timestamp(raw: &str) -> Result<Epoch, GeorefError> {
    let raw = raw.trim();
    let (_, (date, _, time, offset)) =
        all_consuming((iso_date, char('T'), time_of_day, opt(utc_offset)))
            .parse(raw)
            .map_err(|_| invalid(raw, "YYYY-MM-DDTHH:MM:SS[.f][Z|±HH:MM]"))?;

    let local = to_epoch(raw, date, time)?;
    let offset = Duration::from_total_nanoseconds(offset.unwrap_or(0) as i128 * NANOS_PER_SECOND);
    Ok(local - offset)
}

/// Format an epoch as `YYYY-MM-DD HH:MM:SS.ffffff` (UTC, microsecond precision).
pub fn format_timestamp(epoch: Epoch) -> String {
    let (y, m, d, h, mi, s, nanos) = epoch.to_gregorian_utc();
    format!(
        "{y:04}-{m:02}-{d:02} {h:02}:{mi:02}:{s:02}.{:06}",
        nanos / 1_000
    )
}

/// Build a [`Duration`] from a whole number of milliseconds.
pub fn millis(ms: i64) -> Duration {
    Duration::from_total_nanoseconds(ms as i128 * 1_000_000)
}
