mod common;

use approx::assert_relative_eq;
use camino::Utf8Path;
use common::{at, paths, scratch_path, FakeReader, RecordingWriter, StaticTrack};
use georef::calibration::reference_log::CalibrationLog;
use georef::time::millis;
use georef::{Coordinate, GeorefError, GeorefParams, Georeferencer, TrackSample};

fn reference_log() -> CalibrationLog {
    CalibrationLog::from_reader(
        "cal_1.NEF,2020-07-15 13:59:00\ncal_2.NEF,2020-07-15 13:59:30\n".as_bytes(),
    )
    .unwrap()
}

/// Camera 5.05 s and 4.95 s ahead of GPS time: 5.0 s offset.
fn calibrated_reader() -> FakeReader {
    FakeReader::default()
        .with("ClockSync/cal_1.NEF", at(-60_000 + 5_050))
        .with("ClockSync/cal_2.NEF", at(-30_000 + 4_950))
}

fn survey_track() -> StaticTrack {
    StaticTrack(vec![
        TrackSample::new(at(0), 10.0, 60.0, 0.0),
        TrackSample::new(at(10_000), 20.0, 60.0, 100.0),
    ])
}

#[test]
fn test_end_to_end() {
    let reader = calibrated_reader()
        .with("TIF/DSC_0001.tif", at(5_000 + 5_000))
        .with("TIF/DSC_0002.tif", at(-1_000 + 5_000))
        .with("TIF/DSC_0004.tif", at(10_000 + 5_000));
    let writer = RecordingWriter {
        failing: paths(&["TIF/DSC_0004.tif"]),
        ..Default::default()
    };
    let georeferencer = Georeferencer::new(&reader, &writer, survey_track(), GeorefParams::default());

    let table_out = scratch_path("end_to_end.csv");
    let summary = georeferencer
        .run_photos(
            &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF"]),
            &reference_log(),
            &paths(&[
                "TIF/DSC_0001.tif",
                "TIF/DSC_0002.tif",
                "TIF/DSC_0003.tif",
                "TIF/DSC_0004.tif",
            ]),
            Utf8Path::new("survey.gpx"),
            &table_out,
        )
        .unwrap();

    assert_eq!(summary.clock_offset.offset(), millis(5_000));
    assert_eq!(summary.calibration_pairs, 2);
    assert_eq!(summary.dense_track_len, 101);
    assert_eq!(summary.matched, vec!["DSC_0001.tif", "DSC_0004.tif"]);
    assert_eq!(summary.unmatched, vec!["DSC_0002.tif"]);
    assert_eq!(summary.read_failures.len(), 1);
    assert_eq!(summary.read_failures[0].path, "TIF/DSC_0003.tif");
    assert_eq!(summary.write_failures.len(), 1);
    assert_eq!(summary.write_failures[0].path, "TIF/DSC_0004.tif");
    assert_eq!(summary.written, 1);
    assert!(!summary.is_clean());

    let written = writer.written.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].0, "TIF/DSC_0001.tif");
    assert_eq!(
        written[0].1,
        Coordinate {
            longitude: 15.0,
            latitude: 60.0,
            elevation: 50.0
        }
    );

    let table = std::fs::read_to_string(&table_out).unwrap();
    std::fs::remove_file(&table_out).unwrap();
    assert_eq!(
        table,
        "timestamp,longitude,latitude,elevation,photo\n\
         2020-07-15 14:00:05.000000,15.0,60.0,50.0,DSC_0001.tif\n\
         2020-07-15 14:00:10.000000,20.0,60.0,100.0,DSC_0004.tif\n"
    );
}

#[test]
fn test_single_sample_track_aborts_before_writing() {
    let reader = calibrated_reader().with("TIF/DSC_0001.tif", at(5_000));
    let writer = RecordingWriter::default();
    let track = StaticTrack(vec![TrackSample::new(at(0), 10.0, 60.0, 0.0)]);
    let georeferencer = Georeferencer::new(&reader, &writer, track, GeorefParams::default());

    let table_out = scratch_path("degenerate.csv");
    let err = georeferencer
        .run_photos(
            &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF"]),
            &reference_log(),
            &paths(&["TIF/DSC_0001.tif"]),
            Utf8Path::new("single.gpx"),
            &table_out,
        )
        .unwrap_err();

    assert!(matches!(err, GeorefError::DegenerateTrack(_)));
    assert!(err.is_fatal());
    assert!(writer.written.borrow().is_empty());
    assert!(!table_out.exists());
}

#[test]
fn test_no_calibration_pairs_aborts() {
    // calibration photographs unreadable
    let reader = FakeReader::default().with("TIF/DSC_0001.tif", at(5_000));
    let writer = RecordingWriter::default();
    let georeferencer = Georeferencer::new(&reader, &writer, survey_track(), GeorefParams::default());

    let result = georeferencer.match_run(
        &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF"]),
        &reference_log(),
        &paths(&["TIF/DSC_0001.tif"]),
        Utf8Path::new("survey.gpx"),
    );

    assert_eq!(result.unwrap_err(), GeorefError::InsufficientCalibrationData);
    assert!(writer.written.borrow().is_empty());
}

#[test]
fn test_duplicated_fixes_are_dropped_before_resampling() {
    let reader = calibrated_reader().with("TIF/DSC_0001.tif", at(2_500 + 5_000));
    let writer = RecordingWriter::default();
    let track = StaticTrack(vec![
        TrackSample::new(at(0), 10.0, 60.0, 0.0),
        TrackSample::new(at(5_000), 15.0, 61.0, 10.0),
        TrackSample::new(at(5_000), 99.0, 99.0, 99.0),
        TrackSample::new(at(10_000), 20.0, 62.0, 20.0),
    ]);
    let georeferencer = Georeferencer::new(&reader, &writer, track, GeorefParams::default());

    let run = georeferencer
        .match_run(
            &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF"]),
            &reference_log(),
            &paths(&["TIF/DSC_0001.tif"]),
            Utf8Path::new("survey.gpx"),
        )
        .unwrap();

    let coordinate = run.outcome.matched["DSC_0001.tif"].coordinate().unwrap();
    assert_relative_eq!(coordinate.longitude, 12.5, epsilon = 1e-12);
    assert_relative_eq!(coordinate.latitude, 60.5, epsilon = 1e-12);
    assert_relative_eq!(coordinate.elevation, 5.0, epsilon = 1e-12);
}

#[test]
fn test_calibration_photos_are_not_georeferenced() {
    let reader = calibrated_reader().with("TIF/DSC_0001.tif", at(5_000 + 5_000));
    let writer = RecordingWriter::default();
    let georeferencer = Georeferencer::new(&reader, &writer, survey_track(), GeorefParams::default());

    let table_out = scratch_path("calibration_overlap.csv");
    let summary = georeferencer
        .run_photos(
            &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF"]),
            &reference_log(),
            &paths(&["ClockSync/cal_1.NEF", "TIF/DSC_0001.tif"]),
            Utf8Path::new("survey.gpx"),
            &table_out,
        )
        .unwrap();
    std::fs::remove_file(&table_out).unwrap();

    assert_eq!(summary.calibration_pairs, 2);
    assert_eq!(summary.matched, vec!["DSC_0001.tif"]);
    assert!(summary.unmatched.is_empty());
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(
        summary.skipped[0].error,
        GeorefError::CalibrationPhoto {
            path: "ClockSync/cal_1.NEF".into(),
            identifier: "cal_1.NEF".into(),
        }
    );

    let written = writer.written.borrow();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].0, "TIF/DSC_0001.tif");
}

#[test]
fn test_repeated_file_names_are_reported() {
    let reader = calibrated_reader()
        .with("A/x.tif", at(5_000 + 5_000))
        .with("B/x.tif", at(6_000 + 5_000));
    let writer = RecordingWriter::default();
    let georeferencer = Georeferencer::new(&reader, &writer, survey_track(), GeorefParams::default());

    let run = georeferencer
        .match_run(
            &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF"]),
            &reference_log(),
            &paths(&["A/x.tif", "B/x.tif"]),
            Utf8Path::new("survey.gpx"),
        )
        .unwrap();

    assert_eq!(run.outcome.matched.len(), 1);
    assert_eq!(run.outcome.matched["x.tif"].path, "A/x.tif");
    assert!(run.outcome.unmatched.is_empty());
    assert!(run.read_failures.is_empty());
    assert_eq!(
        run.skipped
            .iter()
            .map(|failure| failure.path.as_str())
            .collect::<Vec<_>>(),
        vec!["B/x.tif"]
    );
    assert!(matches!(
        run.skipped[0].error,
        GeorefError::DuplicateIdentifier { .. }
    ));
    assert!(!run.skipped[0].error.is_fatal());
}

#[test]
fn test_repeated_calibration_file_names_are_reported() {
    let reader = calibrated_reader().with("Other/cal_1.NEF", at(-60_000 + 9_000));
    let writer = RecordingWriter::default();
    let georeferencer = Georeferencer::new(&reader, &writer, survey_track(), GeorefParams::default());

    let run = georeferencer
        .match_run(
            &paths(&["ClockSync/cal_1.NEF", "ClockSync/cal_2.NEF", "Other/cal_1.NEF"]),
            &reference_log(),
            &[],
            Utf8Path::new("survey.gpx"),
        )
        .unwrap();

    // first cal_1.NEF kept: differences 5.05 s and 4.95 s
    assert_eq!(run.clock_offset.offset(), millis(5_000));
    assert_eq!(run.calibration_pairs, 2);
    assert_eq!(run.skipped.len(), 1);
    assert_eq!(run.skipped[0].path, "Other/cal_1.NEF");
}
