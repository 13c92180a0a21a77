use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing::{error, info};

use georef::metadata::exiftool::{ExifTool, HemisphereRefs};
use georef::params::GeorefParams;
use georef::time::millis;
use georef::track::gpx_reader::GpxReader;
use georef::{Georeferencer, RunPaths};

/// Georeference photographs with a GPX track, correcting the camera clock drift
/// from calibration photographs of GPS waypoints.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Config {
    /// Directory of the calibration photographs
    #[arg(long, value_name = "DIR", default_value = "ClockSync/")]
    calibration_dir: Utf8PathBuf,

    /// Reference log of the calibration photographs: <photo>,<YYYY-MM-DD HH:MM:SS>
    #[arg(long, value_name = "FILE", default_value = "ClockSync/gps_times.csv")]
    reference_log: Utf8PathBuf,

    /// Directory of the photographs to georeference
    #[arg(long, value_name = "DIR", default_value = "TIF")]
    destination_dir: Utf8PathBuf,

    /// GPX track of the survey
    #[arg(long, value_name = "FILE", default_value = "2020-07-15 145632.gpx")]
    gpx_file: Utf8PathBuf,

    /// Coordinate table written for the matched photographs
    #[arg(long, value_name = "FILE", default_value = "camera_coordinates.csv")]
    table_out: Utf8PathBuf,

    /// Camera clock resolution in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    clock_step_ms: i64,

    /// Track resampling interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 100)]
    resample_ms: i64,

    /// Suffix of the raw image files
    #[arg(long, default_value = "NEF")]
    raw_suffix: String,

    /// Suffixes of the derived image files
    #[arg(long, value_delimiter = ',', default_value = "jpg,JPG,jpeg,tiff,tif")]
    derived_suffixes: Vec<String>,

    /// exiftool executable
    #[arg(long, value_name = "PATH", default_value = "exiftool")]
    exiftool: Utf8PathBuf,

    /// GPSLongitudeRef written to every photograph
    #[arg(long, default_value = "East")]
    longitude_ref: String,

    /// GPSLatitudeRef written to every photograph
    #[arg(long, default_value = "North")]
    latitude_ref: String,

    /// Hide the progress bars
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Verbose logging (DEBUG level)
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}

fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.verbose);

    let params = match GeorefParams::builder()
        .quantization_step(millis(config.clock_step_ms))
        .resample_interval(millis(config.resample_ms))
        .raw_suffix(config.raw_suffix.clone())
        .derived_suffixes(config.derived_suffixes.clone())
        .show_progress(!config.no_progress)
        .build()
    {
        Ok(params) => params,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    info!("{params}");

    let exiftool = ExifTool::new(config.exiftool.clone()).with_hemispheres(HemisphereRefs {
        longitude: config.longitude_ref.clone(),
        latitude: config.latitude_ref.clone(),
    });
    let georeferencer = Georeferencer::new(exiftool.clone(), exiftool, GpxReader, params);

    let paths = RunPaths {
        calibration_dir: config.calibration_dir,
        reference_log: config.reference_log,
        destination_dir: config.destination_dir,
        track_file: config.gpx_file,
        table_out: config.table_out,
    };

    match georeferencer.run(&paths) {
        Ok(summary) if summary.write_failures.is_empty() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            error!("Georeferencing aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
