//! Background fluorescence lookup, extrapolation and subtraction
//!
//! A reference recording of an unstained plate gives each well's background
//! fluorescence at 25%, 50% and 100% of the reference LED intensity. The
//! background for the current run is either read directly (when the run's LED
//! intensity is exactly one of those fractions) or taken from a least-squares
//! line through the three readings, then scaled by the ratio of exposure
//! durations and subtracted from every frame of the well.

use crate::error::{Error, Result};
use crate::types::background::{LED_INTENSITIES, led_intensity_column};
use crate::types::{
    BackgroundMetadata, BackgroundRecordingInfo, RecordingDescriptor, TimeSeriesTable,
    WellBackground, WellId,
};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

const WELL_COLUMN: &str = "Well";
const SETTINGS_FILE: &str = "settings.toml";

/// Result of a calibration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// Background subtraction was not requested.
    Disabled,
    /// Requested, but no plate identifier was supplied, so nothing was subtracted.
    SkippedNoReference,
    Calibrated,
}

fn require_exists(what: &'static str, path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::MissingPath { what, path })
    }
}

/// Load `<dir>/<plate_id>/<plate_id>.tsv` and its sibling `settings.toml`.
pub fn load_background(dir: &Path, plate_id: &str) -> Result<BackgroundRecordingInfo> {
    tracing::info!(dir = %dir.display(), plate_id, "Loading background recording data");

    let dir = require_exists("Background recording dir", dir.to_path_buf())?;
    let plate_dir = require_exists("Background recording dir for plate ID", dir.join(plate_id))?;
    let data_path = require_exists(
        "Background recording file",
        plate_dir.join(format!("{}.tsv", plate_id)),
    )?;
    let settings_path = require_exists(
        "Background recording settings",
        plate_dir.join(SETTINGS_FILE),
    )?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_separator(b'\t'))
        .try_into_reader_with_file_path(Some(data_path))?
        .finish()?;
    let wells = parse_background_table(&df)?;

    let metadata: BackgroundMetadata = toml::from_str(&std::fs::read_to_string(&settings_path)?)?;

    Ok(BackgroundRecordingInfo::builder()
        .wells(wells)
        .metadata(metadata)
        .build())
}

/// Pull the well names and the three LED intensity columns out of a background table.
pub fn parse_background_table(df: &DataFrame) -> Result<Vec<WellBackground>> {
    let names = df.column(WELL_COLUMN)?.as_materialized_series().str()?.clone();

    let mut readings: Vec<Float64Chunked> = Vec::with_capacity(LED_INTENSITIES.len());
    for fraction in LED_INTENSITIES {
        let column = df
            .column(&led_intensity_column(fraction))?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        readings.push(column.f64()?.clone());
    }

    (0..df.height())
        .map(|row| {
            let well = names
                .get(row)
                .ok_or_else(|| Error::Config(format!("background row {} has no well name", row)))?;
            let mut values = [0.0; 3];
            for (value, column) in values.iter_mut().zip(&readings) {
                *value = column.get(row).ok_or_else(|| {
                    Error::Config(format!("background well {} is missing a reading", well))
                })?;
            }
            Ok(WellBackground::builder()
                .well(WellId::from(well))
                .readings(values)
                .build())
        })
        .collect()
}

/// Slope and intercept of the ordinary least-squares line through `(xs, ys)`.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let (sxy, sxx) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxy, sxx), (&x, &y)| {
            let dx = x - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    let slope = sxy / sxx;
    (slope, y_mean - slope * x_mean)
}

/// Background fluorescence per well for the given recording, before
/// subtraction. Fails when the well sets differ or a background well repeats.
pub fn background_offsets(
    wells: &BTreeSet<&str>,
    recording: &RecordingDescriptor,
    background: &BackgroundRecordingInfo,
) -> Result<Vec<(WellId, f64)>> {
    let mut bg_wells = BTreeSet::new();
    for bg in &background.wells {
        if !bg_wells.insert(bg.well.as_str()) {
            return Err(Error::Config(format!(
                "background recording lists well {} more than once",
                bg.well
            )));
        }
    }
    if *wells != bg_wells {
        return Err(Error::PlateMismatch);
    }

    let bg_led_intensity = background.metadata.led_intensity;
    if bg_led_intensity == 0.0 || background.metadata.fps <= 0.0 {
        return Err(Error::Config(format!(
            "background recording settings are unusable: led_intensity {}, fps {}",
            bg_led_intensity, background.metadata.fps
        )));
    }

    let exposure_scale = recording.exposure_duration() / (1.0 / background.metadata.fps);
    let ratio = recording.led_intensity / bg_led_intensity;

    let exact = LED_INTENSITIES
        .iter()
        .position(|&fraction| recording.led_intensity == bg_led_intensity * fraction);

    match exact {
        Some(idx) => tracing::info!(
            column = %led_intensity_column(LED_INTENSITIES[idx]),
            "Using background readings at matching LED intensity"
        ),
        None => tracing::info!(ratio, "Extrapolating background from LED intensity regression"),
    }

    Ok(background
        .wells
        .iter()
        .map(|bg| {
            let value = match exact {
                Some(idx) => bg.readings[idx],
                None => {
                    let (slope, intercept) = linear_regression(&LED_INTENSITIES, &bg.readings);
                    ratio * slope + intercept
                }
            };
            (bg.well.clone(), value * exposure_scale)
        })
        .collect())
}

/// Subtract the background offset of each well from its whole trace.
pub fn calibrate(
    table: &mut TimeSeriesTable,
    recording: &RecordingDescriptor,
    background: &BackgroundRecordingInfo,
) -> Result<()> {
    tracing::info!("Performing background subtraction");

    let wells: BTreeSet<&str> = table.well_ids().map(|w| w.as_str()).collect();
    let offsets = background_offsets(&wells, recording, background)?;

    for (well, offset) in offsets {
        tracing::debug!(well = %well, offset, "Background offset");
        table.subtract_offset(well.as_str(), offset);
    }
    Ok(())
}

/// Load the reference for `plate_id` and calibrate, or report why nothing was done.
pub fn calibrate_if_requested(
    table: &mut TimeSeriesTable,
    recording: &RecordingDescriptor,
    requested: bool,
    background_dir: Option<&Path>,
    plate_id: Option<&str>,
) -> Result<CalibrationOutcome> {
    if !requested {
        tracing::info!("Background subtraction disabled");
        return Ok(CalibrationOutcome::Disabled);
    }

    let Some(plate_id) = plate_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("Background subtraction enabled, however no Plate ID was given; skipping");
        return Ok(CalibrationOutcome::SkippedNoReference);
    };

    let background_dir = background_dir.ok_or_else(|| {
        Error::Config("background subtraction requires background_recording_dir".to_string())
    })?;

    let background = load_background(background_dir, plate_id)?;
    calibrate(table, recording, &background)?;
    Ok(CalibrationOutcome::Calibrated)
}
