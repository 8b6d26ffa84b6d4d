//! File sinks for the extracted time series

use crate::config::{RunConfig, StageConfig};
use crate::error::Result;
use crate::types::TimeSeriesTable;
use crate::utils::log_file_digest;
use polars::prelude::{CsvWriter, SerWriter};
use polars_io::prelude::ParquetWriter;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const FILE_FORMAT_VERSION: &str = "0.1.0";
pub const INSTRUMENT_TYPE: &str = "nautilai";

/// Run metadata written alongside the data files.
#[derive(Debug, Serialize)]
pub struct RunMetadata<'a> {
    pub utc_beginning_recording: &'a str,
    pub file_format_version: &'static str,
    pub instrument_type: &'static str,
    pub instrument_serial_number: &'static str,
    pub software_release_version: &'a str,
    pub plate_barcode: String,
    pub total_well_count: usize,
    pub stage_config: &'a StageConfig,
    pub tissue_sampling_period: f64,
    pub image_dimensions: (i64, i64),
    pub data_type: &'a str,
    pub led_intensity: f64,
    pub bit_depth: u32,
    pub xy_pixel_size: f64,
    pub scale_factor: i64,
    pub additional_bin_factor: i64,
}

impl<'a> RunMetadata<'a> {
    /// `calibrated` marks whether the plate id was actually used for background subtraction.
    pub fn new(config: &'a RunConfig, calibrated: bool) -> Self {
        let plate_barcode = match (&config.plate_id, calibrated) {
            (Some(plate_id), true) => plate_id.clone(),
            _ => "N/A".to_string(),
        };
        Self {
            utc_beginning_recording: &config.recording_date,
            file_format_version: FILE_FORMAT_VERSION,
            instrument_type: INSTRUMENT_TYPE,
            instrument_serial_number: "N/A",
            software_release_version: &config.software_version,
            plate_barcode,
            total_well_count: config.total_well_count(),
            stage_config: &config.stage,
            tissue_sampling_period: 1.0 / config.fps,
            image_dimensions: (config.num_horizontal_pixels, config.num_vertical_pixels),
            data_type: &config.data_type,
            led_intensity: config.led_intensity,
            bit_depth: config.bit_depth,
            xy_pixel_size: config.xy_pixel_size,
            scale_factor: config.scale_factor,
            additional_bin_factor: config.additional_bin_factor,
        }
    }
}

/// Paths of everything a run wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub parquet: PathBuf,
    pub csv: PathBuf,
    pub metadata: PathBuf,
    pub curi: PathBuf,
}

pub fn write_parquet(table: &TimeSeriesTable, path: &Path) -> Result<()> {
    tracing::info!(path = %path.display(), "Writing parquet output file");
    let mut df = table.to_dataframe()?;
    ParquetWriter::new(File::create(path)?).finish(&mut df)?;
    log_file_digest(path);
    Ok(())
}

pub fn write_csv(table: &TimeSeriesTable, path: &Path) -> Result<()> {
    tracing::info!(path = %path.display(), "Writing csv output file");
    let mut df = table.to_dataframe()?;
    CsvWriter::new(File::create(path)?)
        .include_header(true)
        .finish(&mut df)?;
    log_file_digest(path);
    Ok(())
}

pub fn write_metadata(metadata: &RunMetadata<'_>, path: &Path) -> Result<()> {
    tracing::info!(path = %path.display(), "Writing metadata file");
    serde_json::to_writer_pretty(File::create(path)?, metadata)?;
    log_file_digest(path);
    Ok(())
}
