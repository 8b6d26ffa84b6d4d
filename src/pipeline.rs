//! End-to-end run: recording -> ROIs -> time series -> background -> outputs

use crate::config::RunConfig;
use crate::container::write_curi_file;
use crate::error::{Error, Result};
use crate::frame_store::FrameStore;
use crate::logging::{AuditLog, run_span};
use crate::output::{self, OutputPaths, RunMetadata};
use crate::processing::{CalibrationOutcome, calibrate_if_requested, compute_rois, extract_parallel};
use crate::types::TimeSeriesTable;
use crate::utils::log_file_digest;

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub table: TimeSeriesTable,
    pub calibration: CalibrationOutcome,
    pub outputs: OutputPaths,
}

/// Extract the (optionally background-corrected) time series without writing files.
pub fn extract_time_series(config: &RunConfig) -> Result<(TimeSeriesTable, CalibrationOutcome)> {
    config.validate()?;
    let descriptor = config.recording_descriptor()?;

    if !config.input_path.exists() {
        return Err(Error::MissingPath {
            what: "Input recording",
            path: config.input_path.clone(),
        });
    }
    log_file_digest(&config.input_path);

    let store = FrameStore::builder()
        .path(&config.input_path)
        .num_frames(descriptor.num_frames)
        .frame_shape((descriptor.height, descriptor.width))
        .sample_width(descriptor.bit_depth.sample_width())
        .build()?;

    let layout = compute_rois(&config.geometry())?;
    let mut table = extract_parallel(&store, &layout, descriptor.fps)?;

    let calibration = calibrate_if_requested(
        &mut table,
        &descriptor,
        config.use_background_subtraction,
        config.background_recording_dir.as_deref(),
        config.plate_id.as_deref(),
    )?;

    Ok((table, calibration))
}

/// Run the whole analysis and write every output next to each other in
/// `output_dir_path`. Outputs already written are left in place on failure.
pub fn run(config: &RunConfig, audit: &AuditLog) -> Result<RunSummary> {
    let recording_name = config.recording_name();
    let span = run_span(&recording_name);
    let _guard = span.enter();

    tracing::info!("Local analysis starting");
    tracing::info!(metadata = %serde_json::to_string(config)?, "Metadata");

    let (table, calibration) = extract_time_series(config)?;

    std::fs::create_dir_all(&config.output_dir_path)?;
    let out = |suffix: &str| config.output_dir_path.join(format!("{}{}", recording_name, suffix));

    let parquet = out(".parquet");
    output::write_parquet(&table, &parquet)?;
    let csv = out(".csv");
    output::write_csv(&table, &csv)?;
    let metadata = out("_metadata.json");
    output::write_metadata(
        &RunMetadata::new(config, calibration == CalibrationOutcome::Calibrated),
        &metadata,
    )?;

    tracing::info!("Outputs written");
    let curi = write_curi_file(&parquet, config.gxp_log_file_path.as_deref(), audit)?;
    log_file_digest(&curi);
    tracing::info!("Done");

    Ok(RunSummary {
        table,
        calibration,
        outputs: OutputPaths {
            parquet,
            csv,
            metadata,
            curi,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::sample_config;
    use crate::container::decode;
    use crate::logging::audit_layer;
    use std::io::{Cursor, Read};
    use std::path::Path;
    use tracing_subscriber::{Registry, layer::SubscriberExt};

    fn messages(log: &str) -> Vec<String> {
        log.lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
            .filter_map(|event| event["fields"]["message"].as_str().map(str::to_string))
            .collect()
    }

    /// 8-bit, 2x1 tiles of one 2x2-well grid on a 16x8 frame; every pixel of
    /// frame i holds 10 * (i + 1).
    fn small_config(dir: &Path) -> RunConfig {
        let num_frames = 3;
        let bytes: Vec<u8> = (0..num_frames)
            .flat_map(|i| std::iter::repeat(10 * (i as u8 + 1)).take(16 * 8))
            .collect();
        let input_path = dir.join("plate_run.raw");
        std::fs::write(&input_path, bytes).unwrap();

        let mut config = sample_config();
        config.input_path = input_path;
        config.output_dir_path = dir.join("out");
        config.num_frames = num_frames;
        config.fps = 2.0;
        config.bit_depth = 8;
        config.scale_factor = 1;
        config.additional_bin_factor = 1;
        config.xy_pixel_size = 1.0;
        config.width = 8;
        config.height = 8;
        config.num_horizontal_pixels = 16;
        config.num_vertical_pixels = 8;
        config.rows = 1;
        config.cols = 2;
        config.use_background_subtraction = false;
        config.stage.well_spacing = 4.0;
        config.stage.num_wells_h = 2;
        config.stage.num_wells_v = 2;
        config.stage.roi_size_x = 2.0;
        config.stage.roi_size_y = 2.0;
        config.stage.h_offset = 0.0;
        config.stage.v_offset = 0.0;
        config
    }

    #[test]
    fn test_extract_time_series() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = small_config(dir.path());

        let (table, calibration) = extract_time_series(&config)?;
        assert_eq!(calibration, CalibrationOutcome::Disabled);
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.time(), &[0.0, 0.5, 1.0]);
        assert_eq!(
            table.column_names(),
            vec!["time", "A1", "A2", "B1", "B2", "A3", "A4", "B3", "B4"]
        );
        for well in table.well_ids() {
            assert_eq!(table.well(well.as_str()).unwrap(), &[10.0, 20.0, 30.0]);
        }
        Ok(())
    }

    #[test]
    fn test_calibration_without_plate_id_is_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut config = small_config(dir.path());
        config.use_background_subtraction = true;
        config.plate_id = None;

        let (table, calibration) = extract_time_series(&config)?;
        assert_eq!(calibration, CalibrationOutcome::SkippedNoReference);
        assert_eq!(table.well("A1").unwrap(), &[10.0, 20.0, 30.0]);
        Ok(())
    }

    #[test]
    fn test_missing_background_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config(dir.path());
        config.use_background_subtraction = true;
        config.background_recording_dir = Some(dir.path().join("backgrounds"));

        assert!(matches!(
            extract_time_series(&config),
            Err(Error::MissingPath { .. })
        ));
    }

    #[test]
    fn test_run_writes_outputs_and_audit_trail() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = small_config(dir.path());
        let audit = AuditLog::new();
        let subscriber = Registry::default().with(audit_layer(&audit));

        let summary = tracing::subscriber::with_default(subscriber, || run(&config, &audit))?;

        let out_dir = dir.path().join("out");
        assert_eq!(summary.outputs.parquet, out_dir.join("plate_run.parquet"));
        assert!(summary.outputs.csv.exists());
        assert!(summary.outputs.metadata.exists());

        let payload = decode(&std::fs::read(&summary.outputs.curi)?)?;
        let mut zip = zip::ZipArchive::new(Cursor::new(payload))?;
        let mut data = Vec::new();
        zip.by_name("data/plate_run.parquet")?.read_to_end(&mut data)?;
        assert_eq!(data, std::fs::read(&summary.outputs.parquet)?);

        let mut log = String::new();
        zip.by_name("gxp/local_analysis.log")?.read_to_string(&mut log)?;
        let archived = messages(&log);
        assert!(archived.contains(&"Creating ROIs".to_string()));
        assert_eq!(archived.last().map(String::as_str), Some("Writing curi output file"));
        assert!(!archived.contains(&"Done".to_string()));

        // The run finishes after the container is written, so only the live log has it
        let live = messages(&audit.contents());
        assert_eq!(live.last().map(String::as_str), Some("Done"));
        Ok(())
    }
}
