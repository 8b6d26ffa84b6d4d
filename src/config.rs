//! Run configuration
//!
//! A run is described by the instrument's TOML settings file. It is loaded
//! once into [`RunConfig`], validated, optionally overridden from the command
//! line, and then passed by reference through the pipeline.

use crate::error::{Error, Result};
use crate::processing::GeometryParams;
use crate::types::plate::MAX_ROWS;
use crate::types::{BitDepth, RecordingDescriptor};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stage geometry in raw (unscaled) units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Center-to-center well distance, in µm.
    pub well_spacing: f64,
    pub num_wells_h: usize,
    pub num_wells_v: usize,
    /// ROI size in raw pixels. Fractional values are floored when scaled.
    pub roi_size_x: f64,
    pub roi_size_y: f64,
    /// Optical offsets in raw pixels.
    #[serde(default)]
    pub h_offset: f64,
    #[serde(default)]
    pub v_offset: f64,
    #[serde(default)]
    pub num_wells: Option<usize>,
}

fn default_bin_factor() -> i64 {
    1
}

fn default_data_type() -> String {
    "Calcium".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub output_dir_path: PathBuf,
    #[serde(default)]
    pub recording_date: String,
    #[serde(default)]
    pub software_version: String,
    #[serde(default = "default_data_type")]
    pub data_type: String,

    pub num_frames: usize,
    pub fps: f64,
    pub bit_depth: u32,
    pub scale_factor: i64,
    #[serde(default = "default_bin_factor")]
    pub additional_bin_factor: i64,
    /// Raw pixel size, in µm.
    pub xy_pixel_size: f64,
    /// Raw tile width in pixels.
    pub width: i64,
    /// Raw tile height in pixels.
    pub height: i64,
    pub num_horizontal_pixels: i64,
    pub num_vertical_pixels: i64,
    /// Tile rows.
    pub rows: usize,
    /// Tile columns.
    pub cols: usize,
    pub led_intensity: f64,

    #[serde(default)]
    pub use_background_subtraction: bool,
    #[serde(default)]
    pub plate_id: Option<String>,
    #[serde(default)]
    pub background_recording_dir: Option<PathBuf>,
    #[serde(default)]
    pub gxp_log_file_path: Option<PathBuf>,

    pub stage: StageConfig,
}

/// Configuration values divided down to the recording's pixel grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledInputs {
    pub xy_pixel_size: f64,
    pub height: i64,
    pub width: i64,
    pub num_horizontal_pixels: i64,
    pub num_vertical_pixels: i64,
    pub roi_size_x: f64,
    pub roi_size_y: f64,
    pub h_offset: f64,
    pub v_offset: f64,
}

/// Floor division of a raw size by an integer factor.
fn floor_div(value: f64, factor: i64) -> f64 {
    (value / factor as f64).floor()
}

impl RunConfig {
    /// Load from a TOML file, with `WELLSIG_*` environment variables on top.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::MissingPath {
                what: "Config file",
                path: path.to_path_buf(),
            });
        }
        let config: Self = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("WELLSIG_"))
            .extract()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        BitDepth::try_from(self.bit_depth)?;

        let fail = |msg: String| Err(Error::Config(msg));
        if !(self.fps > 0.0) {
            return fail(format!("fps must be positive, got {}", self.fps));
        }
        if self.num_frames == 0 {
            return fail("num_frames must be at least 1".to_string());
        }
        if self.scale_factor <= 0 || self.additional_bin_factor <= 0 {
            return fail(format!(
                "scale_factor and additional_bin_factor must be positive, got {} and {}",
                self.scale_factor, self.additional_bin_factor
            ));
        }
        if !(self.xy_pixel_size > 0.0) {
            return fail(format!(
                "xy_pixel_size must be positive, got {}",
                self.xy_pixel_size
            ));
        }
        if self.rows * self.stage.num_wells_v > MAX_ROWS {
            return fail(format!(
                "plate has {} well rows, at most {} are supported",
                self.rows * self.stage.num_wells_v,
                MAX_ROWS
            ));
        }
        Ok(())
    }

    pub fn bit_depth(&self) -> Result<BitDepth> {
        BitDepth::try_from(self.bit_depth)
    }

    /// Input file stem, used to name every output.
    pub fn recording_name(&self) -> String {
        self.input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string())
    }

    /// Scale raw sizes to the binned, downsampled frames. Floor division
    /// throughout, matching the instrument software.
    pub fn scaled(&self) -> ScaledInputs {
        let bin = self.additional_bin_factor;
        let scale = self.scale_factor;
        ScaledInputs {
            xy_pixel_size: self.xy_pixel_size * bin as f64 * scale as f64,
            height: self.height.div_euclid(bin),
            width: self.width.div_euclid(bin),
            num_horizontal_pixels: self.num_horizontal_pixels.div_euclid(bin),
            num_vertical_pixels: self.num_vertical_pixels.div_euclid(bin),
            roi_size_x: floor_div(floor_div(self.stage.roi_size_x, bin), scale),
            roi_size_y: floor_div(floor_div(self.stage.roi_size_y, bin), scale),
            h_offset: floor_div(self.stage.h_offset, scale),
            v_offset: floor_div(self.stage.v_offset, scale),
        }
    }

    pub fn geometry(&self) -> GeometryParams {
        let scaled = self.scaled();
        GeometryParams::builder()
            .rows(self.rows)
            .cols(self.cols)
            .num_wells_h(self.stage.num_wells_h)
            .num_wells_v(self.stage.num_wells_v)
            .well_spacing(self.stage.well_spacing)
            .px_size(scaled.xy_pixel_size)
            .roi_size_x(scaled.roi_size_x)
            .roi_size_y(scaled.roi_size_y)
            .width(scaled.width as f64)
            .height(scaled.height as f64)
            .h_offset(scaled.h_offset)
            .v_offset(scaled.v_offset)
            .build()
    }

    pub fn recording_descriptor(&self) -> Result<RecordingDescriptor> {
        let scaled = self.scaled();
        let dim = |name: &str, v: i64| {
            usize::try_from(v)
                .map_err(|_| Error::Config(format!("{} must not be negative, got {}", name, v)))
        };
        Ok(RecordingDescriptor::builder()
            .bit_depth(self.bit_depth()?)
            .num_frames(self.num_frames)
            .height(dim("num_vertical_pixels", scaled.num_vertical_pixels)?)
            .width(dim("num_horizontal_pixels", scaled.num_horizontal_pixels)?)
            .fps(self.fps)
            .led_intensity(self.led_intensity)
            .build())
    }

    pub fn total_well_count(&self) -> usize {
        self.stage.num_wells.unwrap_or(
            self.rows * self.cols * self.stage.num_wells_h * self.stage.num_wells_v,
        )
    }
}
