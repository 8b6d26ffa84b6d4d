//! Types for the reference background recording of a plate

use crate::types::plate::WellId;
use bon::Builder;
use serde::{Deserialize, Serialize};

/// LED intensity fractions the reference plate was measured at.
pub const LED_INTENSITIES: [f64; 3] = [0.25, 0.5, 1.0];

/// Header of the background column measured at `fraction` of the reference LED intensity.
pub fn led_intensity_column(fraction: f64) -> String {
    format!(
        "Background Fluorescence, {}% LED Intensity (AU)",
        (fraction * 100.0) as u32
    )
}

/// Background fluorescence of one well at each of [`LED_INTENSITIES`].
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct WellBackground {
    pub well: WellId,
    pub readings: [f64; 3],
}

/// Contents of the sibling `settings.toml` of a background recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundMetadata {
    pub led_intensity: f64,
    pub fps: f64,
}

/// Reference dataset used for background subtraction.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct BackgroundRecordingInfo {
    pub wells: Vec<WellBackground>,
    pub metadata: BackgroundMetadata,
}
