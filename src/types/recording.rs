//! Types describing a raw recording and the way its samples are stored

use crate::error::{Error, Result};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Sample bit depth of a recording. 12-bit samples are stored in two
/// little-endian bytes exactly like 16-bit ones.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BitDepth {
    Eight,
    Twelve,
    Sixteen,
}

impl BitDepth {
    pub fn sample_width(self) -> SampleWidth {
        match self {
            BitDepth::Eight => SampleWidth::One,
            BitDepth::Twelve | BitDepth::Sixteen => SampleWidth::Two,
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Twelve => 12,
            BitDepth::Sixteen => 16,
        }
    }
}

impl TryFrom<u32> for BitDepth {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            12 => Ok(BitDepth::Twelve),
            16 => Ok(BitDepth::Sixteen),
            other => Err(Error::InvalidBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u32 {
    fn from(depth: BitDepth) -> u32 {
        depth.bits()
    }
}

/// Number of bytes a single sample occupies in the recording file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SampleWidth {
    One,
    Two,
}

impl SampleWidth {
    pub fn bytes(self) -> usize {
        match self {
            SampleWidth::One => 1,
            SampleWidth::Two => 2,
        }
    }
}

/// Immutable run parameters of one recording, after input scaling.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct RecordingDescriptor {
    pub bit_depth: BitDepth,
    pub num_frames: usize,
    /// Frame height in samples (rows).
    pub height: usize,
    /// Frame width in samples (columns).
    pub width: usize,
    pub fps: f64,
    pub led_intensity: f64,
}

impl RecordingDescriptor {
    /// Exposure duration of one frame, in seconds.
    pub fn exposure_duration(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn frame_bytes(&self) -> usize {
        self.height * self.width * self.bit_depth.sample_width().bytes()
    }
}
