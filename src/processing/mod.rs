//! Signal extraction: ROI placement, averaging and background correction

pub mod background;
pub mod extract;
pub mod geometry;

// Re-export for easier access
pub use background::{CalibrationOutcome, calibrate, calibrate_if_requested, load_background};
pub use extract::{extract, extract_parallel};
pub use geometry::{GeometryParams, compute_rois};
