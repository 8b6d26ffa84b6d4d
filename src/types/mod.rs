//! Type definitions for recordings, plates and extracted signals

pub mod background;
pub mod plate;
pub mod recording;
pub mod time_series;

// Re-export the main types for convenience
pub use background::{BackgroundMetadata, BackgroundRecordingInfo, WellBackground};
pub use plate::{PlateLayout, Point, RoiCoords, WellId};
pub use recording::{BitDepth, RecordingDescriptor, SampleWidth};
pub use time_series::TimeSeriesTable;
