//! Per-frame, per-well spatial averaging into a time series

use crate::error::Result;
use crate::frame_store::{Frame, FrameStore};
use crate::types::{PlateLayout, RoiCoords, TimeSeriesTable, WellId};
use ndarray::s;
use rayon::prelude::*;

/// Mean of the samples inside `roi`, clamped to the frame. NaN when the
/// clamped region is empty.
pub fn roi_mean(frame: &Frame, roi: &RoiCoords) -> f64 {
    let (height, width) = frame.dim();
    let clamp = |v: i64, max: usize| v.clamp(0, max as i64) as usize;

    let (y0, y1) = (
        clamp(roi.upper_left().y, height),
        clamp(roi.bottom_right().y, height),
    );
    let (x0, x1) = (
        clamp(roi.upper_left().x, width),
        clamp(roi.bottom_right().x, width),
    );
    if y0 >= y1 || x0 >= x1 {
        return f64::NAN;
    }

    let region = frame.slice(s![y0..y1, x0..x1]);
    let sum: u64 = region.iter().map(|&v| v as u64).sum();
    sum as f64 / region.len() as f64
}

fn well_means(frame: &Frame, rois: &[&RoiCoords]) -> Vec<f64> {
    rois.iter().map(|roi| roi_mean(frame, roi)).collect()
}

/// Transpose per-frame rows into per-well columns.
fn into_table(
    layout: &PlateLayout,
    rows: Vec<Vec<f64>>,
    num_frames: usize,
    fps: f64,
) -> TimeSeriesTable {
    let wells: Vec<(WellId, Vec<f64>)> = layout
        .well_ids()
        .enumerate()
        .map(|(col, well)| (well.clone(), rows.iter().map(|row| row[col]).collect()))
        .collect();
    TimeSeriesTable::new(wells, num_frames, fps)
}

/// Read every frame in order and average each well's ROI.
pub fn extract(store: &FrameStore, layout: &PlateLayout, fps: f64) -> Result<TimeSeriesTable> {
    tracing::info!(
        num_frames = store.num_frames(),
        num_wells = layout.len(),
        "Creating fluorescence time series"
    );

    let rois: Vec<&RoiCoords> = layout.iter().map(|(_, roi)| roi).collect();
    let mut rows = Vec::with_capacity(store.num_frames());
    for (idx, frame) in store.frames().enumerate() {
        rows.push(well_means(&frame?, &rois));
        tracing::trace!(frame = idx, "Frame averaged");
    }

    Ok(into_table(layout, rows, store.num_frames(), fps))
}

/// Same result as [`extract`], with frames decoded and averaged on the rayon
/// pool. Output rows keep frame order.
pub fn extract_parallel(
    store: &FrameStore,
    layout: &PlateLayout,
    fps: f64,
) -> Result<TimeSeriesTable> {
    tracing::info!(
        num_frames = store.num_frames(),
        num_wells = layout.len(),
        "Creating fluorescence time series in parallel"
    );

    let rois: Vec<&RoiCoords> = layout.iter().map(|(_, roi)| roi).collect();
    let rows: Vec<Vec<f64>> = (0..store.num_frames())
        .into_par_iter()
        .map(|idx| store.frame(idx).map(|frame| well_means(&frame, &rois)))
        .collect::<Result<_>>()?;

    Ok(into_table(layout, rows, store.num_frames(), fps))
}
