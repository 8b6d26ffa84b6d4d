//! Placement of one ROI per well from the stage tiling parameters

use crate::error::{Error, Result};
use crate::types::plate::MAX_ROWS;
use crate::types::{PlateLayout, Point, RoiCoords, WellId};
use bon::Builder;
use itertools::iproduct;

/// Stage tiling and optics, already scaled to the recording's pixel grid.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct GeometryParams {
    /// Number of tiles stacked vertically.
    pub rows: usize,
    /// Number of tiles side by side.
    pub cols: usize,
    pub num_wells_h: usize,
    pub num_wells_v: usize,
    /// Physical distance between well centers, same unit as `px_size`.
    pub well_spacing: f64,
    pub px_size: f64,
    pub roi_size_x: f64,
    pub roi_size_y: f64,
    /// Tile width in pixels.
    pub width: f64,
    /// Tile height in pixels.
    pub height: f64,
    #[builder(default)]
    pub h_offset: f64,
    #[builder(default)]
    pub v_offset: f64,
}

/// Compute the ROI of every well across all tiles.
///
/// Wells are named plate-wide: tile `(tile_v, tile_h)` contributes rows
/// starting at `tile_v * num_wells_v` and columns starting at
/// `tile_h * num_wells_h + 1`. Overlapping ROIs are not detected here.
pub fn compute_rois(params: &GeometryParams) -> Result<PlateLayout> {
    tracing::info!("Creating ROIs");

    if params.rows * params.num_wells_v > MAX_ROWS {
        return Err(Error::Config(format!(
            "{} tile rows of {} wells exceed the {} addressable plate rows",
            params.rows, params.num_wells_v, MAX_ROWS
        )));
    }
    if params.px_size <= 0.0 {
        return Err(Error::Config(format!(
            "pixel size must be positive, got {}",
            params.px_size
        )));
    }

    let spacing_px = params.well_spacing / params.px_size;
    let half_wells_h = (params.num_wells_h as f64 - 1.0) / 2.0;
    let half_wells_v = (params.num_wells_v as f64 - 1.0) / 2.0;

    let mut layout = PlateLayout::new();

    for (tile_v, tile_h, well_v, well_h) in iproduct!(
        0..params.rows,
        0..params.cols,
        0..params.num_wells_v,
        0..params.num_wells_h
    ) {
        let x_center = params.width / 2.0 - (half_wells_h - well_h as f64) * spacing_px
            + tile_h as f64 * params.width
            + params.h_offset;
        let y_center = params.height / 2.0 - (half_wells_v - well_v as f64) * spacing_px
            + tile_v as f64 * params.height
            + params.v_offset;

        // `as i64` truncates toward zero
        let p_ul = Point {
            x: (x_center - params.roi_size_x / 2.0) as i64,
            y: (y_center - params.roi_size_y / 2.0) as i64,
        };
        let p_br = Point {
            x: (x_center + params.roi_size_x / 2.0) as i64,
            y: (y_center + params.roi_size_y / 2.0) as i64,
        };

        let well = WellId::new(
            well_v + tile_v * params.num_wells_v,
            well_h + tile_h * params.num_wells_h + 1,
        )?;
        let roi = RoiCoords::new(p_ul, p_br)
            .map_err(|e| Error::Config(format!("well {}: {}", well, e)))?;
        layout.insert(well, roi)?;
    }

    tracing::info!(rois = %layout, "ROIs");

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn params_24_well() -> GeometryParams {
        GeometryParams::builder()
            .rows(1)
            .cols(1)
            .num_wells_h(6)
            .num_wells_v(4)
            .well_spacing(9.0)
            .px_size(0.5)
            .roi_size_x(10.0)
            .roi_size_y(8.0)
            .width(200.0)
            .height(150.0)
            .build()
    }

    #[test]
    fn test_single_tile_centers() -> Result<()> {
        let layout = compute_rois(&params_24_well())?;
        assert_eq!(layout.len(), 24);

        // A1 center: x = 100 - 2.5 * 18 = 55, y = 75 - 1.5 * 18 = 48
        let a1 = layout.get("A1").unwrap();
        assert_eq!(a1.upper_left(), Point { x: 50, y: 44 });
        assert_eq!(a1.bottom_right(), Point { x: 60, y: 52 });
        assert_eq!((a1.width(), a1.height()), (10, 8));

        // D6 center: x = 100 + 2.5 * 18 = 145, y = 75 + 1.5 * 18 = 102
        let d6 = layout.get("D6").unwrap();
        assert_eq!(d6.upper_left(), Point { x: 140, y: 98 });
        assert_eq!(d6.bottom_right(), Point { x: 150, y: 106 });
        Ok(())
    }

    #[test]
    fn test_offsets_and_truncation() -> Result<()> {
        let params = GeometryParams::builder()
            .rows(1)
            .cols(1)
            .num_wells_h(1)
            .num_wells_v(1)
            .well_spacing(1.0)
            .px_size(1.0)
            .roi_size_x(3.0)
            .roi_size_y(3.0)
            .width(10.0)
            .height(10.0)
            .h_offset(-4.0)
            .v_offset(2.0)
            .build();
        let layout = compute_rois(&params)?;
        // x center 1.0: 1 - 1.5 = -0.5 truncates to 0, 1 + 1.5 = 2.5 truncates to 2
        let a1 = layout.get("A1").unwrap();
        assert_eq!(a1.upper_left(), Point { x: 0, y: 5 });
        assert_eq!(a1.bottom_right(), Point { x: 2, y: 8 });
        assert_eq!((a1.width(), a1.height()), (2, 3));
        Ok(())
    }

    #[test]
    fn test_tiles_form_one_plate_grid() -> Result<()> {
        let params = GeometryParams {
            rows: 2,
            cols: 3,
            ..params_24_well()
        };
        let layout = compute_rois(&params)?;
        assert_eq!(layout.len(), 2 * 3 * 24);

        let names: HashSet<&str> = layout.well_ids().map(|w| w.as_str()).collect();
        assert_eq!(names.len(), layout.len());
        assert!(names.contains("A1"));
        assert!(names.contains("H18"));
        assert!(!names.contains("I1"));
        assert!(!names.contains("A19"));

        // E7 is the first well of tile (1, 1): shifted by one tile in each direction from A1
        let a1 = layout.get("A1").unwrap();
        let e7 = layout.get("E7").unwrap();
        assert_eq!(e7.upper_left().x - a1.upper_left().x, 200);
        assert_eq!(e7.upper_left().y - a1.upper_left().y, 150);
        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<()> {
        let params = GeometryParams {
            rows: 2,
            cols: 2,
            ..params_24_well()
        };
        assert_eq!(compute_rois(&params)?, compute_rois(&params)?);
        Ok(())
    }

    #[test]
    fn test_too_many_rows_rejected() {
        let params = GeometryParams {
            rows: 3,
            num_wells_v: 16,
            ..params_24_well()
        };
        assert!(matches!(compute_rois(&params), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_sized_roi_rejected() {
        let params = GeometryParams {
            roi_size_x: 0.0,
            ..params_24_well()
        };
        assert!(compute_rois(&params).is_err());
    }
}
