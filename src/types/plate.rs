//! Types for plate positions and the regions of interest drawn around them

use crate::error::{Error, Result};
use bon::Builder;
use serde::Serialize;
use std::fmt;

/// Highest number of well rows a plate can address (A..Z, AA..AF).
pub const MAX_ROWS: usize = 32;

/// Integer pixel coordinate. May be negative when optical offsets push a
/// well past the frame edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Builder)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned rectangle, upper-left inclusive and bottom-right exclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RoiCoords {
    p_ul: Point,
    p_br: Point,
}

impl RoiCoords {
    /// Build a rectangle, rejecting degenerate ones.
    pub fn new(p_ul: Point, p_br: Point) -> Result<Self> {
        if p_ul.x >= p_br.x || p_ul.y >= p_br.y {
            return Err(Error::Config(format!(
                "degenerate ROI: upper-left {} is not above and left of bottom-right {}",
                p_ul, p_br
            )));
        }
        Ok(Self { p_ul, p_br })
    }

    pub fn upper_left(&self) -> Point {
        self.p_ul
    }

    pub fn bottom_right(&self) -> Point {
        self.p_br
    }

    pub fn width(&self) -> i64 {
        self.p_br.x - self.p_ul.x
    }

    pub fn height(&self) -> i64 {
        self.p_br.y - self.p_ul.y
    }
}

impl fmt::Display for RoiCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{UL: {}, BR: {}}}", self.p_ul, self.p_br)
    }
}

/// Row letters for a zero-based row index: 0 -> "A", 25 -> "Z", 26 -> "AA".
pub fn row_name(row: usize) -> Result<String> {
    if row >= MAX_ROWS {
        return Err(Error::Config(format!(
            "well row index {} exceeds the {} addressable rows",
            row, MAX_ROWS
        )));
    }
    let letter = (b'A' + (row % 26) as u8) as char;
    Ok(if row >= 26 {
        format!("A{}", letter)
    } else {
        letter.to_string()
    })
}

/// Plate-wide well name such as "B7" or "AC12".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WellId(String);

impl WellId {
    /// `row` is zero-based, `column` is one-based.
    pub fn new(row: usize, column: usize) -> Result<Self> {
        Ok(Self(format!("{}{}", row_name(row)?, column)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WellId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Mapping from well to ROI, in generation order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlateLayout {
    wells: Vec<(WellId, RoiCoords)>,
}

impl PlateLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a well, rejecting a name that is already present.
    pub fn insert(&mut self, well: WellId, roi: RoiCoords) -> Result<()> {
        if self.get(well.as_str()).is_some() {
            return Err(Error::Config(format!("duplicate well name {}", well)));
        }
        self.wells.push((well, roi));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RoiCoords> {
        self.wells
            .iter()
            .find(|(well, _)| well.as_str() == name)
            .map(|(_, roi)| roi)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WellId, &RoiCoords)> + '_ {
        self.wells.iter().map(|(well, roi)| (well, roi))
    }

    pub fn well_ids(&self) -> impl Iterator<Item = &WellId> + '_ {
        self.wells.iter().map(|(well, _)| well)
    }

    pub fn len(&self) -> usize {
        self.wells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }
}

impl fmt::Display for PlateLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (well, roi)) in self.wells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", well, roi)?;
        }
        f.write_str("}")
    }
}
