//! Per-well intensity traces, one row per frame

use crate::types::plate::WellId;
use polars::prelude::*;

pub const TIME_COLUMN: &str = "time";

/// A "time" column plus one column per well, all of equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    time: Vec<f64>,
    wells: Vec<(WellId, Vec<f64>)>,
}

impl TimeSeriesTable {
    /// Assemble a table from finished well columns. Time is `frame_index / fps`.
    pub fn new(wells: Vec<(WellId, Vec<f64>)>, num_frames: usize, fps: f64) -> Self {
        let time = (0..num_frames).map(|idx| idx as f64 / fps).collect();
        Self { time, wells }
    }

    pub fn num_rows(&self) -> usize {
        self.time.len()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn well(&self, name: &str) -> Option<&[f64]> {
        self.wells
            .iter()
            .find(|(well, _)| well.as_str() == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn well_ids(&self) -> impl Iterator<Item = &WellId> + '_ {
        self.wells.iter().map(|(well, _)| well)
    }

    /// Column names in output order, "time" first.
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once(TIME_COLUMN.to_string())
            .chain(self.wells.iter().map(|(well, _)| well.to_string()))
            .collect()
    }

    /// Subtract a constant from every row of one well. Returns false when the
    /// well is not in the table.
    pub fn subtract_offset(&mut self, name: &str, offset: f64) -> bool {
        match self.wells.iter_mut().find(|(well, _)| well.as_str() == name) {
            Some((_, values)) => {
                values.iter_mut().for_each(|v| *v -= offset);
                true
            }
            None => false,
        }
    }

    /// Convert to a polars DataFrame for the file sinks.
    pub fn to_dataframe(&self) -> Result<DataFrame, PolarsError> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.wells.len() + 1);
        columns.push(Series::new(TIME_COLUMN.into(), &self.time).into());
        for (well, values) in &self.wells {
            columns.push(Series::new(well.as_str().into(), values).into());
        }
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TimeSeriesTable {
        TimeSeriesTable::new(
            vec![
                (WellId::from("A1"), vec![1.0, 2.0, 3.0]),
                (WellId::from("A2"), vec![4.0, 5.0, 6.0]),
            ],
            3,
            2.0,
        )
    }

    #[test]
    fn test_time_column() {
        assert_eq!(table().time(), &[0.0, 0.5, 1.0]);
        assert_eq!(table().column_names(), vec!["time", "A1", "A2"]);
    }

    #[test]
    fn test_subtract_offset() {
        let mut t = table();
        assert!(t.subtract_offset("A2", 1.5));
        assert!(!t.subtract_offset("H12", 1.0));
        assert_eq!(t.well("A2").unwrap(), &[2.5, 3.5, 4.5]);
        assert_eq!(t.well("A1").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_to_dataframe() -> Result<(), PolarsError> {
        let df = table().to_dataframe()?;
        assert_eq!(df.shape(), (3, 3));
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["time", "A1", "A2"]);
        Ok(())
    }
}
