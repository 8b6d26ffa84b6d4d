pub mod config;
pub mod container;
pub mod error;
pub mod frame_store;
pub mod logging;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod processing;
pub mod types;
pub mod utils;

pub use config::RunConfig;
pub use error::{Error, Result};
pub use frame_store::FrameStore;
pub use logging::AuditLog;
pub use pipeline::{RunSummary, extract_time_series, run};
pub use processing::CalibrationOutcome;
pub use types::{
    BackgroundRecordingInfo, BitDepth, PlateLayout, Point, RecordingDescriptor, RoiCoords,
    TimeSeriesTable, WellId,
};

#[cfg(feature = "python")]
mod python {
    use crate::{Error, RunConfig, extract_time_series};
    use pyo3::{
        Bound, PyErr, PyResult, pyfunction, pymodule, types::PyModule, types::PyModuleMethods,
        wrap_pyfunction,
    };
    use pyo3_polars::PyDataFrame;
    use std::path::PathBuf;

    impl From<Error> for PyErr {
        fn from(err: Error) -> PyErr {
            match err {
                Error::MissingPath { .. } => {
                    pyo3::exceptions::PyFileNotFoundError::new_err(err.to_string())
                }
                Error::FrameOutOfRange { .. } => {
                    pyo3::exceptions::PyIndexError::new_err(err.to_string())
                }
                Error::Io(_) => pyo3::exceptions::PyOSError::new_err(err.to_string()),
                _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
            }
        }
    }

    /// Extracts per-well time series from a raw recording described by a TOML config.
    ///
    /// Args:
    ///     config_path (str): Path to the run's TOML settings file.
    ///
    /// Returns:
    ///     tuple[polars.DataFrame, bool]: The time series ("time" plus one column
    ///     per well) and whether background subtraction was applied.
    ///
    /// Raises:
    ///     FileNotFoundError: If the config, recording or background inputs are missing.
    ///     ValueError: If the configuration is invalid or the plate formats differ.
    #[pyfunction]
    fn extract_wells_to_py_df(config_path: PathBuf) -> PyResult<(PyDataFrame, bool)> {
        let config = RunConfig::load_from(&config_path)?;
        let (table, calibration) = extract_time_series(&config)?;
        let df = table.to_dataframe().map_err(Error::from)?;
        Ok((
            PyDataFrame(df),
            calibration == crate::CalibrationOutcome::Calibrated,
        ))
    }

    /// The Python module. Its name must match `lib.name` in Cargo.toml.
    #[pymodule]
    fn wellsig(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(extract_wells_to_py_df, m)?)?;
        Ok(())
    }
}
