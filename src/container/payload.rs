//! Zip payload bundling the computed data with the audit trail

use crate::error::{Error, Result};
use crate::logging::AuditLog;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DATA_DIR: &str = "data";
pub const LOG_DIR: &str = "gxp";
pub const DEFAULT_LOG_NAME: &str = "local_analysis.log";

fn stored() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

/// Build the zip archive stored inside a container.
///
/// `data/<file name>` holds the data file. `gxp/<log name>` holds the external
/// instrument log (when given) followed by this run's audit log.
pub fn build_payload(data_path: &Path, external_log: Option<&Path>, audit: &AuditLog) -> Result<Vec<u8>> {
    let data_name = data_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::Config(format!("data path {} has no file name", data_path.display())))?;
    let data = std::fs::read(data_path)?;

    let mut log_text = String::new();
    let log_name = match external_log {
        Some(path) => {
            if !path.exists() {
                return Err(Error::MissingPath {
                    what: "Instrument log file",
                    path: path.to_path_buf(),
                });
            }
            log_text.push_str(&std::fs::read_to_string(path)?);
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_LOG_NAME.to_string())
        }
        None => DEFAULT_LOG_NAME.to_string(),
    };
    log_text.push_str(&audit.contents());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(format!("{}/{}", DATA_DIR, data_name), stored())?;
    zip.write_all(&data)?;
    zip.start_file(format!("{}/{}", LOG_DIR, log_name), stored())?;
    zip.write_all(log_text.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}
