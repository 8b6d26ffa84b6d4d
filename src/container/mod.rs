//! The `.curi` container: a zip payload behind a weak XOR obfuscation layer

pub mod codec;
pub mod payload;

pub use codec::{decode, encode, encode_with_key, write_container};
pub use payload::build_payload;

use crate::error::Result;
use crate::logging::AuditLog;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Bundle `data_path` and the logs into `<data_path stem>.curi` next to it.
pub fn write_curi_file(
    data_path: &Path,
    external_log: Option<&Path>,
    audit: &AuditLog,
) -> Result<PathBuf> {
    tracing::info!("Writing curi output file");

    let payload = build_payload(data_path, external_log, audit)?;
    let output_path = data_path.with_extension("curi");
    let sink = BufWriter::new(File::create(&output_path)?);
    write_container(payload.as_slice(), sink, rand::random())?;

    Ok(output_path)
}
