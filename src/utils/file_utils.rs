use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Memory-map a recording read-only so frames are paged in on demand
/// instead of loading the whole file into RAM.
pub fn read_binary_file_mmap(path: impl AsRef<Path>) -> io::Result<Mmap> {
    let file = File::open(path)?;
    // Safety: the recording is opened read-only and nothing in the pipeline writes to it
    unsafe { Mmap::map(&file) }
}

/// Hex SHA-256 of a file, read in 8 KiB chunks.
pub fn file_digest(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Log the digest of a produced or consumed file. Failure to hash is logged, not raised.
pub fn log_file_digest(path: impl AsRef<Path>) {
    let path = path.as_ref();
    match file_digest(path) {
        Ok(digest) => tracing::info!(path = %path.display(), sha256 = %digest, "File digest"),
        Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to calculate file digest"),
    }
}
