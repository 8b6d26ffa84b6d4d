//! XOR-obfuscated container encoding
//!
//! This is obfuscation, not encryption: the key is stored in clear in the
//! header and anyone can reverse it. It exists so instrument output cannot be
//! casually edited, and must stay byte-compatible with existing readers.

use crate::error::{Error, Result};
use crate::parser::parse_container_header;
use std::io::{self, Read, Write};

pub const MAGIC: &[u8; 4] = b"CURI";
pub const TAG: &[u8; 4] = b"NAUT";
pub const VERSION: [u8; 4] = [0, 1, 0, 0];
pub const HEADER_LEN: usize = 16;
/// Payload is XORed chunk by chunk; the keystream restarts at every chunk.
pub const CHUNK_SIZE: usize = 1 << 16;

/// XOR `data` with the big-endian key bytes repeated from index 0.
pub fn xor_with_key(data: &mut [u8], key: u32) {
    let key_bytes = key.to_be_bytes();
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key_bytes[i % 4];
    }
}

fn header(key: u32) -> [u8; HEADER_LEN] {
    let mut out = [0u8; HEADER_LEN];
    out[0..4].copy_from_slice(MAGIC);
    out[4..8].copy_from_slice(&key.to_be_bytes());
    out[8..12].copy_from_slice(TAG);
    out[12..16].copy_from_slice(&VERSION);
    xor_with_key(&mut out[8..16], key);
    out
}

/// Encode `payload` with a freshly drawn random key.
pub fn encode(payload: &[u8]) -> Vec<u8> {
    encode_with_key(payload, rand::random())
}

pub fn encode_with_key(payload: &[u8], key: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&header(key));
    for chunk in payload.chunks(CHUNK_SIZE) {
        let start = out.len();
        out.extend_from_slice(chunk);
        xor_with_key(&mut out[start..], key);
    }
    out
}

/// Stream `payload` into `sink` as a container. Returns the payload length.
pub fn write_container<R: Read, W: Write>(mut payload: R, mut sink: W, key: u32) -> io::Result<u64> {
    sink.write_all(&header(key))?;

    let mut total = 0u64;
    let mut chunk = Vec::with_capacity(CHUNK_SIZE);
    loop {
        chunk.clear();
        // Fill whole chunks so the keystream stays aligned with the payload offset
        let n = payload
            .by_ref()
            .take(CHUNK_SIZE as u64)
            .read_to_end(&mut chunk)?;
        if n == 0 {
            break;
        }
        xor_with_key(&mut chunk, key);
        sink.write_all(&chunk)?;
        total += n as u64;
    }
    sink.flush()?;
    Ok(total)
}

/// Recover the payload of a container, checking the header first.
pub fn decode(container: &[u8]) -> Result<Vec<u8>> {
    let mut input = container;
    let header = parse_container_header(&mut input)
        .map_err(|e| Error::InvalidContainer(format!("truncated header: {:?}", e)))?;

    if &header.magic != MAGIC {
        return Err(Error::InvalidContainer(format!(
            "bad magic {:?}",
            String::from_utf8_lossy(&header.magic)
        )));
    }

    let mut tag = header.tag;
    xor_with_key(&mut tag, header.key);
    if &tag != TAG {
        return Err(Error::InvalidContainer(
            "format tag does not match key".to_string(),
        ));
    }

    let mut version = header.version;
    xor_with_key(&mut version, header.key);
    if version != VERSION {
        return Err(Error::InvalidContainer(format!(
            "unsupported version {:?}",
            version
        )));
    }

    let mut payload = input.to_vec();
    for chunk in payload.chunks_mut(CHUNK_SIZE) {
        xor_with_key(chunk, header.key);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let out = encode_with_key(&[], 0x0102_0304);
        assert_eq!(out.len(), HEADER_LEN);
        assert_eq!(&out[0..4], b"CURI");
        assert_eq!(&out[4..8], &[1, 2, 3, 4]);
        assert_eq!(&out[8..12], &[b'N' ^ 1, b'A' ^ 2, b'U' ^ 3, b'T' ^ 4]);
        assert_eq!(&out[12..16], &[1, 3, 3, 4]);
    }

    #[test]
    fn test_payload_keystream_follows_offset() {
        let payload = [0u8; 9];
        let out = encode_with_key(&payload, 0xdead_beef);
        assert_eq!(
            &out[HEADER_LEN..],
            &[0xde, 0xad, 0xbe, 0xef, 0xde, 0xad, 0xbe, 0xef, 0xde]
        );
    }

    #[test]
    fn test_round_trip_sizes() -> Result<()> {
        let large: Vec<u8> = (0..(CHUNK_SIZE * 2 + 5)).map(|i| (i % 253) as u8).collect();
        for payload in [Vec::new(), vec![0x5a], large] {
            let container = encode(&payload);
            assert_eq!(container.len(), HEADER_LEN + payload.len());
            assert_eq!(decode(&container)?, payload);
        }
        Ok(())
    }

    #[test]
    fn test_streaming_matches_in_memory() -> io::Result<()> {
        let payload: Vec<u8> = (0..(CHUNK_SIZE + 3)).map(|i| (i * 31 % 256) as u8).collect();
        let mut streamed = Vec::new();
        let written = write_container(&payload[..], &mut streamed, 0x1234_5678)?;
        assert_eq!(written, payload.len() as u64);
        assert_eq!(streamed, encode_with_key(&payload, 0x1234_5678));
        Ok(())
    }

    #[test]
    fn test_decode_rejects_bad_headers() {
        assert!(matches!(decode(b"CURI"), Err(Error::InvalidContainer(_))));

        let mut bad_magic = encode_with_key(b"data", 7);
        bad_magic[0] = b'X';
        assert!(matches!(decode(&bad_magic), Err(Error::InvalidContainer(_))));

        let mut bad_tag = encode_with_key(b"data", 7);
        bad_tag[8] ^= 0xff;
        assert!(matches!(decode(&bad_tag), Err(Error::InvalidContainer(_))));
    }
}
