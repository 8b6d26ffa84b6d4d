use winnow::{Parser, binary::be_u32, error::ContextError, token::take};

/// The fixed 16-byte prefix of a container file, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub magic: [u8; 4],
    pub key: u32,
    /// Obfuscated format tag, still XORed with the key.
    pub tag: [u8; 4],
    /// Obfuscated format version, still XORed with the key.
    pub version: [u8; 4],
}

fn four_bytes(input: &mut &[u8]) -> Result<[u8; 4], ContextError> {
    let bytes = take::<_, _, ContextError>(4usize).parse_next(input)?;
    let mut out = [0u8; 4];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Parses the container header.
///
/// The header layout is as follows:
/// - 4 bytes: ASCII magic
/// - 1 big-endian u32: XOR key, in clear
/// - 4 bytes: format tag XOR key
/// - 4 bytes: format version XOR key
pub fn parse_container_header(input: &mut &[u8]) -> Result<ContainerHeader, ContextError> {
    let magic = four_bytes(input)?;
    let key = be_u32::<_, ContextError>.parse_next(input)?;
    let tag = four_bytes(input)?;
    let version = four_bytes(input)?;

    Ok(ContainerHeader {
        magic,
        key,
        tag,
        version,
    })
}
