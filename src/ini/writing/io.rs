//! File and stream I/O
//!
//! Reads sniff a byte-order mark to pick the decoding (UTF-8 with or
//! without BOM, UTF-16 in either byte order); writes emit UTF-8. Every
//! operation opens, transfers fully, and releases on all exit paths,
//! including parse failure in the callers.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// Decode a byte buffer, honoring a leading byte-order mark.
pub fn decode_bytes(bytes: &[u8]) -> io::Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn decode_utf16(bytes: &[u8], combine: fn([u8; 2]) -> u16) -> io::Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "odd byte count in UTF-16 input",
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| combine([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Read a reader to the end and decode it.
pub fn read_to_string(reader: &mut impl Read) -> io::Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_bytes(&bytes)
}

/// Read and decode a file.
pub fn read_file(path: impl AsRef<Path>) -> io::Result<String> {
    let bytes = fs::read(path)?;
    decode_bytes(&bytes)
}

/// Write text to a file as UTF-8, replacing any existing content.
pub fn write_file(path: impl AsRef<Path>, text: &str) -> io::Result<()> {
    fs::write(path, text.as_bytes())
}

/// Write text to a writer as UTF-8.
pub fn write_to(writer: &mut impl Write, text: &str) -> io::Result<()> {
    writer.write_all(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bom_is_stripped() {
        let bytes = [0xEF, 0xBB, 0xBF, b'x', b'=', b'1'];
        assert_eq!(decode_bytes(&bytes).unwrap(), "x=1");
    }

    #[test]
    fn utf16_le_decodes() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "x=1".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_bytes(&bytes).unwrap(), "x=1");
    }

    #[test]
    fn utf16_be_decodes() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "[a]".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_bytes(&bytes).unwrap(), "[a]");
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(decode_bytes(&[0x80, 0x80]).is_err());
    }
}
