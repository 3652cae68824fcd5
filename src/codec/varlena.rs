//! Row-format variable-length headers.
//!
//! A variable-length datum starts with either a 4-byte header (total size
//! shifted left two bits, low bits carrying the compression flag) or a
//! 1-byte short header (odd low bit, 7-bit total size). A header byte of
//! exactly 0x01 marks an out-of-line pointer to an externally stored value.

use crate::error::{Error, Result};

/// Size of the regular 4-byte length header.
pub const VARHDRSZ: usize = 4;
/// Size of the short-form 1-byte length header.
pub const VARHDRSZ_SHORT: usize = 1;

/// A parsed variable-length datum image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Varlena<'a> {
    /// Plain 4-byte-header value; `data` is the bare payload.
    Inline { data: &'a [u8] },
    /// Short 1-byte-header value; `data` is the bare payload.
    Short { data: &'a [u8] },
    /// Compressed in-line value. `data` is everything after the 4-byte
    /// header (raw-size word plus compressed bytes); `whole` is the full
    /// image including the header, for verbatim copies.
    Compressed { data: &'a [u8], whole: &'a [u8] },
    /// Pointer to a value stored out of line; no payload is reachable here.
    External,
}

impl<'a> Varlena<'a> {
    /// Parse the header at the start of `bytes` and bound the payload.
    /// Truncated images are a hard decode error.
    pub fn parse(bytes: &'a [u8]) -> Result<Varlena<'a>> {
        let first = *bytes
            .first()
            .ok_or_else(|| Error::DecodeCorruption("empty varlena datum".into()))?;

        if first == 0x01 {
            return Ok(Varlena::External);
        }
        if first & 0x01 == 0x01 {
            let total = ((first >> 1) & 0x7f) as usize;
            if total < VARHDRSZ_SHORT || total > bytes.len() {
                return Err(Error::DecodeCorruption("truncated short varlena".into()));
            }
            return Ok(Varlena::Short {
                data: &bytes[VARHDRSZ_SHORT..total],
            });
        }

        if bytes.len() < VARHDRSZ {
            return Err(Error::DecodeCorruption("truncated varlena header".into()));
        }
        let header = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let total = ((header >> 2) & 0x3fff_ffff) as usize;
        if total < VARHDRSZ || total > bytes.len() {
            return Err(Error::DecodeCorruption("truncated varlena datum".into()));
        }
        if header & 0x03 == 0x02 {
            Ok(Varlena::Compressed {
                data: &bytes[VARHDRSZ..total],
                whole: &bytes[..total],
            })
        } else {
            Ok(Varlena::Inline {
                data: &bytes[VARHDRSZ..total],
            })
        }
    }

    /// Total on-disk size of this image, header included.
    pub fn total_size(&self) -> Option<usize> {
        match self {
            Varlena::Inline { data } => Some(VARHDRSZ + data.len()),
            Varlena::Short { data } => Some(VARHDRSZ_SHORT + data.len()),
            Varlena::Compressed { whole, .. } => Some(whole.len()),
            Varlena::External => None,
        }
    }
}

/// Append a plain 4-byte-header varlena with the given payload.
pub fn write_varlena(out: &mut Vec<u8>, payload: &[u8]) {
    let total = (VARHDRSZ + payload.len()) as u32;
    out.extend_from_slice(&(total << 2).to_le_bytes());
    out.extend_from_slice(payload);
}

/// The serialized size `write_varlena` would produce for a payload.
pub fn stored_size(payload_len: usize) -> usize {
    VARHDRSZ + payload_len
}

/// An in-kernel reference to a variable-length value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarlenaRef<'a> {
    /// The full row-format image, header included; may still be short,
    /// compressed, or external.
    Raw(&'a [u8]),
    /// Bare payload bytes, as handed out by the columnar reader.
    Flat(&'a [u8]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_four_byte_header() {
        let mut buf = Vec::new();
        write_varlena(&mut buf, b"hello");
        match Varlena::parse(&buf).unwrap() {
            Varlena::Inline { data } => assert_eq!(data, b"hello"),
            other => panic!("unexpected form: {:?}", other),
        }
    }

    #[test]
    fn parse_short_header() {
        // 1-byte header: total size 4 (header + "abc"), low bit set
        let buf = [(4u8 << 1) | 0x01, b'a', b'b', b'c'];
        match Varlena::parse(&buf).unwrap() {
            Varlena::Short { data } => assert_eq!(data, b"abc"),
            other => panic!("unexpected form: {:?}", other),
        }
    }

    #[test]
    fn parse_external_marker() {
        let buf = [0x01u8, 18, 0, 0, 0, 0];
        assert_eq!(Varlena::parse(&buf).unwrap(), Varlena::External);
    }

    #[test]
    fn truncated_images_are_corruption() {
        assert!(Varlena::parse(&[]).is_err());
        // 4-byte header claiming 100 bytes in a 6-byte buffer
        let mut buf = Vec::new();
        buf.extend_from_slice(&(100u32 << 2).to_le_bytes());
        buf.extend_from_slice(b"ab");
        assert!(Varlena::parse(&buf).is_err());
    }
}
