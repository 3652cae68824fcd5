pub mod misclib;
pub mod numeric;
pub mod scalar;
pub mod textlib;
pub mod timelib;
pub mod varlena;

use crate::columnar::{ColumnChunk, ColumnMeta};
use crate::error::Result;
use crate::params::ParamBuffer;

pub use misclib::{InetValue, FAMILY_INET, FAMILY_INET6};
pub use numeric::NumericValue;
pub use timelib::{IntervalValue, TimeTzValue};
pub use varlena::VarlenaRef;

/// A single in-kernel value, produced by a codec and owned by the
/// evaluation frame that requested it. Variable-size variants borrow from
/// the buffer they were referenced out of; nothing here is persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum<'a> {
    Null,
    Bool(bool),
    Int1(i8),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    /// Raw half-precision bits; the host has no native 16-bit float.
    Float2(u16),
    Float4(f32),
    Float8(f64),
    Money(i64),
    Date(i32),
    Time(i64),
    TimeTz(TimeTzValue),
    Timestamp(i64),
    TimestampTz(i64),
    Interval(IntervalValue),
    Uuid([u8; 16]),
    MacAddr([u8; 6]),
    Inet(InetValue),
    /// text/varchar/bytea/bpchar payload, row-format or columnar.
    Var(VarlenaRef<'a>),
    Numeric(NumericValue),
}

impl Datum<'_> {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }
}

/// The per-type codec contract: every device-executable base type provides
/// one implementation, reachable through its `TypeDescriptor`.
///
/// `store` serializes back to row format, returning the byte count; when
/// `buffer` is `None` it only computes the size (a dry run). `hash` produces
/// a 32-bit hash over the canonical byte representation, with SQL NULL
/// hashing to 0 by convention.
pub trait DatumCodec: Send + Sync {
    /// Reference a value out of row-format storage. `None` means SQL NULL.
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>>;

    /// Reference a value out of a columnar chunk, honoring the validity
    /// bitmap and validating declared byte widths where the logical type
    /// requires it.
    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>>;

    /// Reference a value out of an external parameter buffer.
    fn param_ref<'a>(&self, params: &'a dyn ParamBuffer, param_id: u32) -> Result<Datum<'a>> {
        self.datum_ref(params.param(param_id))
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize>;

    fn hash(&self, datum: &Datum<'_>) -> Result<u32>;
}

/// 32-bit hash over a byte string (Murmur3-style mixing, fixed seed).
/// Every codec hashes through this so equal canonical byte images always
/// collide on purpose.
pub fn hash_bytes(data: &[u8]) -> u32 {
    const C1: u32 = 0xcc9e2d51;
    const C2: u32 = 0x1b873593;
    let mut h: u32 = 0x9747b28c;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);
        h ^= k;
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let rest = chunks.remainder();
    if !rest.is_empty() {
        let mut k: u32 = 0;
        for (i, &b) in rest.iter().enumerate() {
            k |= (b as u32) << (8 * i);
        }
        k = k.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);
        h ^= k;
    }

    h ^= data.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_bytes(b"int4"), hash_bytes(b"int4"));
        assert_ne!(hash_bytes(b"int4"), hash_bytes(b"int8"));
    }

    #[test]
    fn hash_covers_trailing_bytes() {
        // Inputs differing only in the tail past the last 4-byte chunk
        // must not collide.
        assert_ne!(hash_bytes(b"abcde"), hash_bytes(b"abcdf"));
        assert_ne!(hash_bytes(b"abcd"), hash_bytes(b"abcde"));
    }
}
