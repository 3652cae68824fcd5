//! Fixed-width scalar codecs.
//!
//! All scalars of 1/2/4/8 bytes share one generic implementation; the
//! per-type kind marker only says how to move the native value in and out
//! of a `Datum` variant. Selection happens through the static type table,
//! so there is exactly one codec instance per logical type.

use std::marker::PhantomData;

use crate::columnar::{ColumnChunk, ColumnMeta};
use crate::error::{Error, Result};

use super::{hash_bytes, Datum, DatumCodec};

pub trait ScalarKind: Send + Sync + 'static {
    const WIDTH: usize;
    const NAME: &'static str;

    /// Read the native value from the first `WIDTH` bytes.
    fn read(bytes: &[u8]) -> Datum<'static>;

    /// Canonical byte image of a datum of this kind, or `None` when the
    /// datum is of a different kind.
    fn encode(datum: &Datum<'_>) -> Option<([u8; 8], usize)>;
}

macro_rules! scalar_kind {
    ($kind:ident, $name:literal, $variant:ident, $ty:ty) => {
        pub struct $kind;

        impl ScalarKind for $kind {
            const WIDTH: usize = std::mem::size_of::<$ty>();
            const NAME: &'static str = $name;

            fn read(bytes: &[u8]) -> Datum<'static> {
                let mut buf = [0u8; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..Self::WIDTH]);
                Datum::$variant(<$ty>::from_ne_bytes(buf))
            }

            fn encode(datum: &Datum<'_>) -> Option<([u8; 8], usize)> {
                match datum {
                    Datum::$variant(v) => {
                        let mut out = [0u8; 8];
                        out[..Self::WIDTH].copy_from_slice(&v.to_ne_bytes());
                        Some((out, Self::WIDTH))
                    }
                    _ => None,
                }
            }
        }
    };
}

scalar_kind!(Int1Kind, "int1", Int1, i8);
scalar_kind!(Int2Kind, "int2", Int2, i16);
scalar_kind!(Int4Kind, "int4", Int4, i32);
scalar_kind!(Int8Kind, "int8", Int8, i64);
scalar_kind!(Float2Kind, "float2", Float2, u16);
scalar_kind!(Float4Kind, "float4", Float4, f32);
scalar_kind!(Float8Kind, "float8", Float8, f64);
scalar_kind!(MoneyKind, "money", Money, i64);
scalar_kind!(DateKind, "date", Date, i32);
scalar_kind!(TimeKind, "time", Time, i64);
scalar_kind!(TimestampKind, "timestamp", Timestamp, i64);
scalar_kind!(TimestampTzKind, "timestamptz", TimestampTz, i64);

/// bool is stored as a single byte but surfaces as a real `bool`.
pub struct BoolKind;

impl ScalarKind for BoolKind {
    const WIDTH: usize = 1;
    const NAME: &'static str = "bool";

    fn read(bytes: &[u8]) -> Datum<'static> {
        Datum::Bool(bytes[0] != 0)
    }

    fn encode(datum: &Datum<'_>) -> Option<([u8; 8], usize)> {
        match datum {
            Datum::Bool(v) => {
                let mut out = [0u8; 8];
                out[0] = *v as u8;
                Some((out, 1))
            }
            _ => None,
        }
    }
}

pub struct ScalarCodec<K: ScalarKind>(PhantomData<K>);

impl<K: ScalarKind> ScalarCodec<K> {
    pub const fn new() -> Self {
        ScalarCodec(PhantomData)
    }
}

impl<K: ScalarKind> DatumCodec for ScalarCodec<K> {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        match addr {
            None => Ok(Datum::Null),
            Some(bytes) if bytes.len() >= K::WIDTH => Ok(K::read(bytes)),
            Some(_) => Err(Error::DecodeCorruption(format!(
                "{} datum shorter than {} bytes",
                K::NAME,
                K::WIDTH
            ))),
        }
    }

    fn columnar_ref<'a>(
        &self,
        _meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        self.datum_ref(chunk.fixed_slot(row, K::WIDTH)?)
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        if datum.is_null() {
            return Ok(0);
        }
        let (bytes, width) = K::encode(datum)
            .ok_or_else(|| Error::Internal(format!("{} store got a foreign datum", K::NAME)))?;
        if let Some(out) = buffer {
            out.extend_from_slice(&bytes[..width]);
        }
        Ok(width)
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        if datum.is_null() {
            return Ok(0);
        }
        let (bytes, width) = K::encode(datum)
            .ok_or_else(|| Error::Internal(format!("{} hash got a foreign datum", K::NAME)))?;
        Ok(hash_bytes(&bytes[..width]))
    }
}

pub static BOOL_CODEC: ScalarCodec<BoolKind> = ScalarCodec::new();
pub static INT1_CODEC: ScalarCodec<Int1Kind> = ScalarCodec::new();
pub static INT2_CODEC: ScalarCodec<Int2Kind> = ScalarCodec::new();
pub static INT4_CODEC: ScalarCodec<Int4Kind> = ScalarCodec::new();
pub static INT8_CODEC: ScalarCodec<Int8Kind> = ScalarCodec::new();
pub static FLOAT2_CODEC: ScalarCodec<Float2Kind> = ScalarCodec::new();
pub static FLOAT4_CODEC: ScalarCodec<Float4Kind> = ScalarCodec::new();
pub static FLOAT8_CODEC: ScalarCodec<Float8Kind> = ScalarCodec::new();
pub static MONEY_CODEC: ScalarCodec<MoneyKind> = ScalarCodec::new();
pub static DATE_CODEC: ScalarCodec<DateKind> = ScalarCodec::new();
pub static TIME_CODEC: ScalarCodec<TimeKind> = ScalarCodec::new();
pub static TIMESTAMP_CODEC: ScalarCodec<TimestampKind> = ScalarCodec::new();
pub static TIMESTAMPTZ_CODEC: ScalarCodec<TimestampTzKind> = ScalarCodec::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int4_ref_store_roundtrip() {
        let stored = 1234i32.to_ne_bytes();
        let datum = INT4_CODEC.datum_ref(Some(&stored)).unwrap();
        assert_eq!(datum, Datum::Int4(1234));

        let mut out = Vec::new();
        let n = INT4_CODEC.store(&datum, Some(&mut out)).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, stored);
    }

    #[test]
    fn null_hashes_to_zero_and_stores_nothing() {
        assert_eq!(INT8_CODEC.hash(&Datum::Null).unwrap(), 0);
        assert_eq!(INT8_CODEC.store(&Datum::Null, None).unwrap(), 0);
    }

    #[test]
    fn dry_run_store_reports_width() {
        assert_eq!(INT2_CODEC.store(&Datum::Int2(7), None).unwrap(), 2);
        assert_eq!(BOOL_CODEC.store(&Datum::Bool(true), None).unwrap(), 1);
    }

    #[test]
    fn short_buffer_is_corruption() {
        assert!(INT8_CODEC.datum_ref(Some(&[1, 2, 3])).is_err());
    }

    #[test]
    fn foreign_datum_is_internal_error() {
        assert!(INT4_CODEC.store(&Datum::Int8(1), None).is_err());
    }

    #[test]
    fn columnar_ref_honors_nullmap() {
        let values: Vec<u8> = [10i32, 20, 30]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let chunk = ColumnChunk::fixed(3, &values).with_nullmap(&[0b0000_0101]);
        let meta = ColumnMeta::plain();
        assert_eq!(
            INT4_CODEC.columnar_ref(&meta, &chunk, 0).unwrap(),
            Datum::Int4(10)
        );
        assert_eq!(
            INT4_CODEC.columnar_ref(&meta, &chunk, 1).unwrap(),
            Datum::Null
        );
        assert_eq!(
            INT4_CODEC.columnar_ref(&meta, &chunk, 2).unwrap(),
            Datum::Int4(30)
        );
    }
}
