//! Arbitrary-precision numeric, mapped onto a 128-bit significand.
//!
//! The stored form keeps base-10000 digit groups behind a packed header
//! (short and long variants). Decoding folds the groups into an `i128`
//! significand plus a decimal weight, then strips trailing decimal zeroes
//! so that equal values always share one representation. Values that need
//! more than the significand holds are not evaluated here; the caller
//! falls back to the host.

use crate::columnar::{ColumnChunk, ColumnMeta, ColumnOptions};
use crate::error::{Error, Result};

use super::varlena::{self, Varlena};
use super::{hash_bytes, Datum, DatumCodec};

/// Decimal digits per stored digit group.
const DEC_DIGITS: i32 = 4;
const NBASE: u128 = 10_000;
/// Digit-group capacity of the encoder; 10 groups cover every value a
/// 128-bit significand can hold.
const MAX_GROUPS: usize = 10;

const NUMERIC_SIGN_MASK: u16 = 0xc000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_SHORT: u16 = 0x8000;
const NUMERIC_NAN: u16 = 0xc000;
const NUMERIC_DSCALE_MASK: u16 = 0x3fff;

const SHORT_SIGN_MASK: u16 = 0x2000;
const SHORT_WEIGHT_SIGN: u16 = 0x0040;
const SHORT_WEIGHT_MASK: u16 = 0x003f;

/// A numeric value as the device sees it: `value / 10^weight`.
///
/// Always normalized so the significand carries no trailing decimal
/// zeroes (and zero itself has weight 0); one logical value, one
/// representation, which is what makes the hash usable for joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericValue {
    pub value: i128,
    pub weight: i16,
}

impl NumericValue {
    pub fn normalized(mut value: i128, mut weight: i16) -> Self {
        if value == 0 {
            weight = 0;
        } else {
            while value % 10 == 0 {
                value /= 10;
                weight -= 1;
            }
        }
        NumericValue { value, weight }
    }
}

fn read_u16(bytes: &[u8], off: usize) -> u16 {
    u16::from_ne_bytes([bytes[off], bytes[off + 1]])
}

fn decode_payload(payload: &[u8]) -> Result<NumericValue> {
    if payload.len() < 2 {
        return Err(Error::DecodeCorruption("corrupted numeric header".into()));
    }
    let head = read_u16(payload, 0);
    if head & NUMERIC_SIGN_MASK == NUMERIC_NAN {
        return Err(Error::RequiresFallback("numeric NaN is not device-executable"));
    }

    let (digits_off, weight, negative) = if head & NUMERIC_SHORT != 0 {
        let mut w = (head & SHORT_WEIGHT_MASK) as i32;
        if head & SHORT_WEIGHT_SIGN != 0 {
            w |= !(SHORT_WEIGHT_MASK as i32);
        }
        (2usize, w, head & SHORT_SIGN_MASK != 0)
    } else {
        if payload.len() < 4 {
            return Err(Error::DecodeCorruption("corrupted numeric header".into()));
        }
        let w = read_u16(payload, 2) as i16 as i32;
        (4usize, w, head & NUMERIC_SIGN_MASK == NUMERIC_NEG)
    };

    let ndigits = (payload.len() - digits_off) / 2;
    let mut value: i128 = 0;
    for i in 0..ndigits {
        let dig = read_u16(payload, digits_off + 2 * i) as i16;
        value = value
            .checked_mul(NBASE as i128)
            .and_then(|v| v.checked_add(dig as i128))
            .ok_or(Error::RequiresFallback("numeric value out of range"))?;
    }
    if negative {
        value = -value;
    }
    let weight = DEC_DIGITS * (ndigits as i32 - (weight + 1));
    Ok(NumericValue::normalized(value, weight as i16))
}

fn encode_value(datum: NumericValue, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
    let NumericValue { value, mut weight } = datum;
    let negative = value < 0;
    // dscale in the header reflects the decimal places before group
    // alignment shifts the weight.
    let dscale = (weight.max(0) as u16) & NUMERIC_DSCALE_MASK;

    let mut uval = value.unsigned_abs();
    // Pad the significand so the weight lands on a group boundary.
    let (scale, shift) = match weight % DEC_DIGITS as i16 {
        3 | -1 => (10u128, 1),
        2 | -2 => (100, 2),
        1 | -3 => (1000, 3),
        _ => (1, 0),
    };
    uval = uval
        .checked_mul(scale)
        .ok_or_else(|| Error::CapacityExceeded("numeric significand over 128 bits".into()))?;
    weight += shift;

    let mut groups = [0u16; MAX_GROUPS];
    let mut ndigits = 0usize;
    while uval != 0 {
        if ndigits == MAX_GROUPS {
            return Err(Error::CapacityExceeded(
                "numeric value needs too many digit groups".into(),
            ));
        }
        ndigits += 1;
        groups[MAX_GROUPS - ndigits] = (uval % NBASE) as u16;
        uval /= NBASE;
    }

    let total = varlena::VARHDRSZ + 4 + 2 * ndigits;
    if let Some(out) = buffer {
        let n_header = dscale | if negative { NUMERIC_NEG } else { 0 };
        let n_weight = ndigits as i16 - weight / DEC_DIGITS as i16 - 1;
        out.extend_from_slice(&((total as u32) << 2).to_le_bytes());
        out.extend_from_slice(&n_header.to_ne_bytes());
        out.extend_from_slice(&n_weight.to_ne_bytes());
        for dig in &groups[MAX_GROUPS - ndigits..] {
            out.extend_from_slice(&dig.to_ne_bytes());
        }
    }
    Ok(total)
}

pub struct NumericCodec;

impl DatumCodec for NumericCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        let bytes = match addr {
            None => return Ok(Datum::Null),
            Some(bytes) => bytes,
        };
        match Varlena::parse(bytes)? {
            Varlena::Inline { data } | Varlena::Short { data } => {
                Ok(Datum::Numeric(decode_payload(data)?))
            }
            Varlena::Compressed { .. } | Varlena::External => Err(Error::RequiresFallback(
                "numeric value is compressed or stored out of line",
            )),
        }
    }

    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        let scale = match meta.options {
            ColumnOptions::Decimal { scale } => scale,
            _ => {
                return Err(Error::DecodeCorruption(
                    "numeric column carries no decimal metadata".into(),
                ));
            }
        };
        Ok(match chunk.fixed_slot(row, 16)? {
            None => Datum::Null,
            Some(slot) => {
                let mut raw = [0u8; 16];
                raw.copy_from_slice(slot);
                Datum::Numeric(NumericValue::normalized(i128::from_ne_bytes(raw), scale))
            }
        })
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Numeric(value) => encode_value(*value, buffer),
            _ => Err(Error::Internal("numeric store got a foreign datum".into())),
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Numeric(value) => {
                let mut image = [0u8; 18];
                image[..16].copy_from_slice(&value.value.to_ne_bytes());
                image[16..].copy_from_slice(&value.weight.to_ne_bytes());
                Ok(hash_bytes(&image))
            }
            _ => Err(Error::Internal("numeric hash got a foreign datum".into())),
        }
    }
}

pub static NUMERIC_CODEC: NumericCodec = NumericCodec;
