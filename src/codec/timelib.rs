//! interval and timetz codecs. The plain date/time/timestamp types are
//! handled by the generic scalar codec; these two carry structure.

use crate::columnar::{ColumnChunk, ColumnMeta, ColumnOptions, IntervalUnit};
use crate::error::{Error, Result};

use super::{hash_bytes, Datum, DatumCodec};

pub const USECS_PER_DAY: i64 = 86_400_000_000;

/// Months, days and microseconds kept apart, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntervalValue {
    pub time: i64,
    pub day: i32,
    pub month: i32,
}

impl IntervalValue {
    /// Collapse to a single microsecond count on the 30-day-month
    /// convention. Equal intervals compare equal here even when their
    /// field splits differ, so the hash covers this image.
    pub fn comparison_value(&self) -> i128 {
        let frac = self.time % USECS_PER_DAY;
        let days =
            (self.time / USECS_PER_DAY) as i128 + self.day as i128 + self.month as i128 * 30;
        days * USECS_PER_DAY as i128 + frac as i128
    }
}

/// Time of day plus the zone offset it was entered with, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeTzValue {
    pub time: i64,
    pub zone: i32,
}

pub struct IntervalCodec;

impl DatumCodec for IntervalCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        let bytes = match addr {
            None => return Ok(Datum::Null),
            Some(bytes) if bytes.len() >= 16 => bytes,
            Some(_) => {
                return Err(Error::DecodeCorruption("interval datum shorter than 16 bytes".into()));
            }
        };
        let mut t = [0u8; 8];
        t.copy_from_slice(&bytes[..8]);
        let mut d = [0u8; 4];
        d.copy_from_slice(&bytes[8..12]);
        let mut m = [0u8; 4];
        m.copy_from_slice(&bytes[12..16]);
        Ok(Datum::Interval(IntervalValue {
            time: i64::from_ne_bytes(t),
            day: i32::from_ne_bytes(d),
            month: i32::from_ne_bytes(m),
        }))
    }

    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        let unit = match meta.options {
            ColumnOptions::Interval { unit } => unit,
            _ => {
                return Err(Error::DecodeCorruption(
                    "interval column carries no unit metadata".into(),
                ));
            }
        };
        match unit {
            IntervalUnit::YearMonth => Ok(match chunk.fixed_slot(row, 4)? {
                None => Datum::Null,
                Some(slot) => {
                    let mut m = [0u8; 4];
                    m.copy_from_slice(slot);
                    Datum::Interval(IntervalValue {
                        month: i32::from_ne_bytes(m),
                        ..IntervalValue::default()
                    })
                }
            }),
            IntervalUnit::DayTime => Ok(match chunk.fixed_slot(row, 8)? {
                None => Datum::Null,
                Some(slot) => {
                    let mut d = [0u8; 4];
                    d.copy_from_slice(&slot[..4]);
                    let mut t = [0u8; 4];
                    t.copy_from_slice(&slot[4..8]);
                    Datum::Interval(IntervalValue {
                        day: i32::from_ne_bytes(d),
                        time: u32::from_ne_bytes(t) as i64,
                        month: 0,
                    })
                }
            }),
        }
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Interval(value) => {
                if let Some(out) = buffer {
                    out.extend_from_slice(&value.time.to_ne_bytes());
                    out.extend_from_slice(&value.day.to_ne_bytes());
                    out.extend_from_slice(&value.month.to_ne_bytes());
                }
                Ok(16)
            }
            _ => Err(Error::Internal("interval store got a foreign datum".into())),
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Interval(value) => Ok(hash_bytes(&value.comparison_value().to_ne_bytes())),
            _ => Err(Error::Internal("interval hash got a foreign datum".into())),
        }
    }
}

pub struct TimeTzCodec;

impl DatumCodec for TimeTzCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        let bytes = match addr {
            None => return Ok(Datum::Null),
            Some(bytes) if bytes.len() >= 12 => bytes,
            Some(_) => {
                return Err(Error::DecodeCorruption("timetz datum shorter than 12 bytes".into()));
            }
        };
        let mut t = [0u8; 8];
        t.copy_from_slice(&bytes[..8]);
        let mut z = [0u8; 4];
        z.copy_from_slice(&bytes[8..12]);
        Ok(Datum::TimeTz(TimeTzValue {
            time: i64::from_ne_bytes(t),
            zone: i32::from_ne_bytes(z),
        }))
    }

    fn columnar_ref<'a>(
        &self,
        _meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        self.datum_ref(chunk.fixed_slot(row, 12)?)
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        match datum {
            Datum::Null => Ok(0),
            Datum::TimeTz(value) => {
                if let Some(out) = buffer {
                    out.extend_from_slice(&value.time.to_ne_bytes());
                    out.extend_from_slice(&value.zone.to_ne_bytes());
                }
                Ok(12)
            }
            _ => Err(Error::Internal("timetz store got a foreign datum".into())),
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        match datum {
            Datum::Null => Ok(0),
            Datum::TimeTz(value) => {
                let mut image = [0u8; 12];
                image[..8].copy_from_slice(&value.time.to_ne_bytes());
                image[8..].copy_from_slice(&value.zone.to_ne_bytes());
                Ok(hash_bytes(&image))
            }
            _ => Err(Error::Internal("timetz hash got a foreign datum".into())),
        }
    }
}

pub static INTERVAL_CODEC: IntervalCodec = IntervalCodec;
pub static TIMETZ_CODEC: TimeTzCodec = TimeTzCodec;
