//! The columnar (Arrow-like) reader contract the codecs consume.
//!
//! A chunk holds one column's worth of rows: a validity bitmap, a
//! fixed-width value region, and for variable-size types an offset array
//! into an extra byte region. The layouts are owned by the columnar store;
//! this module only decodes them faithfully.

use crate::error::{Error, Result};

/// Unit encoding of a columnar interval column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// One 32-bit field counting months.
    YearMonth,
    /// Two 32-bit fields: days and sub-day time.
    DayTime,
}

/// Extra per-column type metadata the columnar format carries alongside the
/// value buffers. Unlike row-format types, columnar types can vary in
/// declared width or precision, so codecs validate against this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnOptions {
    None,
    /// Declared element width of a fixed-size binary column.
    FixedSizeBinary { byte_width: usize },
    /// Digits after the decimal point of a decimal column.
    Decimal { scale: i16 },
    Interval { unit: IntervalUnit },
    /// Declared character unit width of a blank-padded char column;
    /// non-positive when the type carries no length limit.
    CharUnit { length: i32 },
}

/// Per-column metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMeta {
    pub options: ColumnOptions,
}

impl ColumnMeta {
    pub fn new(options: ColumnOptions) -> Self {
        ColumnMeta { options }
    }

    pub fn plain() -> Self {
        ColumnMeta {
            options: ColumnOptions::None,
        }
    }
}

/// One column's buffers for a run of rows.
#[derive(Debug, Clone, Copy)]
pub struct ColumnChunk<'a> {
    /// Number of rows in this chunk.
    pub nitems: u32,
    /// Validity bitmap, one bit per row, bit set = value present.
    /// Absent bitmap means every row is present.
    pub nullmap: Option<&'a [u8]>,
    /// Fixed-width value region (element width is the codec's concern).
    pub values: &'a [u8],
    /// Offsets into `extra` for variable-size columns; `nitems + 1` entries.
    pub offsets: Option<&'a [u32]>,
    /// Variable-size payload region.
    pub extra: &'a [u8],
}

impl<'a> ColumnChunk<'a> {
    /// A chunk of fixed-width values with no nulls.
    pub fn fixed(nitems: u32, values: &'a [u8]) -> Self {
        ColumnChunk {
            nitems,
            nullmap: None,
            values,
            offsets: None,
            extra: &[],
        }
    }

    /// A chunk of variable-size values with no nulls.
    pub fn variable(nitems: u32, offsets: &'a [u32], extra: &'a [u8]) -> Self {
        ColumnChunk {
            nitems,
            nullmap: None,
            values: &[],
            offsets: Some(offsets),
            extra,
        }
    }

    pub fn with_nullmap(mut self, nullmap: &'a [u8]) -> Self {
        self.nullmap = Some(nullmap);
        self
    }

    fn is_present(&self, row: u32) -> bool {
        match self.nullmap {
            Some(map) => {
                let byte = (row / 8) as usize;
                byte < map.len() && map[byte] & (1 << (row % 8)) != 0
            }
            None => true,
        }
    }

    /// Locate a fixed-width slot. Returns `None` for a null row; out-of-range
    /// rows and undersized value regions are decode corruption, never an
    /// out-of-bounds read.
    pub fn fixed_slot(&self, row: u32, width: usize) -> Result<Option<&'a [u8]>> {
        if row >= self.nitems {
            return Err(Error::DecodeCorruption(format!(
                "row {} out of range ({} items)",
                row, self.nitems
            )));
        }
        if !self.is_present(row) {
            return Ok(None);
        }
        let start = row as usize * width;
        let end = start + width;
        if end > self.values.len() {
            return Err(Error::DecodeCorruption(
                "columnar value region shorter than declared".into(),
            ));
        }
        Ok(Some(&self.values[start..end]))
    }

    /// Locate a variable-width slot through the offset array.
    pub fn varlena_slot(&self, row: u32) -> Result<Option<&'a [u8]>> {
        if row >= self.nitems {
            return Err(Error::DecodeCorruption(format!(
                "row {} out of range ({} items)",
                row, self.nitems
            )));
        }
        if !self.is_present(row) {
            return Ok(None);
        }
        let offsets = self.offsets.ok_or_else(|| {
            Error::DecodeCorruption("variable-size column has no offset array".into())
        })?;
        if offsets.len() <= row as usize + 1 {
            return Err(Error::DecodeCorruption("columnar offset array truncated".into()));
        }
        let start = offsets[row as usize] as usize;
        let end = offsets[row as usize + 1] as usize;
        if start > end || end > self.extra.len() {
            return Err(Error::DecodeCorruption("columnar offsets out of bounds".into()));
        }
        Ok(Some(&self.extra[start..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullmap_gates_fixed_slots() {
        let values: Vec<u8> = (0..16u8).collect();
        // rows 0 and 2 present, row 1 null
        let chunk = ColumnChunk::fixed(4, &values).with_nullmap(&[0b0000_0101]);
        assert!(chunk.fixed_slot(0, 4).unwrap().is_some());
        assert!(chunk.fixed_slot(1, 4).unwrap().is_none());
        assert!(chunk.fixed_slot(2, 4).unwrap().is_some());
    }

    #[test]
    fn out_of_range_row_is_corruption() {
        let chunk = ColumnChunk::fixed(2, &[0; 8]);
        assert!(chunk.fixed_slot(2, 4).is_err());
    }

    #[test]
    fn varlena_slot_bounds() {
        let extra = b"abcdef";
        let offsets = [0u32, 3, 6];
        let chunk = ColumnChunk::variable(2, &offsets, extra);
        assert_eq!(chunk.varlena_slot(0).unwrap().unwrap(), b"abc");
        assert_eq!(chunk.varlena_slot(1).unwrap().unwrap(), b"def");

        let bad_offsets = [0u32, 3, 99];
        let chunk = ColumnChunk::variable(2, &bad_offsets, extra);
        assert!(chunk.varlena_slot(1).is_err());
    }
}
