//! text / varchar / bytea / bpchar codecs.
//!
//! text, varchar and bytea are pure byte-copy types: the hash is taken over
//! whatever raw representation is at hand, so a compressed image can still
//! be stored verbatim and hashed. The caller is expected to have detoasted
//! anything it wants hashed by logical content. bpchar needs to trim
//! trailing blanks and therefore refuses representations it cannot look
//! inside.

use crate::columnar::{ColumnChunk, ColumnMeta, ColumnOptions};
use crate::error::{Error, Result};

use super::varlena::{self, Varlena, VarlenaRef};
use super::{hash_bytes, Datum, DatumCodec};

/// Length of the longest prefix not ending in a space byte.
fn bpchar_truelen(data: &[u8]) -> usize {
    let mut len = data.len();
    while len > 0 && data[len - 1] == b' ' {
        len -= 1;
    }
    len
}

fn expect_var<'a>(datum: &Datum<'a>, name: &'static str) -> Result<VarlenaRef<'a>> {
    match datum {
        Datum::Var(vref) => Ok(*vref),
        _ => Err(Error::Internal(format!("{} codec got a foreign datum", name))),
    }
}

/// Byte-copy variable-length codec shared by text, varchar and bytea.
pub struct VarlenaCodec;

impl DatumCodec for VarlenaCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        match addr {
            None => Ok(Datum::Null),
            Some(bytes) => {
                // Validate the header and bound the image to its declared size.
                let parsed = Varlena::parse(bytes)?;
                let raw = match parsed.total_size() {
                    Some(total) => &bytes[..total],
                    None => bytes,
                };
                Ok(Datum::Var(VarlenaRef::Raw(raw)))
            }
        }
    }

    fn columnar_ref<'a>(
        &self,
        _meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        Ok(match chunk.varlena_slot(row)? {
            Some(data) => Datum::Var(VarlenaRef::Flat(data)),
            None => Datum::Null,
        })
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        if datum.is_null() {
            return Ok(0);
        }
        match expect_var(datum, "varlena")? {
            VarlenaRef::Flat(data) => {
                if let Some(out) = buffer {
                    varlena::write_varlena(out, data);
                }
                Ok(varlena::stored_size(data.len()))
            }
            VarlenaRef::Raw(raw) => match Varlena::parse(raw)? {
                Varlena::Inline { data } | Varlena::Short { data } => {
                    if let Some(out) = buffer {
                        varlena::write_varlena(out, data);
                    }
                    Ok(varlena::stored_size(data.len()))
                }
                // Verbatim copy keeps the compressed image intact.
                Varlena::Compressed { whole, .. } => {
                    if let Some(out) = buffer {
                        out.extend_from_slice(whole);
                    }
                    Ok(whole.len())
                }
                Varlena::External => {
                    Err(Error::RequiresFallback("varlena datum is stored out of line"))
                }
            },
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        if datum.is_null() {
            return Ok(0);
        }
        match expect_var(datum, "varlena")? {
            VarlenaRef::Flat(data) => Ok(hash_bytes(data)),
            VarlenaRef::Raw(raw) => match Varlena::parse(raw)? {
                Varlena::Inline { data }
                | Varlena::Short { data }
                | Varlena::Compressed { data, .. } => Ok(hash_bytes(data)),
                Varlena::External => {
                    Err(Error::RequiresFallback("varlena datum is stored out of line"))
                }
            },
        }
    }
}

/// Blank-padded char: trailing spaces are insignificant, so both store and
/// hash work on the trimmed prefix.
pub struct BpcharCodec;

impl BpcharCodec {
    fn trimmed<'a>(&self, vref: VarlenaRef<'a>) -> Result<&'a [u8]> {
        let data = match vref {
            VarlenaRef::Flat(data) => data,
            VarlenaRef::Raw(raw) => match Varlena::parse(raw)? {
                Varlena::Inline { data } | Varlena::Short { data } => data,
                Varlena::Compressed { .. } | Varlena::External => {
                    return Err(Error::RequiresFallback(
                        "bpchar datum is compressed or stored out of line",
                    ));
                }
            },
        };
        Ok(&data[..bpchar_truelen(data)])
    }
}

impl DatumCodec for BpcharCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        VarlenaCodec.datum_ref(addr)
    }

    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        let unit = match meta.options {
            ColumnOptions::CharUnit { length } => length,
            _ => {
                return Err(Error::DecodeCorruption(
                    "bpchar column lacks a character unit width".into(),
                ));
            }
        };
        if unit <= 0 {
            return Ok(Datum::Null);
        }
        Ok(match chunk.fixed_slot(row, unit as usize)? {
            Some(data) => Datum::Var(VarlenaRef::Flat(&data[..bpchar_truelen(data)])),
            None => Datum::Null,
        })
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        if datum.is_null() {
            return Ok(0);
        }
        let data = self.trimmed(expect_var(datum, "bpchar")?)?;
        if let Some(out) = buffer {
            varlena::write_varlena(out, data);
        }
        Ok(varlena::stored_size(data.len()))
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        if datum.is_null() {
            return Ok(0);
        }
        Ok(hash_bytes(self.trimmed(expect_var(datum, "bpchar")?)?))
    }
}

pub static VARLENA_CODEC: VarlenaCodec = VarlenaCodec;
pub static BPCHAR_CODEC: BpcharCodec = BpcharCodec;

#[cfg(test)]
mod tests {
    use super::*;

    fn row_image(payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        varlena::write_varlena(&mut buf, payload);
        buf
    }

    #[test]
    fn text_ref_store_hash() {
        let image = row_image(b"hello");
        let datum = VARLENA_CODEC.datum_ref(Some(&image)).unwrap();

        let mut out = Vec::new();
        let n = VARLENA_CODEC.store(&datum, Some(&mut out)).unwrap();
        assert_eq!(n, image.len());
        assert_eq!(out, image);

        // Row-format and columnar references hash identically.
        let flat = Datum::Var(VarlenaRef::Flat(b"hello"));
        assert_eq!(
            VARLENA_CODEC.hash(&datum).unwrap(),
            VARLENA_CODEC.hash(&flat).unwrap()
        );
    }

    #[test]
    fn short_form_is_normalized_on_store() {
        let image = [(5u8 << 1) | 0x01, b'a', b'b', b'c', b'd'];
        let datum = VARLENA_CODEC.datum_ref(Some(&image)).unwrap();
        let mut out = Vec::new();
        let n = VARLENA_CODEC.store(&datum, Some(&mut out)).unwrap();
        assert_eq!(n, 8);
        assert_eq!(out, row_image(b"abcd"));
    }

    #[test]
    fn external_text_requires_fallback() {
        let image = [0x01u8, 18, 0, 0, 0, 0];
        let datum = VARLENA_CODEC.datum_ref(Some(&image)).unwrap();
        assert!(VARLENA_CODEC.hash(&datum).unwrap_err().is_fallback());
        assert!(VARLENA_CODEC.store(&datum, None).unwrap_err().is_fallback());
    }

    #[test]
    fn bpchar_trims_trailing_spaces() {
        let padded_image = row_image(b"AB  ");
        let bare_image = row_image(b"AB");
        let padded = VARLENA_CODEC.datum_ref(Some(&padded_image)).unwrap();
        let bare = VARLENA_CODEC.datum_ref(Some(&bare_image)).unwrap();

        assert_eq!(
            BPCHAR_CODEC.hash(&padded).unwrap(),
            BPCHAR_CODEC.hash(&bare).unwrap()
        );

        let mut padded_out = Vec::new();
        let mut bare_out = Vec::new();
        let n1 = BPCHAR_CODEC.store(&padded, Some(&mut padded_out)).unwrap();
        let n2 = BPCHAR_CODEC.store(&bare, Some(&mut bare_out)).unwrap();
        assert_eq!(n1, n2);
        assert_eq!(padded_out, bare_out);
    }

    #[test]
    fn bpchar_interior_spaces_survive() {
        let image = row_image(b"A B ");
        let datum = VARLENA_CODEC.datum_ref(Some(&image)).unwrap();
        let mut out = Vec::new();
        BPCHAR_CODEC.store(&datum, Some(&mut out)).unwrap();
        assert_eq!(out, row_image(b"A B"));
    }

    #[test]
    fn bpchar_all_spaces_trims_to_empty() {
        let image = row_image(b"   ");
        let datum = VARLENA_CODEC.datum_ref(Some(&image)).unwrap();
        assert_eq!(BPCHAR_CODEC.store(&datum, None).unwrap(), 4);
    }

    #[test]
    fn bpchar_columnar_trims_at_reference_time() {
        let values = b"AB  CD  ";
        let chunk = ColumnChunk::fixed(2, values);
        let meta = ColumnMeta::new(ColumnOptions::CharUnit { length: 4 });
        let datum = BPCHAR_CODEC.columnar_ref(&meta, &chunk, 0).unwrap();
        assert_eq!(datum, Datum::Var(VarlenaRef::Flat(b"AB")));
    }
}
