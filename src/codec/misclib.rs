//! uuid / macaddr / inet codecs.

use crate::columnar::{ColumnChunk, ColumnMeta, ColumnOptions};
use crate::error::{Error, Result};

use super::varlena::{self, Varlena};
use super::{hash_bytes, Datum, DatumCodec};

pub const FAMILY_INET: u8 = 2;
pub const FAMILY_INET6: u8 = 3;

/// A network address as stored: family tag, netmask bits, and up to 16
/// address bytes (4 used for IPv4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InetValue {
    pub family: u8,
    pub bits: u8,
    pub addr: [u8; 16],
}

impl InetValue {
    /// Address byte count for the family, or `None` for an unknown tag.
    pub fn addr_size(&self) -> Option<usize> {
        match self.family {
            FAMILY_INET => Some(4),
            FAMILY_INET6 => Some(16),
            _ => None,
        }
    }
}

fn fixed_binary_width(meta: &ColumnMeta, type_name: &'static str) -> Result<usize> {
    match meta.options {
        ColumnOptions::FixedSizeBinary { byte_width } => Ok(byte_width),
        _ => Err(Error::DecodeCorruption(format!(
            "{} column is not fixed-size binary",
            type_name
        ))),
    }
}

pub struct UuidCodec;

impl DatumCodec for UuidCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        match addr {
            None => Ok(Datum::Null),
            Some(bytes) if bytes.len() >= 16 => {
                let mut id = [0u8; 16];
                id.copy_from_slice(&bytes[..16]);
                Ok(Datum::Uuid(id))
            }
            Some(_) => Err(Error::DecodeCorruption("uuid datum shorter than 16 bytes".into())),
        }
    }

    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        let width = fixed_binary_width(meta, "uuid")?;
        if width != 16 {
            return Err(Error::DecodeCorruption(format!(
                "uuid column has byte width {}, expected 16",
                width
            )));
        }
        self.datum_ref(chunk.fixed_slot(row, 16)?)
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Uuid(id) => {
                if let Some(out) = buffer {
                    out.extend_from_slice(id);
                }
                Ok(16)
            }
            _ => Err(Error::Internal("uuid store got a foreign datum".into())),
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Uuid(id) => Ok(hash_bytes(id)),
            _ => Err(Error::Internal("uuid hash got a foreign datum".into())),
        }
    }
}

pub struct MacAddrCodec;

impl DatumCodec for MacAddrCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        match addr {
            None => Ok(Datum::Null),
            Some(bytes) if bytes.len() >= 6 => {
                let mut mac = [0u8; 6];
                mac.copy_from_slice(&bytes[..6]);
                Ok(Datum::MacAddr(mac))
            }
            Some(_) => Err(Error::DecodeCorruption("macaddr datum shorter than 6 bytes".into())),
        }
    }

    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        let width = fixed_binary_width(meta, "macaddr")?;
        if width != 6 {
            return Err(Error::DecodeCorruption(format!(
                "macaddr column has byte width {}, expected 6",
                width
            )));
        }
        self.datum_ref(chunk.fixed_slot(row, 6)?)
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        match datum {
            Datum::Null => Ok(0),
            Datum::MacAddr(mac) => {
                if let Some(out) = buffer {
                    out.extend_from_slice(mac);
                }
                Ok(6)
            }
            _ => Err(Error::Internal("macaddr store got a foreign datum".into())),
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        match datum {
            Datum::Null => Ok(0),
            Datum::MacAddr(mac) => Ok(hash_bytes(mac)),
            _ => Err(Error::Internal("macaddr hash got a foreign datum".into())),
        }
    }
}

/// inet rides in a varlena whose payload is family byte, netmask bits byte,
/// then the address bytes. The structure has to be inspected, so compressed
/// or out-of-line images are bounced back to the host.
pub struct InetCodec;

impl InetCodec {
    fn from_payload(payload: &[u8]) -> Result<InetValue> {
        if payload.len() < 2 {
            return Err(Error::DecodeCorruption("corrupted inet datum".into()));
        }
        let mut value = InetValue {
            family: payload[0],
            bits: payload[1],
            addr: [0u8; 16],
        };
        let size = value
            .addr_size()
            .ok_or_else(|| Error::DecodeCorruption("corrupted inet datum".into()))?;
        if payload.len() < 2 + size {
            return Err(Error::DecodeCorruption("corrupted inet datum".into()));
        }
        value.addr[..size].copy_from_slice(&payload[2..2 + size]);
        Ok(value)
    }

    /// family + bits + address, the image `store` writes and `hash` covers.
    fn canonical(value: &InetValue) -> Result<([u8; 18], usize)> {
        let size = value
            .addr_size()
            .ok_or_else(|| Error::DecodeCorruption("corrupted inet datum".into()))?;
        let mut image = [0u8; 18];
        image[0] = value.family;
        image[1] = value.bits;
        image[2..2 + size].copy_from_slice(&value.addr[..size]);
        Ok((image, 2 + size))
    }
}

impl DatumCodec for InetCodec {
    fn datum_ref<'a>(&self, addr: Option<&'a [u8]>) -> Result<Datum<'a>> {
        let bytes = match addr {
            None => return Ok(Datum::Null),
            Some(bytes) => bytes,
        };
        match Varlena::parse(bytes)? {
            Varlena::Inline { data } | Varlena::Short { data } => {
                Ok(Datum::Inet(Self::from_payload(data)?))
            }
            Varlena::Compressed { .. } | Varlena::External => Err(Error::RequiresFallback(
                "inet value is compressed or stored out of line",
            )),
        }
    }

    fn columnar_ref<'a>(
        &self,
        meta: &ColumnMeta,
        chunk: &ColumnChunk<'a>,
        row: u32,
    ) -> Result<Datum<'a>> {
        let width = fixed_binary_width(meta, "inet")?;
        let (family, bits) = match width {
            4 => (FAMILY_INET, 32),
            16 => (FAMILY_INET6, 128),
            _ => {
                return Err(Error::DecodeCorruption(format!(
                    "inet column has byte width {}, expected 4 or 16",
                    width
                )));
            }
        };
        Ok(match chunk.fixed_slot(row, width)? {
            None => Datum::Null,
            Some(slot) => {
                let mut value = InetValue {
                    family,
                    bits,
                    addr: [0u8; 16],
                };
                value.addr[..width].copy_from_slice(slot);
                Datum::Inet(value)
            }
        })
    }

    fn store(&self, datum: &Datum<'_>, buffer: Option<&mut Vec<u8>>) -> Result<usize> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Inet(value) => {
                let (image, len) = Self::canonical(value)?;
                if let Some(out) = buffer {
                    varlena::write_varlena(out, &image[..len]);
                }
                Ok(varlena::stored_size(len))
            }
            _ => Err(Error::Internal("inet store got a foreign datum".into())),
        }
    }

    fn hash(&self, datum: &Datum<'_>) -> Result<u32> {
        match datum {
            Datum::Null => Ok(0),
            Datum::Inet(value) => {
                let (image, len) = Self::canonical(value)?;
                Ok(hash_bytes(&image[..len]))
            }
            _ => Err(Error::Internal("inet hash got a foreign datum".into())),
        }
    }
}

pub static UUID_CODEC: UuidCodec = UuidCodec;
pub static MACADDR_CODEC: MacAddrCodec = MacAddrCodec;
pub static INET_CODEC: InetCodec = InetCodec;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_roundtrip_and_width_check() {
        let id: [u8; 16] = *b"0123456789abcdef";
        let datum = UUID_CODEC.datum_ref(Some(&id)).unwrap();
        assert_eq!(datum, Datum::Uuid(id));

        let mut out = Vec::new();
        assert_eq!(UUID_CODEC.store(&datum, Some(&mut out)).unwrap(), 16);
        assert_eq!(out, id);

        let chunk = ColumnChunk::fixed(1, &id);
        let bad_meta = ColumnMeta::new(ColumnOptions::FixedSizeBinary { byte_width: 8 });
        assert!(UUID_CODEC.columnar_ref(&bad_meta, &chunk, 0).is_err());

        let meta = ColumnMeta::new(ColumnOptions::FixedSizeBinary { byte_width: 16 });
        assert_eq!(UUID_CODEC.columnar_ref(&meta, &chunk, 0).unwrap(), datum);
    }

    #[test]
    fn macaddr_width_is_six() {
        let mac = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01];
        let datum = MACADDR_CODEC.datum_ref(Some(&mac)).unwrap();
        assert_eq!(datum, Datum::MacAddr(mac));
        assert!(MACADDR_CODEC.datum_ref(Some(&mac[..4])).is_err());
    }

    fn inet_image(family: u8, bits: u8, addr: &[u8]) -> Vec<u8> {
        let mut payload = vec![family, bits];
        payload.extend_from_slice(addr);
        let mut buf = Vec::new();
        varlena::write_varlena(&mut buf, &payload);
        buf
    }

    #[test]
    fn inet_v4_roundtrip() {
        let image = inet_image(FAMILY_INET, 24, &[192, 168, 0, 1]);
        let datum = INET_CODEC.datum_ref(Some(&image)).unwrap();
        match datum {
            Datum::Inet(v) => {
                assert_eq!(v.family, FAMILY_INET);
                assert_eq!(v.bits, 24);
                assert_eq!(&v.addr[..4], &[192, 168, 0, 1]);
            }
            other => panic!("unexpected datum: {:?}", other),
        }

        let mut out = Vec::new();
        let n = INET_CODEC.store(&datum, Some(&mut out)).unwrap();
        assert_eq!(n, image.len());
        assert_eq!(out, image);
    }

    #[test]
    fn inet_bad_family_is_corruption() {
        let image = inet_image(9, 24, &[192, 168, 0, 1]);
        assert!(INET_CODEC.datum_ref(Some(&image)).is_err());
    }

    #[test]
    fn inet_truncated_address_is_corruption() {
        let image = inet_image(FAMILY_INET6, 64, &[0u8; 8]);
        assert!(INET_CODEC.datum_ref(Some(&image)).is_err());
    }

    #[test]
    fn inet_external_requires_fallback() {
        let image = [0x01u8, 18, 0, 0, 0, 0];
        assert!(INET_CODEC.datum_ref(Some(&image)).unwrap_err().is_fallback());
    }

    #[test]
    fn inet_columnar_hash_matches_row_hash() {
        let row = inet_image(FAMILY_INET, 32, &[10, 0, 0, 7]);
        let row_datum = INET_CODEC.datum_ref(Some(&row)).unwrap();

        let values = [10u8, 0, 0, 7];
        let chunk = ColumnChunk::fixed(1, &values);
        let meta = ColumnMeta::new(ColumnOptions::FixedSizeBinary { byte_width: 4 });
        let col_datum = INET_CODEC.columnar_ref(&meta, &chunk, 0).unwrap();

        assert_eq!(
            INET_CODEC.hash(&row_datum).unwrap(),
            INET_CODEC.hash(&col_datum).unwrap()
        );
    }
}
