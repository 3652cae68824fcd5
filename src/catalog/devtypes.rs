//! Type descriptors and the static built-in type table.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::codec::{misclib, numeric, scalar, textlib, timelib, DatumCodec};
use crate::error::{Error, Result};

use super::schema::{FuncId, TypeId, TypeLength};

bitflags! {
    /// Which device kernel classes can handle a type or function, plus
    /// behavioral qualifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceFlags: u32 {
        const GPU = 0x0001;
        const DPU = 0x0002;
        const SPU = 0x0004;
        /// Result depends on the collation; only usable under the
        /// byte-ordering collation.
        const LOCALE_AWARE = 0x0100;

        /// Every kernel class.
        const ANY = Self::GPU.bits() | Self::DPU.bits() | Self::SPU.bits();
    }
}

/// What kind of type a descriptor stands for, and the codec when there
/// is one. Container types carry no codec of their own: their element
/// and field values go through the leaf codecs, and hashing a whole
/// container is not a device operation.
pub enum TypeShape {
    Base { codec: &'static dyn DatumCodec },
    Array { element: Arc<TypeDescriptor> },
    Composite { fields: Vec<Arc<TypeDescriptor>> },
    /// Tombstone: checked once, found unsupported.
    Unsupported,
}

impl fmt::Debug for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeShape::Base { .. } => f.write_str("Base"),
            TypeShape::Array { element } => {
                f.debug_struct("Array").field("element", element).finish()
            }
            TypeShape::Composite { fields } => {
                f.debug_struct("Composite").field("fields", fields).finish()
            }
            TypeShape::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// A resolved database type, positive or tombstone, shared via `Arc`
/// from the catalog cache.
#[derive(Debug)]
pub struct TypeDescriptor {
    pub type_id: TypeId,
    pub name: String,
    /// Owning extension, `None` for built-in types.
    pub extension: Option<String>,
    pub flags: DeviceFlags,
    pub length: TypeLength,
    pub align: u8,
    pub by_val: bool,
    pub eq_func: Option<FuncId>,
    pub cmp_func: Option<FuncId>,
    /// Scratch-buffer size hint for the in-kernel value of this type.
    pub extra_size: u32,
    pub shape: TypeShape,
}

impl TypeDescriptor {
    pub fn is_negative(&self) -> bool {
        matches!(self.shape, TypeShape::Unsupported)
    }

    /// The datum codec, for base types only.
    pub fn codec(&self) -> Option<&'static dyn DatumCodec> {
        match self.shape {
            TypeShape::Base { codec } => Some(codec),
            _ => None,
        }
    }

    /// Hash a datum of this type. Container and unsupported types have no
    /// device-side hash; the caller evaluates those on the host.
    pub fn hash_datum(&self, datum: &crate::codec::Datum<'_>) -> Result<u32> {
        match self.codec() {
            Some(codec) => codec.hash(datum),
            None => Err(Error::RequiresFallback("type has no device hash operation")),
        }
    }

    pub(crate) fn tombstone(type_id: TypeId) -> Self {
        TypeDescriptor {
            type_id,
            name: String::new(),
            extension: None,
            flags: DeviceFlags::empty(),
            length: TypeLength::Fixed(0),
            align: 1,
            by_val: false,
            eq_func: None,
            cmp_func: None,
            extra_size: 0,
            shape: TypeShape::Unsupported,
        }
    }
}

/// One row of the built-in type table.
pub(crate) struct DevTypeEntry {
    pub name: &'static str,
    /// Extension that owns the type; `None` means it must be a built-in
    /// living in the system namespace.
    pub extension: Option<&'static str>,
    pub flags: DeviceFlags,
    pub codec: &'static dyn DatumCodec,
    /// In-kernel value footprint.
    pub extra_size: u32,
}

const EXT: Option<&str> = Some("flare_device");

/// Ground truth of device-resolvable base types. Scanned linearly,
/// first match wins.
pub(crate) static DEVTYPE_CATALOG: &[DevTypeEntry] = &[
    DevTypeEntry { name: "bool", extension: None, flags: DeviceFlags::ANY, codec: &scalar::BOOL_CODEC, extra_size: 1 },
    DevTypeEntry { name: "int1", extension: EXT, flags: DeviceFlags::ANY, codec: &scalar::INT1_CODEC, extra_size: 1 },
    DevTypeEntry { name: "int2", extension: None, flags: DeviceFlags::ANY, codec: &scalar::INT2_CODEC, extra_size: 2 },
    DevTypeEntry { name: "int4", extension: None, flags: DeviceFlags::ANY, codec: &scalar::INT4_CODEC, extra_size: 4 },
    DevTypeEntry { name: "int8", extension: None, flags: DeviceFlags::ANY, codec: &scalar::INT8_CODEC, extra_size: 8 },
    DevTypeEntry { name: "float2", extension: EXT, flags: DeviceFlags::ANY, codec: &scalar::FLOAT2_CODEC, extra_size: 2 },
    DevTypeEntry { name: "float4", extension: None, flags: DeviceFlags::ANY, codec: &scalar::FLOAT4_CODEC, extra_size: 4 },
    DevTypeEntry { name: "float8", extension: None, flags: DeviceFlags::ANY, codec: &scalar::FLOAT8_CODEC, extra_size: 8 },
    DevTypeEntry { name: "numeric", extension: None, flags: DeviceFlags::ANY, codec: &numeric::NUMERIC_CODEC, extra_size: 24 },
    DevTypeEntry { name: "bytea", extension: None, flags: DeviceFlags::ANY, codec: &textlib::VARLENA_CODEC, extra_size: 16 },
    DevTypeEntry { name: "text", extension: None, flags: DeviceFlags::ANY, codec: &textlib::VARLENA_CODEC, extra_size: 16 },
    DevTypeEntry { name: "varchar", extension: None, flags: DeviceFlags::ANY, codec: &textlib::VARLENA_CODEC, extra_size: 16 },
    DevTypeEntry { name: "bpchar", extension: None, flags: DeviceFlags::ANY, codec: &textlib::BPCHAR_CODEC, extra_size: 16 },
    DevTypeEntry { name: "date", extension: None, flags: DeviceFlags::ANY, codec: &scalar::DATE_CODEC, extra_size: 4 },
    DevTypeEntry { name: "time", extension: None, flags: DeviceFlags::ANY, codec: &scalar::TIME_CODEC, extra_size: 8 },
    DevTypeEntry { name: "timetz", extension: None, flags: DeviceFlags::ANY, codec: &timelib::TIMETZ_CODEC, extra_size: 12 },
    DevTypeEntry { name: "timestamp", extension: None, flags: DeviceFlags::ANY, codec: &scalar::TIMESTAMP_CODEC, extra_size: 8 },
    DevTypeEntry { name: "timestamptz", extension: None, flags: DeviceFlags::ANY, codec: &scalar::TIMESTAMPTZ_CODEC, extra_size: 8 },
    DevTypeEntry { name: "interval", extension: None, flags: DeviceFlags::ANY, codec: &timelib::INTERVAL_CODEC, extra_size: 16 },
    DevTypeEntry { name: "money", extension: None, flags: DeviceFlags::ANY, codec: &scalar::MONEY_CODEC, extra_size: 8 },
    DevTypeEntry { name: "uuid", extension: None, flags: DeviceFlags::ANY, codec: &misclib::UUID_CODEC, extra_size: 16 },
    DevTypeEntry { name: "macaddr", extension: None, flags: DeviceFlags::ANY, codec: &misclib::MACADDR_CODEC, extra_size: 6 },
    DevTypeEntry { name: "inet", extension: None, flags: DeviceFlags::ANY, codec: &misclib::INET_CODEC, extra_size: 20 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_unique_per_extension() {
        for (i, a) in DEVTYPE_CATALOG.iter().enumerate() {
            for b in &DEVTYPE_CATALOG[i + 1..] {
                assert!(
                    a.name != b.name || a.extension != b.extension,
                    "duplicate type entry {}",
                    a.name
                );
            }
        }
    }

    #[test]
    fn extension_types_are_marked() {
        for entry in DEVTYPE_CATALOG {
            match entry.name {
                "int1" | "float2" => assert_eq!(entry.extension, Some("flare_device")),
                _ => assert_eq!(entry.extension, None),
            }
        }
    }

    #[test]
    fn tombstone_is_negative() {
        let t = TypeDescriptor::tombstone(TypeId(42));
        assert!(t.is_negative());
        assert!(t.codec().is_none());
        assert!(t
            .hash_datum(&crate::codec::Datum::Null)
            .unwrap_err()
            .is_fallback());
    }
}
