//! Device-offload type and function catalog with per-type datum codecs.
//!
//! This crate answers, for a host database schema, which types and
//! functions can be evaluated on an attached compute device (GPU, DPU or
//! embedded SPU), and provides the bit-exact encode/decode/hash routines
//! that move values between the row format, device-resident columnar
//! buffers and the transient in-kernel representation.
//!
//! The entry point is [`DeviceCatalog`]: construct it over a
//! [`SchemaProvider`], resolve types and function call signatures through
//! it, and reach each type's [`DatumCodec`] through the resolved
//! [`TypeDescriptor`]. Resolutions are cached, negatively too, until a
//! schema change invalidates the catalog.

pub mod catalog;
pub mod codec;
pub mod columnar;
pub mod error;
pub mod params;

pub use catalog::devfuncs::{FunctionDescriptor, OpCode};
pub use catalog::devtypes::{DeviceFlags, TypeDescriptor, TypeShape};
pub use catalog::schema::{
    ChangeNotifier, CollationId, FuncId, FunctionProperties, SchemaProvider, TypeId, TypeLength,
    TypeProperties, TypedExpression,
};
pub use catalog::DeviceCatalog;
pub use codec::{hash_bytes, Datum, DatumCodec};
pub use error::{Error, Result};
pub use params::{OwnedParams, ParamBuffer};
