//! Function descriptors and the static built-in function table.

use std::sync::Arc;

use super::devtypes::{DeviceFlags, TypeDescriptor};
use super::schema::FuncId;

/// The device operation a resolved function compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// No device operation; marks a negative descriptor.
    Invalid,

    BoolEq,
    BoolNe,

    Int1Eq,
    Int1Ne,
    Int1Lt,
    Int1Le,
    Int1Gt,
    Int1Ge,
    Int2Eq,
    Int2Ne,
    Int2Lt,
    Int2Le,
    Int2Gt,
    Int2Ge,
    Int4Eq,
    Int4Ne,
    Int4Lt,
    Int4Le,
    Int4Gt,
    Int4Ge,
    Int8Eq,
    Int8Ne,
    Int8Lt,
    Int8Le,
    Int8Gt,
    Int8Ge,
    Int24Eq,
    Int42Eq,
    Int48Eq,
    Int84Eq,
    Int2Pl,
    Int2Mi,
    Int2Mul,
    Int4Pl,
    Int4Mi,
    Int4Mul,
    Int8Pl,
    Int8Mi,
    Int8Mul,

    Float2Eq,
    Float2Ne,
    Float2Lt,
    Float2Le,
    Float2Gt,
    Float2Ge,
    Float4Eq,
    Float4Ne,
    Float4Lt,
    Float4Le,
    Float4Gt,
    Float4Ge,
    Float8Eq,
    Float8Ne,
    Float8Lt,
    Float8Le,
    Float8Gt,
    Float8Ge,
    Float4Pl,
    Float4Mi,
    Float4Mul,
    Float8Pl,
    Float8Mi,
    Float8Mul,

    NumericEq,
    NumericNe,
    NumericLt,
    NumericLe,
    NumericGt,
    NumericGe,
    NumericAdd,
    NumericSub,
    NumericMul,

    TextEq,
    TextNe,
    TextLt,
    TextLe,
    TextGt,
    TextGe,
    BpcharEq,
    BpcharNe,
    BpcharLt,
    BpcharLe,
    BpcharGt,
    BpcharGe,

    DateEq,
    DateNe,
    DateLt,
    DateLe,
    DateGt,
    DateGe,
    TimeEq,
    TimeNe,
    TimeLt,
    TimeLe,
    TimeGt,
    TimeGe,
    TimestampEq,
    TimestampNe,
    TimestampLt,
    TimestampLe,
    TimestampGt,
    TimestampGe,
    TimestampTzEq,
    TimestampTzNe,
    TimestampTzLt,
    TimestampTzLe,
    TimestampTzGt,
    TimestampTzGe,
    IntervalEq,

    CashEq,
    UuidEq,
    UuidNe,
    MacaddrEq,
    MacaddrNe,
    NetworkEq,
}

/// A resolved function call signature, positive or tombstone, shared via
/// `Arc` from the catalog cache.
#[derive(Debug)]
pub struct FunctionDescriptor {
    pub func_id: FuncId,
    pub name: String,
    /// Owning extension, `None` for built-in functions.
    pub extension: Option<String>,
    pub flags: DeviceFlags,
    pub opcode: OpCode,
    /// Resolved argument types, in call order. Present on negative
    /// descriptors too, with tombstones filling unsupported slots.
    pub arg_types: Vec<Arc<TypeDescriptor>>,
}

impl FunctionDescriptor {
    pub fn is_negative(&self) -> bool {
        self.opcode == OpCode::Invalid
    }
}

/// One row of the built-in function table. `signature` is the
/// slash-joined device type names of the arguments, in call order.
pub(crate) struct DevFuncEntry {
    pub name: &'static str,
    pub signature: &'static str,
    pub flags: DeviceFlags,
    pub opcode: OpCode,
    pub extension: Option<&'static str>,
}

const EXT: Option<&str> = Some("flare_device");
const ANY: DeviceFlags = DeviceFlags::ANY;
const ANY_LOCALE: DeviceFlags = DeviceFlags::ANY.union(DeviceFlags::LOCALE_AWARE);

macro_rules! devfunc {
    ($name:literal, $sig:literal, $flags:expr, $opcode:ident) => {
        DevFuncEntry {
            name: $name,
            signature: $sig,
            flags: $flags,
            opcode: OpCode::$opcode,
            extension: None,
        }
    };
    ($name:literal, $sig:literal, $flags:expr, $opcode:ident, ext) => {
        DevFuncEntry {
            name: $name,
            signature: $sig,
            flags: $flags,
            opcode: OpCode::$opcode,
            extension: EXT,
        }
    };
}

/// Ground truth of device-resolvable functions. Scanned linearly,
/// first match wins.
pub(crate) static DEVFUNC_CATALOG: &[DevFuncEntry] = &[
    devfunc!("booleq", "bool/bool", ANY, BoolEq),
    devfunc!("boolne", "bool/bool", ANY, BoolNe),

    devfunc!("int1eq", "int1/int1", ANY, Int1Eq, ext),
    devfunc!("int1ne", "int1/int1", ANY, Int1Ne, ext),
    devfunc!("int1lt", "int1/int1", ANY, Int1Lt, ext),
    devfunc!("int1le", "int1/int1", ANY, Int1Le, ext),
    devfunc!("int1gt", "int1/int1", ANY, Int1Gt, ext),
    devfunc!("int1ge", "int1/int1", ANY, Int1Ge, ext),

    devfunc!("int2eq", "int2/int2", ANY, Int2Eq),
    devfunc!("int2ne", "int2/int2", ANY, Int2Ne),
    devfunc!("int2lt", "int2/int2", ANY, Int2Lt),
    devfunc!("int2le", "int2/int2", ANY, Int2Le),
    devfunc!("int2gt", "int2/int2", ANY, Int2Gt),
    devfunc!("int2ge", "int2/int2", ANY, Int2Ge),
    devfunc!("int4eq", "int4/int4", ANY, Int4Eq),
    devfunc!("int4ne", "int4/int4", ANY, Int4Ne),
    devfunc!("int4lt", "int4/int4", ANY, Int4Lt),
    devfunc!("int4le", "int4/int4", ANY, Int4Le),
    devfunc!("int4gt", "int4/int4", ANY, Int4Gt),
    devfunc!("int4ge", "int4/int4", ANY, Int4Ge),
    devfunc!("int8eq", "int8/int8", ANY, Int8Eq),
    devfunc!("int8ne", "int8/int8", ANY, Int8Ne),
    devfunc!("int8lt", "int8/int8", ANY, Int8Lt),
    devfunc!("int8le", "int8/int8", ANY, Int8Le),
    devfunc!("int8gt", "int8/int8", ANY, Int8Gt),
    devfunc!("int8ge", "int8/int8", ANY, Int8Ge),
    devfunc!("int24eq", "int2/int4", ANY, Int24Eq),
    devfunc!("int42eq", "int4/int2", ANY, Int42Eq),
    devfunc!("int48eq", "int4/int8", ANY, Int48Eq),
    devfunc!("int84eq", "int8/int4", ANY, Int84Eq),
    devfunc!("int2pl", "int2/int2", ANY, Int2Pl),
    devfunc!("int2mi", "int2/int2", ANY, Int2Mi),
    devfunc!("int2mul", "int2/int2", ANY, Int2Mul),
    devfunc!("int4pl", "int4/int4", ANY, Int4Pl),
    devfunc!("int4mi", "int4/int4", ANY, Int4Mi),
    devfunc!("int4mul", "int4/int4", ANY, Int4Mul),
    devfunc!("int8pl", "int8/int8", ANY, Int8Pl),
    devfunc!("int8mi", "int8/int8", ANY, Int8Mi),
    devfunc!("int8mul", "int8/int8", ANY, Int8Mul),

    devfunc!("float2eq", "float2/float2", ANY, Float2Eq, ext),
    devfunc!("float2ne", "float2/float2", ANY, Float2Ne, ext),
    devfunc!("float2lt", "float2/float2", ANY, Float2Lt, ext),
    devfunc!("float2le", "float2/float2", ANY, Float2Le, ext),
    devfunc!("float2gt", "float2/float2", ANY, Float2Gt, ext),
    devfunc!("float2ge", "float2/float2", ANY, Float2Ge, ext),
    devfunc!("float4eq", "float4/float4", ANY, Float4Eq),
    devfunc!("float4ne", "float4/float4", ANY, Float4Ne),
    devfunc!("float4lt", "float4/float4", ANY, Float4Lt),
    devfunc!("float4le", "float4/float4", ANY, Float4Le),
    devfunc!("float4gt", "float4/float4", ANY, Float4Gt),
    devfunc!("float4ge", "float4/float4", ANY, Float4Ge),
    devfunc!("float8eq", "float8/float8", ANY, Float8Eq),
    devfunc!("float8ne", "float8/float8", ANY, Float8Ne),
    devfunc!("float8lt", "float8/float8", ANY, Float8Lt),
    devfunc!("float8le", "float8/float8", ANY, Float8Le),
    devfunc!("float8gt", "float8/float8", ANY, Float8Gt),
    devfunc!("float8ge", "float8/float8", ANY, Float8Ge),
    devfunc!("float4pl", "float4/float4", ANY, Float4Pl),
    devfunc!("float4mi", "float4/float4", ANY, Float4Mi),
    devfunc!("float4mul", "float4/float4", ANY, Float4Mul),
    devfunc!("float8pl", "float8/float8", ANY, Float8Pl),
    devfunc!("float8mi", "float8/float8", ANY, Float8Mi),
    devfunc!("float8mul", "float8/float8", ANY, Float8Mul),

    devfunc!("numeric_eq", "numeric/numeric", ANY, NumericEq),
    devfunc!("numeric_ne", "numeric/numeric", ANY, NumericNe),
    devfunc!("numeric_lt", "numeric/numeric", ANY, NumericLt),
    devfunc!("numeric_le", "numeric/numeric", ANY, NumericLe),
    devfunc!("numeric_gt", "numeric/numeric", ANY, NumericGt),
    devfunc!("numeric_ge", "numeric/numeric", ANY, NumericGe),
    devfunc!("numeric_add", "numeric/numeric", ANY, NumericAdd),
    devfunc!("numeric_sub", "numeric/numeric", ANY, NumericSub),
    devfunc!("numeric_mul", "numeric/numeric", ANY, NumericMul),

    // Equality on strings is byte-wise; only the ordering comparisons
    // depend on the collation.
    devfunc!("texteq", "text/text", ANY, TextEq),
    devfunc!("textne", "text/text", ANY, TextNe),
    devfunc!("text_lt", "text/text", ANY_LOCALE, TextLt),
    devfunc!("text_le", "text/text", ANY_LOCALE, TextLe),
    devfunc!("text_gt", "text/text", ANY_LOCALE, TextGt),
    devfunc!("text_ge", "text/text", ANY_LOCALE, TextGe),
    devfunc!("bpchareq", "bpchar/bpchar", ANY, BpcharEq),
    devfunc!("bpcharne", "bpchar/bpchar", ANY, BpcharNe),
    devfunc!("bpchar_lt", "bpchar/bpchar", ANY_LOCALE, BpcharLt),
    devfunc!("bpchar_le", "bpchar/bpchar", ANY_LOCALE, BpcharLe),
    devfunc!("bpchar_gt", "bpchar/bpchar", ANY_LOCALE, BpcharGt),
    devfunc!("bpchar_ge", "bpchar/bpchar", ANY_LOCALE, BpcharGe),

    devfunc!("date_eq", "date/date", ANY, DateEq),
    devfunc!("date_ne", "date/date", ANY, DateNe),
    devfunc!("date_lt", "date/date", ANY, DateLt),
    devfunc!("date_le", "date/date", ANY, DateLe),
    devfunc!("date_gt", "date/date", ANY, DateGt),
    devfunc!("date_ge", "date/date", ANY, DateGe),
    devfunc!("time_eq", "time/time", ANY, TimeEq),
    devfunc!("time_ne", "time/time", ANY, TimeNe),
    devfunc!("time_lt", "time/time", ANY, TimeLt),
    devfunc!("time_le", "time/time", ANY, TimeLe),
    devfunc!("time_gt", "time/time", ANY, TimeGt),
    devfunc!("time_ge", "time/time", ANY, TimeGe),
    devfunc!("timestamp_eq", "timestamp/timestamp", ANY, TimestampEq),
    devfunc!("timestamp_ne", "timestamp/timestamp", ANY, TimestampNe),
    devfunc!("timestamp_lt", "timestamp/timestamp", ANY, TimestampLt),
    devfunc!("timestamp_le", "timestamp/timestamp", ANY, TimestampLe),
    devfunc!("timestamp_gt", "timestamp/timestamp", ANY, TimestampGt),
    devfunc!("timestamp_ge", "timestamp/timestamp", ANY, TimestampGe),
    devfunc!("timestamptz_eq", "timestamptz/timestamptz", ANY, TimestampTzEq),
    devfunc!("timestamptz_ne", "timestamptz/timestamptz", ANY, TimestampTzNe),
    devfunc!("timestamptz_lt", "timestamptz/timestamptz", ANY, TimestampTzLt),
    devfunc!("timestamptz_le", "timestamptz/timestamptz", ANY, TimestampTzLe),
    devfunc!("timestamptz_gt", "timestamptz/timestamptz", ANY, TimestampTzGt),
    devfunc!("timestamptz_ge", "timestamptz/timestamptz", ANY, TimestampTzGe),
    devfunc!("interval_eq", "interval/interval", ANY, IntervalEq),

    devfunc!("cash_eq", "money/money", ANY, CashEq),
    devfunc!("uuid_eq", "uuid/uuid", ANY, UuidEq),
    devfunc!("uuid_ne", "uuid/uuid", ANY, UuidNe),
    devfunc!("macaddr_eq", "macaddr/macaddr", ANY, MacaddrEq),
    devfunc!("macaddr_ne", "macaddr/macaddr", ANY, MacaddrNe),
    devfunc!("network_eq", "inet/inet", ANY, NetworkEq),
];
