//! Identifiers and the schema metadata contract.
//!
//! The catalog never talks to a live system catalog directly; it pulls type
//! and function metadata through `SchemaProvider`, which keeps resolution
//! testable and lets the host side plug in its own syscache-backed
//! implementation.

use std::fmt;

use crate::error::Result;

/// Stable identifier of a logical type in the host schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Stable identifier of a function in the host schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u32);

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func#{}", self.0)
    }
}

/// Collation attached to a function call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollationId(pub u32);

impl CollationId {
    /// No collation specified at the call site.
    pub const NONE: CollationId = CollationId(0);
    /// The simple byte-ordering collation.
    pub const C: CollationId = CollationId(950);

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Compares by raw byte order, so locale-aware operations degenerate
    /// to plain byte comparisons and stay device-executable.
    pub fn is_byte_ordering(&self) -> bool {
        *self == Self::C
    }
}

/// Physical length of a type's row-format representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeLength {
    Fixed(u16),
    Variable,
}

impl TypeLength {
    pub fn is_variable(&self) -> bool {
        matches!(self, TypeLength::Variable)
    }
}

/// Everything the catalog needs to know about a type.
#[derive(Debug, Clone)]
pub struct TypeProperties {
    pub name: String,
    /// Owning extension, if the type is not built in.
    pub extension: Option<String>,
    /// True when the type lives in the system namespace.
    pub in_system_namespace: bool,
    pub length: TypeLength,
    pub align: u8,
    pub by_val: bool,
    pub eq_func: Option<FuncId>,
    pub cmp_func: Option<FuncId>,
    /// Element type of an array type.
    pub element: Option<TypeId>,
    /// Field types of a composite type, in attribute order.
    pub fields: Option<Vec<TypeId>>,
}

/// Everything the catalog needs to know about a function.
#[derive(Debug, Clone)]
pub struct FunctionProperties {
    pub name: String,
    pub extension: Option<String>,
    pub in_system_namespace: bool,
    pub arg_types: Vec<TypeId>,
}

/// Read-side schema access. An `Err` from either method means the
/// identifier has no schema entry at all; "exists but not supported on
/// device" is decided by the catalog, not here.
pub trait SchemaProvider: Send + Sync {
    fn type_properties(&self, type_id: TypeId) -> Result<TypeProperties>;
    fn function_properties(&self, func_id: FuncId) -> Result<FunctionProperties>;
}

/// Schema change notification hook. The host side calls every registered
/// callback whenever type or function metadata may have changed.
pub trait ChangeNotifier {
    fn on_schema_change(&self, callback: Box<dyn Fn() + Send + Sync>);
}

/// Anything that knows the type of the value it produces. Expression
/// nodes implement this so a call site can be resolved without the
/// catalog knowing the expression tree's shape.
pub trait TypedExpression {
    fn expr_type(&self) -> TypeId;
}

impl TypedExpression for TypeId {
    fn expr_type(&self) -> TypeId {
        *self
    }
}
