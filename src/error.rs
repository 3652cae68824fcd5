use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the catalog and codec layers.
///
/// "Not device-executable" is never an error: catalog lookups report it as
/// `Ok(None)` and callers fall back to host evaluation. The variants here are
/// either hard failures that abort the current evaluation, or the
/// distinguished `RequiresFallback` signal telling the caller to redo the
/// row or expression on the host path.
#[derive(Debug)]
pub enum Error {
    /// The type or function identifier has no schema entry at all.
    /// A programming error in the caller, never produced by normal queries.
    SchemaLookup(String),
    /// Malformed bytes where a well-formed encoding is structurally required.
    DecodeCorruption(String),
    /// Well-formed input in a representation this layer deliberately does
    /// not handle; the caller re-evaluates on the host instead.
    RequiresFallback(&'static str),
    /// Encode-side only: the value needs more digits than the fixed
    /// encoding capacity provides.
    CapacityExceeded(String),
    /// Misuse of a codec (e.g. a datum of the wrong type handed to store).
    Internal(String),
}

impl Error {
    /// True when the caller should retry on the host evaluation path
    /// rather than fail the query.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Error::RequiresFallback(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SchemaLookup(msg) => write!(f, "schema lookup failed: {}", msg),
            Error::DecodeCorruption(msg) => write!(f, "corrupted datum: {}", msg),
            Error::RequiresFallback(msg) => write!(f, "requires host fallback: {}", msg),
            Error::CapacityExceeded(msg) => write!(f, "encoding capacity exceeded: {}", msg),
            Error::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
